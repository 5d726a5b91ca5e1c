//! Names of every value the assembler can compute.
//!
//! A registry column name resolves to a [`Field`] through [`Field::from_name`]; several
//! names can resolve to the same field (the `drv_*` / `pgn_*` vocabulary of the wide record).

use std::collections::HashMap;

use crate::perspective::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameField {
    GameUuid,
    Url,
    UrlNumericId,
    Pgn,
    TimeControl,
    StartEpoch,
    EndEpoch,
    Rated,
    AccuracyWhite,
    AccuracyBlack,
    Tcn,
    InitialSetup,
    Fen,
    TimeClass,
    Rules,
    EcoUrl,
    TournamentLink,
    MatchLink,
    Type,
    Format,
    TcBase,
    TcIncrement,
    TcCorrespondence,
    StartDt,
    StartDate,
    StartTime,
    StartIso,
    EndDt,
    EndDate,
    EndTime,
    EndIso,
    Duration,
    EndReason,
    Winner,
    Movetext,
    SanMoves,
    ClockTimes,
    TimeSpent,
    MoveCount,
    ParseError,
}

/// Per-player values, used both for `white.*` / `black.*` and for `my_*` / `opp_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideField {
    Color,
    Username,
    Uuid,
    Id,
    Rating,
    Result,
    Outcome,
    Score,
    ExpectedScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Game(GameField),
    /// Annotation header passthrough, by tag name.
    Tag(&'static str),
    Side(Color, SideField),
    My(SideField),
    Opp(SideField),
}

const GAME_FIELD_NAMES: &[(&str, GameField)] = &[
    ("game_uuid", GameField::GameUuid),
    ("uuid", GameField::GameUuid),
    ("url", GameField::Url),
    ("url_numeric_id", GameField::UrlNumericId),
    ("pgn", GameField::Pgn),
    ("time_control", GameField::TimeControl),
    ("start_epoch", GameField::StartEpoch),
    ("end_epoch", GameField::EndEpoch),
    ("rated", GameField::Rated),
    ("accuracies.white", GameField::AccuracyWhite),
    ("accuracies.black", GameField::AccuracyBlack),
    ("tcn", GameField::Tcn),
    ("initial_setup", GameField::InitialSetup),
    ("fen", GameField::Fen),
    ("time_class", GameField::TimeClass),
    ("rules", GameField::Rules),
    ("eco_url", GameField::EcoUrl),
    ("eco", GameField::EcoUrl),
    ("tournament_link", GameField::TournamentLink),
    ("tournament", GameField::TournamentLink),
    ("match_link", GameField::MatchLink),
    ("match", GameField::MatchLink),
    ("type", GameField::Type),
    ("drv_type", GameField::Type),
    ("format", GameField::Format),
    ("drv_format", GameField::Format),
    ("tc_base", GameField::TcBase),
    ("drv_base_time", GameField::TcBase),
    ("tc_inc", GameField::TcIncrement),
    ("drv_increment_time", GameField::TcIncrement),
    ("tc_corr", GameField::TcCorrespondence),
    ("drv_correspondence_time", GameField::TcCorrespondence),
    ("start_dt", GameField::StartDt),
    ("drv_start", GameField::StartDt),
    ("start_date", GameField::StartDate),
    ("drv_start_date", GameField::StartDate),
    ("start_time", GameField::StartTime),
    ("drv_start_time", GameField::StartTime),
    ("start_iso", GameField::StartIso),
    ("end_dt", GameField::EndDt),
    ("drv_end", GameField::EndDt),
    ("end_date", GameField::EndDate),
    ("drv_end_date", GameField::EndDate),
    ("end_time", GameField::EndTime),
    ("drv_end_time", GameField::EndTime),
    ("end_iso", GameField::EndIso),
    ("drv_end_iso", GameField::EndIso),
    ("duration", GameField::Duration),
    ("drv_duration", GameField::Duration),
    ("end_reason", GameField::EndReason),
    ("drv_end_reason", GameField::EndReason),
    ("winner", GameField::Winner),
    ("movetext", GameField::Movetext),
    ("pgn_moves", GameField::Movetext),
    ("san_moves", GameField::SanMoves),
    ("clock_times", GameField::ClockTimes),
    ("time_spent", GameField::TimeSpent),
    ("move_count", GameField::MoveCount),
    ("pgn_move_count", GameField::MoveCount),
    ("parse_error", GameField::ParseError),
];

/// Header tags exposed as fields, with every name they answer to.
pub const TAG_FIELD_NAMES: &[(&str, &str)] = &[
    ("eco_code", "ECO"),
    ("pgn_eco_code", "ECO"),
    ("utc_date", "UTCDate"),
    ("pgn_utc_date", "UTCDate"),
    ("utc_time", "UTCTime"),
    ("pgn_utc_time", "UTCTime"),
    ("viewer_link", "Link"),
    ("pgn_link", "Link"),
    ("pgn_event", "Event"),
    ("pgn_site", "Site"),
    ("pgn_date", "Date"),
    ("pgn_round", "Round"),
    ("pgn_white", "White"),
    ("pgn_black", "Black"),
    ("pgn_result", "Result"),
    ("pgn_eco_url", "ECOUrl"),
    ("pgn_time_control", "TimeControl"),
    ("pgn_termination", "Termination"),
    ("pgn_start_time", "StartTime"),
    ("pgn_end_date", "EndDate"),
    ("pgn_end_time", "EndTime"),
    ("pgn_opening", "Opening"),
    ("pgn_variation", "Variation"),
    ("pgn_current_position", "CurrentPosition"),
    ("pgn_timezone", "Timezone"),
    ("pgn_white_elo", "WhiteElo"),
    ("pgn_black_elo", "BlackElo"),
    ("pgn_setup", "SetUp"),
    ("pgn_fen", "FEN"),
];

impl SideField {
    pub const ALL: [SideField; 9] = [
        Self::Color,
        Self::Username,
        Self::Uuid,
        Self::Id,
        Self::Rating,
        Self::Result,
        Self::Outcome,
        Self::Score,
        Self::ExpectedScore,
    ];

    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "color" => Self::Color,
            "username" => Self::Username,
            "uuid" => Self::Uuid,
            "id" | "@id" | "at_id" => Self::Id,
            "rating" => Self::Rating,
            "result" => Self::Result,
            "outcome" => Self::Outcome,
            "score" => Self::Score,
            "expected_score" => Self::ExpectedScore,
            _ => return None,
        })
    }
}

impl Field {
    /// Resolves a registry column name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();

        if let Some((_, field)) = GAME_FIELD_NAMES.iter().find(|(n, _)| *n == name) {
            return Some(Self::Game(*field));
        }
        if let Some((_, tag)) = TAG_FIELD_NAMES.iter().find(|(n, _)| *n == name) {
            return Some(Self::Tag(*tag));
        }

        let unprefixed = name.strip_prefix("drv_").unwrap_or(name);
        for (prefix, color) in [
            ("white.", Color::White),
            ("black.", Color::Black),
            ("white_", Color::White),
            ("black_", Color::Black),
        ] {
            if let Some(suffix) = unprefixed.strip_prefix(prefix) {
                return SideField::from_suffix(suffix)
                    .filter(|f| !matches!(f, SideField::Color | SideField::ExpectedScore))
                    .map(|f| Self::Side(color, f));
            }
        }
        if let Some(suffix) = unprefixed.strip_prefix("my_") {
            return SideField::from_suffix(suffix).map(Self::My);
        }
        if let Some(suffix) = unprefixed.strip_prefix("opp_") {
            return SideField::from_suffix(suffix).map(Self::Opp);
        }

        None
    }
}

/// Every computed value of one game, keyed by field. Missing entries read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedRecord {
    values: HashMap<Field, String>,
}

impl DerivedRecord {
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Value of a resolved registry column; unresolved columns are `""`.
    pub fn value(&self, field: Option<Field>) -> &str {
        field.map(|f| self.get(f)).unwrap_or("")
    }
}
