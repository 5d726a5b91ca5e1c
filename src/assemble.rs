//! Per-game record assembly.
//!
//! Every derivation runs once per game into a [`DerivedRecord`]; registry columns are then
//! projected out of it by name.

use std::fmt::Display;

use chrono::TimeZone;
use serde_json::Value;

use crate::error::ErrorAccumulator;
use crate::fields::{DerivedRecord, Field, GameField, SideField, TAG_FIELD_NAMES};
use crate::headers::{extract_movetext, parse_headers};
use crate::moves::annotate;
use crate::outcome::{end_reason, winner};
use crate::perspective::{Color, SideView, Viewer, assign, describe};
use crate::registry::Column;
use crate::timecontrol::{decompose, game_format, game_type};
use crate::timestamps::{MomentParts, TimeSources, reconcile};
use crate::types::{PlayerSide, RawGame};

/// Header row plus one positional row per game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Derives one record from an element of the archive's `games` array.
///
/// A non-object element still yields a record: every field is empty except `parse_error`.
pub fn derive_value<Tz>(value: Value, viewer: &Viewer, tz: &Tz) -> DerivedRecord
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match RawGame::from_value(value) {
        Some(game) => derive_record(&game, viewer, tz),
        None => {
            let mut record = derive_record(&RawGame::default(), viewer, tz);
            record.set(
                Field::Game(GameField::ParseError),
                "Invalid game entry: expected a JSON object",
            );
            record
        }
    }
}

pub fn derive_record<Tz>(game: &RawGame, viewer: &Viewer, tz: &Tz) -> DerivedRecord
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut record = DerivedRecord::default();
    let mut notes = ErrorAccumulator::default();

    let pgn = game.pgn.as_deref().unwrap_or("");
    let headers = parse_headers(pgn);
    let time_class = game.time_class.as_deref().unwrap_or("");
    let rules = game.rules.as_deref().unwrap_or("");
    let time_control = game.time_control.as_deref().unwrap_or("");
    let url = game.url.as_deref().unwrap_or("");

    let mut set = |field: GameField, value: &str| record.set(Field::Game(field), value);

    set(GameField::GameUuid, game.uuid.as_deref().unwrap_or(""));
    set(GameField::Url, url);
    set(GameField::UrlNumericId, trailing_digits(url));
    set(GameField::Pgn, &escape_line_breaks(pgn));
    set(GameField::TimeControl, time_control);
    set(GameField::StartEpoch, &optional(game.start_time));
    set(GameField::EndEpoch, &optional(game.end_time));
    set(GameField::Rated, &optional(game.rated));
    let accuracies = game.accuracies.as_ref();
    set(
        GameField::AccuracyWhite,
        &optional(accuracies.and_then(|a| a.white)),
    );
    set(
        GameField::AccuracyBlack,
        &optional(accuracies.and_then(|a| a.black)),
    );
    set(GameField::Tcn, game.tcn.as_deref().unwrap_or(""));
    set(
        GameField::InitialSetup,
        game.initial_setup.as_deref().unwrap_or(""),
    );
    set(GameField::Fen, game.fen.as_deref().unwrap_or(""));
    set(GameField::TimeClass, time_class);
    set(GameField::Rules, rules);
    set(GameField::EcoUrl, game.eco.as_deref().unwrap_or(""));
    set(
        GameField::TournamentLink,
        game.tournament.as_deref().unwrap_or(""),
    );
    set(GameField::MatchLink, game.r#match.as_deref().unwrap_or(""));
    set(GameField::Type, game_type(time_class));
    set(GameField::Format, &game_format(rules, time_class));

    let tc = decompose(time_control, &mut notes);
    set(GameField::TcBase, &tc.base);
    set(GameField::TcIncrement, &tc.increment);
    set(GameField::TcCorrespondence, &tc.correspondence);

    let times = reconcile(
        &TimeSources {
            start_epoch: game.start_time,
            end_epoch: game.end_time,
            header_date: headers.get("UTCDate"),
            header_time: headers.get("UTCTime"),
        },
        tz,
        &mut notes,
    );
    set_moment(&mut set, &times.start, MomentFields::START);
    set_moment(&mut set, &times.end, MomentFields::END);
    set(GameField::Duration, &times.duration);

    let absent = PlayerSide::default();
    let white = game.white.as_ref().unwrap_or(&absent);
    let black = game.black.as_ref().unwrap_or(&absent);
    let white_code = white.result.as_deref().unwrap_or("");
    let black_code = black.result.as_deref().unwrap_or("");
    set(GameField::EndReason, &end_reason(white_code, black_code));
    set(GameField::Winner, winner(white_code, black_code));

    set(GameField::Movetext, &extract_movetext(pgn));
    let moves = annotate(pgn, &tc.base, &tc.increment, &mut notes);
    set(GameField::SanMoves, &moves.san_moves);
    set(GameField::ClockTimes, &moves.clock_times);
    set(GameField::TimeSpent, &moves.time_spent);
    set(GameField::MoveCount, &moves.move_count);

    set(
        GameField::ParseError,
        notes.take().as_deref().unwrap_or(""),
    );

    for (_, tag) in TAG_FIELD_NAMES {
        record.set(Field::Tag(*tag), headers.value(tag));
    }

    set_side(&mut record, &describe(Color::White, white), |f| {
        Field::Side(Color::White, f)
    });
    set_side(&mut record, &describe(Color::Black, black), |f| {
        Field::Side(Color::Black, f)
    });

    let perspective = assign(viewer, white, black);
    set_side(&mut record, &perspective.my, Field::My);
    set_side(&mut record, &perspective.opp, Field::Opp);

    record
}

/// Row of `record` in column order. Unresolved columns are `""`.
pub fn project(record: &DerivedRecord, columns: &[Column]) -> Vec<String> {
    columns
        .iter()
        .map(|column| record.value(column.field).to_string())
        .collect()
}

/// Runs the assembler over a whole `games` array, preserving game order.
pub fn assemble<Tz>(games: Vec<Value>, viewer: &Viewer, columns: &[Column], tz: &Tz) -> Table
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Table {
        header: columns.iter().map(|c| c.name.clone()).collect(),
        rows: games
            .into_iter()
            .map(|value| project(&derive_value(value, viewer, tz), columns))
            .collect(),
    }
}

struct MomentFields {
    date_time: GameField,
    date: GameField,
    time: GameField,
    iso: GameField,
}

impl MomentFields {
    const START: Self = Self {
        date_time: GameField::StartDt,
        date: GameField::StartDate,
        time: GameField::StartTime,
        iso: GameField::StartIso,
    };
    const END: Self = Self {
        date_time: GameField::EndDt,
        date: GameField::EndDate,
        time: GameField::EndTime,
        iso: GameField::EndIso,
    };
}

fn set_moment(set: &mut impl FnMut(GameField, &str), parts: &MomentParts, fields: MomentFields) {
    set(fields.date_time, &parts.date_time);
    set(fields.date, &parts.date);
    set(fields.time, &parts.time);
    set(fields.iso, &parts.iso);
}

fn set_side(record: &mut DerivedRecord, view: &SideView, field: impl Fn(SideField) -> Field) {
    for side_field in SideField::ALL {
        let value = match side_field {
            SideField::Color => &view.color,
            SideField::Username => &view.username,
            SideField::Uuid => &view.uuid,
            SideField::Id => &view.id,
            SideField::Rating => &view.rating,
            SideField::Result => &view.result,
            SideField::Outcome => &view.outcome,
            SideField::Score => &view.score,
            SideField::ExpectedScore => &view.expected_score,
        };
        record.set(field(side_field), value.as_str());
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn trailing_digits(url: &str) -> &str {
    let prefix = url.trim_end_matches(|c: char| c.is_ascii_digit());
    &url[prefix.len()..]
}

/// Keeps a multi-line PGN on one line: each line break becomes the two characters `\n`.
fn escape_line_breaks(pgn: &str) -> String {
    pgn.replace("\r\n", "\\n").replace('\n', "\\n")
}
