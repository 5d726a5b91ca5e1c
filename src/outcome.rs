use std::error::Error;

use ::duckdb::vtab::arrow::WritableVector;
use ::duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
};

use crate::duckdb_impl::scalar::{
    VarcharOutput, invoke_binary_varchar_to_varchar, invoke_unary_varchar_to_varchar,
};

const DRAW_CODES: [&str; 7] = [
    "draw",
    "stalemate",
    "agreed",
    "repetition",
    "insufficient",
    "50move",
    "timevsinsufficient",
];

const LOSS_CODES: [&str; 8] = [
    "lose",
    "checkmated",
    "resigned",
    "timeout",
    "abandoned",
    "kingofthehill",
    "threecheck",
    "bughousepartnerlose",
];

/// Canonical result of one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Lose,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Draw => "draw",
            Self::Lose => "lose",
        }
    }

    pub fn score(self) -> &'static str {
        match self {
            Self::Win => "1",
            Self::Draw => "0.5",
            Self::Lose => "0",
        }
    }
}

/// Maps a platform result code onto an outcome. Unknown codes are unclassified.
pub fn classify(code: &str) -> Option<Outcome> {
    let code = code.trim().to_lowercase();
    if code == "win" {
        Some(Outcome::Win)
    } else if DRAW_CODES.contains(&code.as_str()) {
        Some(Outcome::Draw)
    } else if LOSS_CODES.contains(&code.as_str()) {
        Some(Outcome::Lose)
    } else {
        None
    }
}

pub fn outcome_str(outcome: Option<Outcome>) -> &'static str {
    outcome.map(Outcome::as_str).unwrap_or("")
}

pub fn score_str(outcome: Option<Outcome>) -> &'static str {
    outcome.map(Outcome::score).unwrap_or("")
}

/// How the game ended, named by the side that did not win.
///
/// When neither side won, the first non-empty code is used; the two codes are not
/// checked against each other.
pub fn end_reason(white_code: &str, black_code: &str) -> String {
    let white = white_code.trim().to_lowercase();
    let black = black_code.trim().to_lowercase();

    if white == "win" {
        black
    } else if black == "win" {
        white
    } else if !white.is_empty() {
        white
    } else {
        black
    }
}

/// `white`, `black`, or `""` when no side holds the literal `win` code.
pub fn winner(white_code: &str, black_code: &str) -> &'static str {
    if white_code.trim().eq_ignore_ascii_case("win") {
        "white"
    } else if black_code.trim().eq_ignore_ascii_case("win") {
        "black"
    } else {
        ""
    }
}

pub struct ChesscomOutcomeScalar;

impl VScalar for ChesscomOutcomeScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |code| {
            Ok(VarcharOutput::Value(outcome_str(classify(code)).to_string()))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

pub struct ChesscomScoreScalar;

impl VScalar for ChesscomScoreScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |code| {
            Ok(VarcharOutput::Value(score_str(classify(code)).to_string()))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

pub struct ChesscomEndReasonScalar;

impl VScalar for ChesscomEndReasonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_binary_varchar_to_varchar(input, output, |white, black| {
            Ok(VarcharOutput::Value(end_reason(
                white.unwrap_or(""),
                black.unwrap_or(""),
            )))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}
