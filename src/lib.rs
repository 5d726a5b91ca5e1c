mod assemble;
mod duckdb_impl;
mod error;
mod fields;
mod headers;
mod log;
mod moves;
mod outcome;
mod perspective;
mod reader;
mod registry;
mod timecontrol;
mod timestamps;
mod types;

use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use outcome::{ChesscomEndReasonScalar, ChesscomOutcomeScalar, ChesscomScoreScalar};
use reader::ReadChesscomVTab;
use std::error::Error;
use timecontrol::ChesscomTimecontrolJsonScalar;

#[duckdb_extension(name = "chesscom", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadChesscomVTab>("read_chesscom")?;

    // Scalar functions
    con.register_scalar_function::<ChesscomOutcomeScalar>("chesscom_outcome")?;
    con.register_scalar_function::<ChesscomScoreScalar>("chesscom_score")?;
    con.register_scalar_function::<ChesscomEndReasonScalar>("chesscom_end_reason")?;
    con.register_scalar_function::<ChesscomTimecontrolJsonScalar>("chesscom_timecontrol_json")?;

    Ok(())
}
