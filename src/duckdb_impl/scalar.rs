//! Row loops shared by the `VARCHAR` scalar functions.
//!
//! # Safety
//! Only call these from a DuckDB scalar `invoke()`, while the chunk and output vectors are
//! valid. The helpers check that the columns are `VARCHAR` before touching string data.

use std::error::Error;
use std::ffi::CString;

use duckdb::{
    Result,
    core::{DataChunkHandle, FlatVector, Inserter, LogicalTypeId},
    vtab::arrow::WritableVector,
};
use libduckdb_sys::duckdb_string_t;

use super::string::decode_duckdb_string;
use crate::reader::sanitize_for_cstring_silent;

#[derive(Debug, Clone)]
pub enum VarcharOutput {
    Null,
    Value(String),
}

fn ensure_type(
    vec: &FlatVector,
    expected: LogicalTypeId,
    label: &str,
) -> Result<(), Box<dyn Error>> {
    let actual = vec.logical_type().id();
    if actual != expected {
        return Err(format!(
            "scalar helper type mismatch: {label} expected {expected:?}, got {actual:?}"
        )
        .into());
    }
    Ok(())
}

fn write_output(
    output_vec: &mut FlatVector,
    row: usize,
    value: VarcharOutput,
) -> Result<(), Box<dyn Error>> {
    match value {
        VarcharOutput::Null => output_vec.set_null(row),
        VarcharOutput::Value(v) => {
            output_vec.insert(row, CString::new(sanitize_for_cstring_silent(&v).as_ref())?)
        }
    }
    Ok(())
}

/// Invoke a unary `VARCHAR -> VARCHAR` scalar. NULL input rows produce NULL output.
pub fn invoke_unary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> Result<VarcharOutput, Box<dyn Error>>,
{
    let len = input.len();
    let input_vec = input.flat_vector(0);
    ensure_type(&input_vec, LogicalTypeId::Varchar, "input[0]")?;
    let input_slice = input_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for (i, s) in input_slice.iter().take(len).enumerate() {
        if input_vec.row_is_null(i as u64) {
            output_vec.set_null(i);
            continue;
        }

        // SAFETY: Row nullability is checked above.
        let val = unsafe { decode_duckdb_string(s) };
        write_output(&mut output_vec, i, f(&val)?)?;
    }

    Ok(())
}

/// Invoke a binary `VARCHAR, VARCHAR -> VARCHAR` scalar.
///
/// NULL inputs reach `f` as `None`; the function decides what a missing argument means.
pub fn invoke_binary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(Option<&str>, Option<&str>) -> Result<VarcharOutput, Box<dyn Error>>,
{
    let len = input.len();
    let left_vec = input.flat_vector(0);
    let right_vec = input.flat_vector(1);
    ensure_type(&left_vec, LogicalTypeId::Varchar, "input[0]")?;
    ensure_type(&right_vec, LogicalTypeId::Varchar, "input[1]")?;
    let left_slice = left_vec.as_slice::<duckdb_string_t>();
    let right_slice = right_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for (i, (left_s, right_s)) in left_slice
        .iter()
        .take(len)
        .zip(right_slice.iter().take(len))
        .enumerate()
    {
        let left = if left_vec.row_is_null(i as u64) {
            None
        } else {
            // SAFETY: Row nullability is checked above.
            Some(unsafe { decode_duckdb_string(left_s) })
        };
        let right = if right_vec.row_is_null(i as u64) {
            None
        } else {
            // SAFETY: Row nullability is checked above.
            Some(unsafe { decode_duckdb_string(right_s) })
        };

        write_output(&mut output_vec, i, f(left.as_deref(), right.as_deref())?)?;
    }

    Ok(())
}
