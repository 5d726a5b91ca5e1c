use std::error::Error;

use ::duckdb::vtab::arrow::WritableVector;
use ::duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
};
use serde::Serialize;

use crate::duckdb_impl::scalar::{VarcharOutput, invoke_unary_varchar_to_varchar};
use crate::error::ErrorAccumulator;

/// Variants whose name doubles as the game format.
const NAMED_VARIANTS: [&str; 5] = [
    "bughouse",
    "crazyhouse",
    "kingofthehill",
    "threecheck",
    "oddschess",
];

pub struct ChesscomTimecontrolJsonScalar;

impl VScalar for ChesscomTimecontrolJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |raw| {
            let parts = decompose(raw, &mut ErrorAccumulator::default());
            Ok(VarcharOutput::Value(serde_json::to_string(&parts)?))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

/// Components of a platform time-control string, in seconds. `""` means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeControlParts {
    pub base: String,
    pub increment: String,
    pub correspondence: String,
}

/// Splits `"base+inc"`, `"moves/seconds"` or a bare `"base"` into its parts.
///
/// Numbers that do not parse are reported to `notes` and left empty.
pub fn decompose(raw: &str, notes: &mut ErrorAccumulator) -> TimeControlParts {
    let tc = raw.trim();
    let mut parts = TimeControlParts::default();
    if tc.is_empty() {
        return parts;
    }

    let mut number = |s: &str| match s.trim().parse::<u64>() {
        Ok(v) => v.to_string(),
        Err(_) => {
            notes.push(&format!("Conversion error: time_control='{tc}'"));
            String::new()
        }
    };

    if let Some((_, per)) = tc.split_once('/') {
        parts.correspondence = number(per);
    } else if let Some((base, inc)) = tc.split_once('+') {
        parts.base = number(base);
        parts.increment = number(inc);
    } else {
        parts.base = number(tc);
        if !parts.base.is_empty() {
            parts.increment = "0".to_string();
        }
    }

    parts
}

/// Game format: the time class for standard chess, `daily960`/`live960` for Chess960,
/// the variant name for the known variants, otherwise `""`.
pub fn game_format(rules: &str, time_class: &str) -> String {
    match rules {
        "chess" => time_class.to_string(),
        "chess960" if time_class == "daily" => "daily960".to_string(),
        "chess960" => "live960".to_string(),
        other if NAMED_VARIANTS.contains(&other) => other.to_string(),
        _ => String::new(),
    }
}

/// `daily` or `live`; `""` when the time class is unknown.
pub fn game_type(time_class: &str) -> &'static str {
    match time_class {
        "" => "",
        "daily" => "daily",
        _ => "live",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(raw: &str) -> TimeControlParts {
        decompose(raw, &mut ErrorAccumulator::default())
    }

    #[test]
    fn test_decompose_live_with_increment() {
        let tc = parts("180+2");
        assert_eq!(tc.base, "180");
        assert_eq!(tc.increment, "2");
        assert_eq!(tc.correspondence, "");
    }

    #[test]
    fn test_decompose_correspondence() {
        let tc = parts("1/86400");
        assert_eq!(tc.correspondence, "86400");
        assert_eq!(tc.base, "");
        assert_eq!(tc.increment, "");
    }

    #[test]
    fn test_decompose_bare_base_implies_zero_increment() {
        let tc = parts("900");
        assert_eq!(tc.base, "900");
        assert_eq!(tc.increment, "0");
        assert_eq!(tc.correspondence, "");
    }

    #[test]
    fn test_decompose_empty_input() {
        assert_eq!(parts(""), TimeControlParts::default());
        assert_eq!(parts("   "), TimeControlParts::default());
    }

    #[test]
    fn test_decompose_unparsable_numbers_are_empty_and_noted() {
        let mut notes = ErrorAccumulator::default();
        let tc = decompose("abc+2", &mut notes);
        assert_eq!(tc.base, "");
        assert_eq!(tc.increment, "2");
        assert_eq!(
            notes.take().as_deref(),
            Some("Conversion error: time_control='abc+2'")
        );

        let tc = parts("-");
        assert_eq!(tc, TimeControlParts::default());

        let tc = parts("1/");
        assert_eq!(tc.correspondence, "");
    }

    #[test]
    fn test_decompose_normalizes_leading_zeros() {
        assert_eq!(parts("060+00").base, "60");
        assert_eq!(parts("060+00").increment, "0");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&parts("600+5")).unwrap();
        assert_eq!(json, r#"{"base":"600","increment":"5","correspondence":""}"#);
    }

    #[test]
    fn test_format_standard_uses_time_class() {
        assert_eq!(game_format("chess", "blitz"), "blitz");
        assert_eq!(game_format("chess", "daily"), "daily");
        assert_eq!(game_format("chess", ""), "");
    }

    #[test]
    fn test_format_chess960() {
        assert_eq!(game_format("chess960", "daily"), "daily960");
        assert_eq!(game_format("chess960", "rapid"), "live960");
    }

    #[test]
    fn test_format_named_variants_and_unknown() {
        assert_eq!(game_format("crazyhouse", "blitz"), "crazyhouse");
        assert_eq!(game_format("threecheck", "bullet"), "threecheck");
        assert_eq!(game_format("atomic", "blitz"), "");
        assert_eq!(game_format("", "blitz"), "");
    }

    #[test]
    fn test_game_type() {
        assert_eq!(game_type("daily"), "daily");
        assert_eq!(game_type("bullet"), "live");
        assert_eq!(game_type(""), "");
    }
}
