use duckdb::vtab::BindInfo;
use libduckdb_sys::{
    duckdb_bind_get_named_parameter, duckdb_bind_info, duckdb_destroy_value, duckdb_free,
    duckdb_get_varchar, duckdb_is_null_value,
};
use std::ffi::{CStr, CString};
use std::os::raw::c_void;

/// A `VARCHAR` named parameter as passed to `read_chesscom(...)`.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum NamedParameterVarchar {
    Missing,
    Null,
    Value(String),
}

impl NamedParameterVarchar {
    /// The trimmed value, or `None` when omitted, NULL, or the literal text `null`.
    pub(crate) fn into_option(self) -> Option<String> {
        match self {
            Self::Missing | Self::Null => None,
            Self::Value(raw) if raw.trim().eq_ignore_ascii_case("null") => None,
            Self::Value(raw) => Some(raw.trim().to_string()),
        }
    }
}

pub(crate) fn get_named_parameter_varchar(
    bind: &BindInfo,
    name: &str,
) -> Result<NamedParameterVarchar, Box<dyn std::error::Error>> {
    let name_cstr = CString::new(name)?;

    // SAFETY: The returned value is owned by us and destroyed exactly once below.
    let mut value =
        unsafe { duckdb_bind_get_named_parameter(bind_info_ptr(bind), name_cstr.as_ptr()) };
    if value.is_null() {
        return Ok(NamedParameterVarchar::Missing);
    }

    // SAFETY: `value` is a live `duckdb_value`; the varchar copy is freed with `duckdb_free`.
    let result = unsafe {
        if duckdb_is_null_value(value) {
            Ok(NamedParameterVarchar::Null)
        } else {
            let varchar = duckdb_get_varchar(value);
            if varchar.is_null() {
                Err(format!("Failed to read named parameter '{}' as VARCHAR", name).into())
            } else {
                let text = CStr::from_ptr(varchar).to_string_lossy().into_owned();
                duckdb_free(varchar as *mut c_void);
                Ok(NamedParameterVarchar::Value(text))
            }
        }
    };

    // SAFETY: `value` has not been destroyed yet.
    unsafe {
        duckdb_destroy_value(&mut value);
    }

    result
}

fn bind_info_ptr(bind: &BindInfo) -> duckdb_bind_info {
    // SAFETY: `duckdb::vtab::BindInfo` wraps a single `duckdb_bind_info` and exposes no raw
    // accessor. Re-check this cast whenever the pinned duckdb-rs version changes.
    unsafe { *(bind as *const BindInfo as *const duckdb_bind_info) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_null_are_absent() {
        assert_eq!(NamedParameterVarchar::Missing.into_option(), None);
        assert_eq!(NamedParameterVarchar::Null.into_option(), None);
        assert_eq!(
            NamedParameterVarchar::Value(" NULL ".to_string()).into_option(),
            None
        );
    }

    #[test]
    fn test_value_is_trimmed() {
        assert_eq!(
            NamedParameterVarchar::Value("  meta ".to_string()).into_option(),
            Some("meta".to_string())
        );
        assert_eq!(
            NamedParameterVarchar::Value("".to_string()).into_option(),
            Some(String::new())
        );
    }
}
