use libduckdb_sys::duckdb_string_t;

/// Strings up to this length are stored inline in `duckdb_string_t`.
const INLINE_CAPACITY: u32 = 12;

/// Copies a DuckDB `VARCHAR` value into an owned `String`, replacing invalid UTF-8.
///
/// # Safety
///
/// `s` must be a non-NULL row of a `VARCHAR` vector that is valid for the current
/// invocation. Check row validity before calling.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> String {
    // SAFETY: upheld by the caller.
    let bytes = unsafe { string_bytes(s) };
    String::from_utf8_lossy(bytes).into_owned()
}

unsafe fn string_bytes(s: &duckdb_string_t) -> &[u8] {
    // SAFETY: both union variants start with the length field.
    let len = unsafe { s.value.inlined.length };
    if len == 0 {
        return &[];
    }

    if len <= INLINE_CAPACITY {
        // SAFETY: inline strings keep their `len` bytes in the `inlined` array.
        let inlined = unsafe { &s.value.inlined.inlined };
        unsafe { std::slice::from_raw_parts(inlined.as_ptr() as *const u8, len as usize) }
    } else {
        // SAFETY: longer strings point at `len` bytes owned by the vector.
        let ptr = unsafe { s.value.pointer.ptr };
        unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) }
    }
}
