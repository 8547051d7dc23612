//! C FFI bindings for the dashstache template engine.
//!
//! Exposes `ds_render_json` and `ds_string_free` for dashboards hosted outside Rust.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use dashstache::{Dashstache, DashstacheError, RenderOptions};

/// Render a dashstache template with JSON data.
///
/// # Safety
///
/// - `template_utf8` must be a valid null-terminated UTF-8 string.
/// - `data_json_utf8` must be a valid null-terminated UTF-8 JSON object.
/// - `options_json_utf8_or_null` may be null, or a valid null-terminated UTF-8
///   JSON object of render options.
/// - `out_error_json_utf8` must be a valid pointer to a `*mut c_char` (initially null).
///
/// On success, returns a pointer to the null-terminated rendered text.
/// The caller must free it with `ds_string_free`.
///
/// On error, returns null and writes an error JSON string to `*out_error_json_utf8`.
/// The caller must free the error string with `ds_string_free`.
#[no_mangle]
pub unsafe extern "C" fn ds_render_json(
    template_utf8: *const c_char,
    data_json_utf8: *const c_char,
    options_json_utf8_or_null: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let result = read_str(template_utf8).and_then(|template| {
        let data: serde_json::Value = serde_json::from_str(read_str(data_json_utf8)?)?;
        let options = if options_json_utf8_or_null.is_null() {
            RenderOptions::default()
        } else {
            RenderOptions::from_json_str(read_str(options_json_utf8_or_null)?)?
        };
        Dashstache::parse_with_options(template, options)?.render_json(data)
    });

    match result.and_then(|text| CString::new(text).map_err(invalid_data)) {
        Ok(cs) => cs.into_raw(),
        Err(err) => {
            write_dashstache_error(out_error_json_utf8, &err);
            ptr::null_mut()
        }
    }
}

/// Free a string previously returned by `ds_render_json` or written to `out_error_json_utf8`.
///
/// # Safety
///
/// `p` must be a pointer previously returned by this crate via `CString::into_raw`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn ds_string_free(p: *mut c_char) {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
}

unsafe fn read_str<'a>(p: *const c_char) -> Result<&'a str, DashstacheError> {
    if p.is_null() {
        return Err(invalid_data("null string pointer"));
    }
    CStr::from_ptr(p).to_str().map_err(invalid_data)
}

fn invalid_data(e: impl ToString) -> DashstacheError {
    DashstacheError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        e.to_string(),
    ))
}

/// Convert a `DashstacheError` to error JSON and write it to the output pointer.
unsafe fn write_dashstache_error(out: *mut *mut c_char, err: &DashstacheError) {
    let (error_type, line, column) = match err {
        DashstacheError::Parse(e) => {
            let position = e.position();
            ("ParseError", Some(position.line + 1), Some(position.column + 1))
        }
        DashstacheError::Data { .. } => ("DataError", None, None),
        DashstacheError::Template { .. } => ("TemplateError", None, None),
        DashstacheError::Config { .. } => ("ConfigError", None, None),
        DashstacheError::Json(e) => ("JsonError", Some(e.line()), Some(e.column())),
        DashstacheError::Io(_) => ("IoError", None, None),
    };

    write_error(out, error_type, &err.to_string(), line, column);
}

/// Write an error JSON string to the output pointer.
unsafe fn write_error(
    out: *mut *mut c_char,
    error_type: &str,
    message: &str,
    line: Option<usize>,
    column: Option<usize>,
) {
    if out.is_null() {
        return;
    }

    let json = serde_json::json!({
        "type": error_type,
        "message": message,
        "line": line,
        "column": column,
    });

    if let Ok(cs) = CString::new(json.to_string()) {
        *out = cs.into_raw();
    }
}
