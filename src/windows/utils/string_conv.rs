//! UTF-16 conversions for Win32 buffers

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

/// Converts a possibly NUL-terminated wide buffer
pub fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    OsString::from_wide(&wide[..len])
        .to_string_lossy()
        .into_owned()
}
