//! Line splitting and byte classification shared by the line-oriented
//! stages (start line and header block).

/// Split off the first `\n`-terminated line of `buf`.
///
/// Returns the line (without its `\n`) and everything after it, or `None`
/// when `buf` holds no terminator yet.
#[inline]
pub(crate) fn split_line(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    memchr::memchr(b'\n', buf).map(|pos| (&buf[..pos], &buf[pos + 1..]))
}

/// Strip every trailing `\r`, so `\r\n` and bare `\n` terminate lines alike.
#[inline]
pub(crate) fn trim_cr(line: &[u8]) -> &[u8] {
    let end = line.iter().rposition(|&b| b != b'\r').map_or(0, |pos| pos + 1);
    &line[..end]
}

/// Bytes allowed in a method token: `[A-Z]`.
#[inline]
pub(crate) fn is_method_byte(b: u8) -> bool {
    b.is_ascii_uppercase()
}

/// Bytes allowed in a header name: `[A-Za-z0-9_.-]`.
///
/// Narrower than RFC 9110 `tchar`.
#[inline]
pub(crate) fn is_header_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')
}

/// Bytes allowed in a request target: visible ASCII (`VCHAR`).
#[inline]
pub(crate) fn is_target_byte(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
}
