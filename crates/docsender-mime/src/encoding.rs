//! Encoding helpers for message bodies and headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length per RFC 2045.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64, folded to 76-column lines with CRLF.
#[must_use]
pub fn encode_base64_folded(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);
    let bytes = encoded.as_bytes();
    for chunk in bytes.chunks(MAX_LINE_LENGTH) {
        // Base64 output is pure ASCII.
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

/// Encodes a header value as an RFC 2047 encoded-word when it contains
/// non-ASCII characters, otherwise returns it unchanged.
#[must_use]
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    let mut out = String::new();
    let _ = write!(out, "=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()));
    out
}
