//! Percent escaping for log fields
//!
//! Encoding follows RFC 3986: unreserved bytes pass through, everything else
//! becomes `%XX`. Decoding follows query-unescape rules, so `+` also decodes
//! to a space.

use bytes::{BufMut, BytesMut};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

fn escape_bytes(input: &str, mut push: impl FnMut(u8)) {
    for &b in input.as_bytes() {
        if is_unreserved(b) {
            push(b);
        } else {
            push(b'%');
            push(HEX[(b >> 4) as usize]);
            push(HEX[(b & 0x0f) as usize]);
        }
    }
}

/// Percent-escape `input`
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    escape_bytes(input, |b| out.push(b as char));
    out
}

/// Percent-escape `input` straight into a record buffer
pub(crate) fn escape_into(input: &str, buf: &mut BytesMut) {
    buf.reserve(input.len());
    escape_bytes(input, |b| buf.put_u8(b));
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode a percent-escaped field
///
/// Returns a human readable reason on a malformed escape or when the decoded
/// bytes are not UTF-8.
pub fn unescape(input: &str) -> std::result::Result<String, String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        let end = (i + 3).min(bytes.len());
                        return Err(format!(
                            "invalid escape {:?} at byte {}",
                            String::from_utf8_lossy(&bytes[i..end]),
                            i
                        ));
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|e| format!("decoded bytes are not valid UTF-8: {}", e))
}
