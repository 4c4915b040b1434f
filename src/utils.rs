//! Utility functions and helpers
//!
//! Input parsing and formatting shared by the configuration layer and the report.

use crate::{Error, Result};

/// Strip an optional `0x` or `0X` prefix
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse compact difficulty bits written as hex, e.g. `1d00ffff` or `0x1e0ffff0`
pub fn parse_compact_bits(s: &str) -> Result<u32> {
    let digits = strip_hex_prefix(s.trim());
    if digits.is_empty() {
        return Err(Error::invalid_hex("bits", "no hex digits"));
    }
    if digits.len() > 8 {
        return Err(Error::invalid_hex(
            "bits",
            format!("expected at most 8 hex digits, got {}", digits.len()),
        ));
    }
    u32::from_str_radix(digits, 16).map_err(|e| Error::invalid_hex("bits", e))
}

/// Decode a hex-encoded field, naming the field in the error
///
/// An empty string decodes to no bytes.
pub fn decode_hex_field(field: &str, s: &str) -> Result<Vec<u8>> {
    let digits = strip_hex_prefix(s.trim());
    hex::decode(digits).map_err(|e| Error::invalid_hex(field, e))
}

/// Format a count with thousands separators
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
