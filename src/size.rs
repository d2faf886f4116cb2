use crate::error::{ChunktarError, Result};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Parse a split size such as `4096`, `512K`, `100M` or `2G`.
/// Suffixes are binary multiples and case-insensitive; an empty string is 0.
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }

    let (digits, multiplier) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let multiplier = match c.to_ascii_uppercase() {
                'K' => KIB,
                'M' => MIB,
                'G' => GIB,
                _ => return Err(ChunktarError::InvalidSize(format!("unknown suffix in {:?}", s))),
            };
            (&s[..i], multiplier)
        }
        _ => (s, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| ChunktarError::InvalidSize(format!("{:?} is not a number", s)))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| ChunktarError::InvalidSize(format!("{:?} is too large", s)))
}

/// Human-readable byte count for reports
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    }
}
