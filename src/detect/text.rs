//! Best-effort text rendering of binary data.
//!
//! Contract: lossy decode, invalid UTF-8 sequences become replacement
//! characters, nothing is validated. Only suitable for substring
//! heuristics (device-tree compatible hints, carver output keywords),
//! never for exact field extraction.

/// Lossy UTF-8 rendering of `data`.
pub fn decode_lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

/// Lossy, lower-cased rendering for case-insensitive substring checks.
pub fn decode_lossy_lower(data: &[u8]) -> String {
    decode_lossy(data).to_lowercase()
}
