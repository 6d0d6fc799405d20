//! Canonical timestamp handling
//!
//! Every timestamp exchanged with the validation store uses the canonical
//! `YYYY-MM-DD HH:MM:SS` form: UTC, no fractional seconds, no offset. The
//! canonical form sorts lexicographically in timestamp order, which the
//! store's windowed queries rely on.

use crate::{Error, Result};
use chrono::{NaiveDateTime, Timelike, Utc};

/// strftime pattern for the canonical timestamp form
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get the current UTC time, truncated to whole seconds
pub fn now() -> NaiveDateTime {
    Utc::now()
        .naive_utc()
        .with_nanosecond(0)
        .expect("zero nanoseconds is always in range")
}

/// Format a timestamp in the canonical form
pub fn format_canonical(ts: NaiveDateTime) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

/// Parse a canonical timestamp, rejecting anything else
///
/// Offsets, fractional seconds, `T` separators, and short forms all fail;
/// malformed timestamps must be rejected at the boundary, never truncated
/// into something parseable.
pub fn parse_canonical(s: &str) -> Result<NaiveDateTime> {
    if s.len() != 19 {
        return Err(Error::Timestamp(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).map_err(|_| Error::Timestamp(s.to_string()))
}

/// Check a string against the canonical form without keeping the parse
pub fn is_canonical(s: &str) -> bool {
    parse_canonical(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let ts = parse_canonical("2025-06-01 14:30:00").unwrap();
        assert_eq!(format_canonical(ts), "2025-06-01 14:30:00");
    }

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = now();
        assert_eq!(ts.nanosecond(), 0);
        assert!(is_canonical(&format_canonical(ts)));
    }

    #[test]
    fn test_rejects_offset() {
        assert!(parse_canonical("2025-06-01 14:30:00Z").is_err());
        assert!(parse_canonical("2025-06-01 14:30:00+02:00").is_err());
    }

    #[test]
    fn test_rejects_fractional_seconds() {
        assert!(parse_canonical("2025-06-01 14:30:00.500").is_err());
    }

    #[test]
    fn test_rejects_t_separator() {
        assert!(parse_canonical("2025-06-01T14:30:00").is_err());
    }

    #[test]
    fn test_rejects_short_and_garbage() {
        assert!(parse_canonical("2025-06-01 14:30").is_err());
        assert!(parse_canonical("not a timestamp at all").is_err());
        assert!(parse_canonical("").is_err());
    }

    #[test]
    fn test_canonical_form_sorts_lexicographically() {
        let earlier = "2025-06-01 09:00:00";
        let later = "2025-06-01 10:00:00";
        assert!(earlier < later);
        assert!(parse_canonical(earlier).unwrap() < parse_canonical(later).unwrap());
    }
}
