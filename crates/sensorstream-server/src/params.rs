//! Lenient query-string parsing
//!
//! Bad input never fails a request. A bound that cannot be read is treated
//! as absent, a cadence that cannot be read falls back to the default. When
//! a key repeats, its first value wins.

use std::time::Duration;

/// Decoded query-string pairs in request order
pub type QueryPairs = Vec<(String, String)>;

/// First value given for `key`, if any
fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Raw `/api/data` query string; values are parsed leniently afterwards
#[derive(Debug, Default)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            start: first(pairs, "start").map(str::to_string),
            end: first(pairs, "end").map(str::to_string),
        }
    }

    /// `(start, end)` as inclusive millisecond bounds
    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        (
            parse_int_prefix(self.start.as_deref()),
            parse_int_prefix(self.end.as_deref()),
        )
    }
}

/// Raw `/api/stream` query string
#[derive(Debug, Default)]
pub struct StreamParams {
    pub cadence: Option<String>,
}

impl StreamParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            cadence: first(pairs, "cadence").map(str::to_string),
        }
    }

    /// Requested cadence, or `default` when missing or unreadable,
    /// raised to at least `min`
    pub fn cadence(&self, default: Duration, min: Duration) -> Duration {
        let requested = parse_int_prefix(self.cadence.as_deref())
            .and_then(|ms| u64::try_from(ms).ok())
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(default);
        requested.max(min)
    }
}

/// Integer-prefix parse: leading whitespace, optional sign, then digits
///
/// Trailing garbage is ignored ("150ms" reads as 150). No digits, an empty
/// value, or a value outside `i64` yields `None`.
pub fn parse_int_prefix(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude = &rest[..digits];
    if negative {
        // Parse with the sign attached so i64::MIN stays representable
        format!("-{magnitude}").parse().ok()
    } else {
        magnitude.parse().ok()
    }
}
