//! Human-friendly durations for source intervals and run timeouts
//!
//! Grammar: one or more `<integer><unit>` groups, units `ms`, `s`, `m`, `h`
//! and `d`, e.g. `30s`, `5m`, `1h30m`, `250ms`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A strictly positive duration parsed from the interval grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(Duration);

impl Interval {
    /// Wrap a duration. Zero is rejected.
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(Error::InvalidInterval {
                value: format_duration(duration),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self(duration))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Interval> for Duration {
    fn from(interval: Interval) -> Self {
        interval.0
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_duration(s).and_then(Self::new)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse the interval grammar into a [`Duration`].
///
/// Zero durations parse successfully here; [`Interval`] rejects them.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let invalid = |reason: &str| Error::InvalidInterval {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut chars = trimmed.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }
        if digits.is_empty() {
            return Err(invalid("expected a number"));
        }
        let n: u64 = digits.parse().map_err(|_| invalid("number too large"))?;

        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c);
            chars.next();
        }

        let part = match unit.as_str() {
            "ms" => Duration::from_millis(n),
            "s" => Duration::from_secs(n),
            "m" => n.checked_mul(60).map(Duration::from_secs).ok_or_else(|| invalid("overflow"))?,
            "h" => n.checked_mul(3600).map(Duration::from_secs).ok_or_else(|| invalid("overflow"))?,
            "d" => n.checked_mul(86_400).map(Duration::from_secs).ok_or_else(|| invalid("overflow"))?,
            "" => return Err(invalid("missing unit (use ms, s, m, h or d)")),
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };
        total = total.checked_add(part).ok_or_else(|| invalid("overflow"))?;
    }

    Ok(total)
}

/// Render a duration in the interval grammar, largest units first.
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(&str, u128); 5] = [
        ("d", 86_400_000),
        ("h", 3_600_000),
        ("m", 60_000),
        ("s", 1_000),
        ("ms", 1),
    ];

    let mut millis = duration.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in UNITS {
        let count = millis / size;
        if count > 0 {
            out.push_str(&format!("{count}{unit}"));
            millis %= size;
        }
    }
    out
}
