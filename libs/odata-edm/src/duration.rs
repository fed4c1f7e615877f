//! ISO-8601 duration values (`Edm.Duration`).
//!
//! The wire grammar is `[-]P[nY][nM][nW][nD][T[nH][nM][nS]]` — a sign plus
//! seven numeric components, any of which may be absent. Re-serialization
//! emits only the non-zero components, so `"P1Y0M"` comes back as `"P1Y"`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::EdmError;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([+-])?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .unwrap()
});

/// Decomposed ISO-8601 duration.
///
/// Components are kept as written instead of being normalized to a single
/// unit: OData durations are calendrical (a month is not a fixed number of
/// seconds), so `P1M` and `P30D` are distinct values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdmDuration {
    pub negative: bool,
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

impl EdmDuration {
    /// Parse the textual wire form.
    ///
    /// # Errors
    /// Returns `EdmError::MalformedDuration` when the input does not match
    /// the duration grammar or carries no components at all (`"P"`).
    pub fn parse(text: &str) -> Result<Self, EdmError> {
        let caps = DURATION_RE
            .captures(text.trim())
            .ok_or_else(|| EdmError::MalformedDuration(text.to_owned()))?;

        let int = |i: usize| -> u64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        let out = EdmDuration {
            negative: caps.get(1).is_some_and(|m| m.as_str() == "-"),
            years: int(2),
            months: int(3),
            weeks: int(4),
            days: int(5),
            hours: int(6),
            minutes: int(7),
            seconds: caps
                .get(8)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0),
        };

        // "P" alone matches the regex but is not a valid duration.
        if caps.iter().skip(2).all(|m| m.is_none()) {
            return Err(EdmError::MalformedDuration(text.to_owned()));
        }
        Ok(out)
    }

    /// True when every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.weeks == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0.0
    }
}

impl FromStr for EdmDuration {
    type Err = EdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EdmDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "PT0S");
        }
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.weeks > 0 {
            write!(f, "{}W", self.weeks)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds != 0.0 {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds != 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}
