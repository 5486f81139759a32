//! ISO-8601 duration strings (`P1M`, `P2W`, `P1DT12H`).

use chrono::{Duration, Months, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$",
    )
    .expect("ISO duration pattern is valid")
});

/// A parsed calendar interval.
///
/// Year and month parts are applied as calendar months (clamping to the end
/// of shorter months); the rest are applied as wall-clock offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoInterval {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Why a duration string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalParseError(pub String);

impl fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid interval: {}", self.0)
    }
}

impl std::error::Error for IntervalParseError {}

impl IsoInterval {
    /// One calendar month, the fallback for unusable durations.
    pub const ONE_MONTH: IsoInterval = IsoInterval {
        years: 0,
        months: 1,
        weeks: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Total calendar months in the interval.
    fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Wall-clock part of the interval.
    fn clock_offset(&self) -> Option<Duration> {
        let days = i64::from(self.weeks) * 7 + i64::from(self.days);
        Duration::try_days(days)?
            .checked_add(&Duration::try_hours(i64::from(self.hours))?)?
            .checked_add(&Duration::try_minutes(i64::from(self.minutes))?)?
            .checked_add(&Duration::try_seconds(i64::from(self.seconds))?)
    }

    /// Subtract the interval from a local wall-clock time.
    ///
    /// Returns `None` only when the result leaves chrono's representable range.
    pub fn subtract_from(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let shifted = local.checked_sub_months(Months::new(self.total_months()?))?;
        shifted.checked_sub_signed(self.clock_offset()?)
    }
}

impl FromStr for IsoInterval {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IntervalParseError(s.to_string());
        let captures = ISO_DURATION.captures(s).ok_or_else(invalid)?;

        // "P" and "P1DT" carry no components.
        if captures.iter().skip(1).all(|group| group.is_none()) || s.ends_with('T') {
            return Err(invalid());
        }

        // Components are all digits; only overflow can fail, and an oversized
        // component saturates so the window is clamped rather than replaced.
        let part = |index: usize| -> u32 {
            captures
                .get(index)
                .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX))
                .unwrap_or(0)
        };

        Ok(IsoInterval {
            years: part(1),
            months: part(2),
            weeks: part(3),
            days: part(4),
            hours: part(5),
            minutes: part(6),
            seconds: part(7),
        })
    }
}
