//! Window boundaries for rule durations.
//!
//! Two flavours of duration are supported:
//!
//! - **Rolling** (`P7D`, `P1M`, ...): the boundary is the reference time minus
//!   the interval.
//! - **Calendar-aligned** (`1M`, `1W`, `2D`, `1Y`): the reference time is first
//!   moved forward to the start of the next calendar unit named by the last
//!   character (next Jan 1, first of next month, next Sunday, next midnight),
//!   then the interval is subtracted. `1M` therefore means "this month" rather
//!   than "the last 30 days".
//!
//! Unparsable durations fall back to one calendar month, and windows too
//! large to represent start at [`earliest_boundary`]. This never fails.

use super::clock::Clock;
use super::duration::IsoInterval;
use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use std::sync::Arc;

/// Rows older than this many months (plus [`RETENTION_CEILING_DAYS`]) are purged.
///
/// This is the hard outer bound for every rule duration: a window reaching
/// further back than the ceiling silently under-counts.
pub const RETENTION_CEILING_MONTHS: u32 = 1;

/// Extra days kept beyond [`RETENTION_CEILING_MONTHS`].
pub const RETENTION_CEILING_DAYS: u64 = 1;

/// Start of the calendar unit after the one containing `local`.
fn next_calendar_boundary(local: NaiveDateTime, unit: char) -> Option<NaiveDateTime> {
    let date = local.date();
    let next = match unit {
        'Y' => NaiveDate::from_ymd_opt(date.year().checked_add(1)?, 1, 1)?,
        'M' => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.checked_add_months(Months::new(1))?,
        'W' => {
            let until_sunday = 7 - u64::from(date.weekday().num_days_from_sunday());
            date.checked_add_days(Days::new(until_sunday))?
        }
        'D' => date.succ_opt()?,
        _ => return Some(local),
    };
    Some(next.and_time(NaiveTime::MIN))
}

/// Map a local wall-clock time back to an instant, tolerating DST gaps.
fn to_instant(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            // Inside a spring-forward gap; the first valid instant is an hour on.
            tz.from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// Compute the earliest `date_added` still inside the window.
///
/// `duration` is either rolling (`P`-prefixed) or calendar-aligned (ending in
/// `Y`, `M`, `W` or `D`); anything unparsable behaves exactly like `P1M`.
/// The result is truncated to whole seconds.
pub fn oldest_boundary(duration: &str, tz: Tz, reference: DateTime<Utc>) -> DateTime<Utc> {
    let reference = reference.trunc_subsecs(0);
    let local = reference.with_timezone(&tz).naive_local();
    let duration = duration.trim();

    let (anchor, spec) = if duration.starts_with('P') {
        (local, duration.to_uppercase())
    } else {
        let unit = duration
            .chars()
            .last()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('P');
        let anchor = next_calendar_boundary(local, unit).unwrap_or(local);
        (anchor, format!("P{}", duration.to_uppercase()))
    };

    let interval = spec.parse::<IsoInterval>().unwrap_or_else(|e| {
        tracing::debug!(duration = %duration, error = %e, "Falling back to one month window");
        IsoInterval::ONE_MONTH
    });

    let oldest = interval
        .subtract_from(anchor)
        .map(|oldest| to_instant(tz, oldest).trunc_subsecs(0));
    clamp_to_earliest(duration, oldest)
}

/// The earliest boundary a window may reach: `0001-01-01T00:00:00Z`.
///
/// Anything older cannot be bound as a `timestamptz` parameter.
pub fn earliest_boundary() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Oversized windows (or ones chrono cannot represent) start at [`earliest_boundary`].
fn clamp_to_earliest(duration: &str, oldest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let earliest = earliest_boundary();
    match oldest {
        Some(oldest) if oldest >= earliest => oldest,
        _ => {
            tracing::warn!(
                duration = %duration,
                earliest = %earliest,
                "Window reaches past the earliest representable instant, clamping"
            );
            earliest
        }
    }
}

/// Resolves rule durations against a default timezone and a clock.
#[derive(Clone)]
pub struct IntervalResolver {
    default_tz: Tz,
    clock: Arc<dyn Clock>,
}

impl IntervalResolver {
    /// Create a resolver.
    pub fn new(default_tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { default_tz, clock }
    }

    /// The timezone used when callers don't name one.
    pub fn default_timezone(&self) -> Tz {
        self.default_tz
    }

    /// The current instant according to the resolver's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Parse a timezone name, falling back to the default on unknown names.
    pub fn timezone(&self, name: Option<&str>) -> Tz {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => self.default_tz,
            Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(
                    timezone = %name,
                    fallback = %self.default_tz,
                    "Unknown timezone, using default"
                );
                self.default_tz
            }),
        }
    }

    /// Earliest `date_added` inside the window of `duration`.
    ///
    /// The reference time is `send_time` when given (back-dated scheduled
    /// sends), otherwise now.
    pub fn oldest_boundary(
        &self,
        duration: &str,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        let reference = send_time.unwrap_or_else(|| self.clock.now());
        oldest_boundary(duration, self.timezone(timezone), reference)
    }

    /// Rows with `date_added` before this instant are due for purging.
    pub fn retention_cutoff(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        now.checked_sub_months(Months::new(RETENTION_CEILING_MONTHS))
            .and_then(|t| t.checked_sub_days(Days::new(RETENTION_CEILING_DAYS)))
            .unwrap_or(now)
            .trunc_subsecs(0)
    }
}
