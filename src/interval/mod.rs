//! Time-window arithmetic for rule durations.
//!
//! Every rule is evaluated as "rows with `date_added` at or after some
//! boundary". This module turns a duration string plus a reference time into
//! that boundary, and supplies the clock the rest of the crate reads "now" from.

pub mod clock;
pub mod duration;
pub mod resolver;

pub use clock::{Clock, FixedClock, SystemClock};
pub use duration::IsoInterval;
pub use resolver::{earliest_boundary, oldest_boundary, IntervalResolver, RETENTION_CEILING_DAYS, RETENTION_CEILING_MONTHS};
