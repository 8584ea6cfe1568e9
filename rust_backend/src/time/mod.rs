//! Epoch conversions for scheduling window times.
//!
//! Scheduling token streams carry times as milliseconds since the Unix epoch.
//! [`TimeFormat`] selects how those instants are rendered: integer seconds,
//! truncated ISO-8601 text, or fractional years.

pub mod epoch;

pub use epoch::{EpochMillis, TimeFormat, WindowTime};
