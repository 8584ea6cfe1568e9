//! Domain records shared by the export parsers and the window decoder.

use qtty::Degrees;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::time::{EpochMillis, TimeFormat, WindowTime};

/// One parsed insert statement: column name to raw literal text.
///
/// Rows of the same table may carry different keys, the exporter omits
/// columns per statement variant.
pub type Row = BTreeMap<String, String>;

/// A guide-star scheduling window for one visit.
///
/// Times are kept as epoch milliseconds and rendered in a [`TimeFormat`] on
/// output. Adjacency is judged on the rendered values, so two windows that
/// touch once truncated to whole seconds count as contiguous.
///
/// # Examples
///
/// ```
/// use aptx_rust::core::domain::SchedulingWindow;
/// use aptx_rust::time::{EpochMillis, TimeFormat, WindowTime};
/// use qtty::Degrees;
///
/// let window = SchedulingWindow {
///     observation: 1,
///     visit: 1,
///     start: EpochMillis::new(1_000),
///     end: EpochMillis::new(3_000),
///     min_pa: Degrees::new(0.0),
///     max_pa: Degrees::new(10.0),
///     probability: 1.0,
/// };
///
/// assert_eq!(window.start_time(TimeFormat::Unix), Some(WindowTime::Unix(1)));
/// assert_eq!(window.duration_seconds(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulingWindow {
    pub observation: u32,
    pub visit: u32,
    pub start: EpochMillis,
    pub end: EpochMillis,
    pub min_pa: Degrees,
    pub max_pa: Degrees,
    pub probability: f64,
}

impl SchedulingWindow {
    /// Returns true when `next` continues this window: same observation and
    /// visit, starts where this one ends once both are converted to `format`,
    /// same angle bracket and probability.
    pub fn is_extended_by(&self, next: &SchedulingWindow, format: TimeFormat) -> bool {
        self.observation == next.observation
            && self.visit == next.visit
            && self.end_time(format).is_some()
            && self.end_time(format) == next.start_time(format)
            && self.min_pa == next.min_pa
            && self.max_pa == next.max_pa
            && self.probability == next.probability
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end.value() - self.start.value()) as f64 / 1000.0
    }

    pub fn start_time(&self, format: TimeFormat) -> Option<WindowTime> {
        format.convert(self.start)
    }

    pub fn end_time(&self, format: TimeFormat) -> Option<WindowTime> {
        format.convert(self.end)
    }

    /// Fixed-width `.gswin` line (newline-terminated).
    pub fn format_line(&self, format: TimeFormat) -> Option<String> {
        let start = self.start_time(format)?;
        let end = self.end_time(format)?;
        Some(format!(
            "{:3} {:3} {} {} {:7.3} {:7.3} {:.6}\n",
            self.observation,
            self.visit,
            start,
            end,
            self.min_pa.value(),
            self.max_pa.value(),
            self.probability
        ))
    }
}
