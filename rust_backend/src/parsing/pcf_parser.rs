//! Scheduling PCF token stream decoding.
//!
//! A PCF stream is whitespace-delimited and mixes three untagged token shapes:
//!
//! - `a1:a2` - position-angle bracket in degrees, held until superseded
//! - `0.85` - probability (contains a decimal point), held until superseded
//! - `1704067200000` - time in epoch milliseconds
//!
//! Time tokens pair up: the first opens an interval, the second closes it.
//! A closed interval with positive probability becomes a window; the held
//! bracket and probability are then cleared.

use qtty::Degrees;

use crate::core::domain::SchedulingWindow;
use crate::error::{AptxError, AptxResult};
use crate::time::{EpochMillis, TimeFormat};

/// One classified token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PcfToken {
    Range(f64, f64),
    Probability(f64),
    Time(EpochMillis),
}

impl PcfToken {
    /// Classify a token: a colon makes it a range, a decimal point a
    /// probability, anything else must be an integer time.
    pub fn parse(token: &str) -> Result<Self, String> {
        if let Some((a1, a2)) = token.split_once(':') {
            let a1 = a1
                .parse::<f64>()
                .map_err(|_| format!("invalid angle range '{}'", token))?;
            let a2 = a2
                .parse::<f64>()
                .map_err(|_| format!("invalid angle range '{}'", token))?;
            Ok(PcfToken::Range(a1, a2))
        } else if token.contains('.') {
            let p = token
                .parse::<f64>()
                .map_err(|_| format!("invalid probability '{}'", token))?;
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("probability {} outside [0, 1]", p));
            }
            Ok(PcfToken::Probability(p))
        } else {
            token
                .parse::<i64>()
                .map(|ms| PcfToken::Time(EpochMillis::new(ms)))
                .map_err(|_| format!("unrecognized token '{}'", token))
        }
    }
}

/// An interval closed by the second of a pair of time tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedInterval {
    pub start: EpochMillis,
    pub end: EpochMillis,
    pub min_pa: f64,
    pub max_pa: f64,
    pub probability: f64,
}

/// Constraint values held across the token scan.
#[derive(Debug, Clone, Default)]
pub struct ConstraintState {
    min_pa: f64,
    max_pa: f64,
    probability: f64,
    range_seen: bool,
    interval_start: Option<EpochMillis>,
}

impl ConstraintState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_range(&mut self, min_pa: f64, max_pa: f64) {
        self.min_pa = min_pa;
        self.max_pa = max_pa;
        self.range_seen = true;
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }

    /// Feed a time token. Returns the interval when `t` closes one.
    ///
    /// Once an interval closes, probability and bracket go back to zero so a
    /// following interval without its own tokens yields no window.
    pub fn push_time(&mut self, t: EpochMillis) -> Result<Option<ClosedInterval>, String> {
        if !self.range_seen {
            return Err(format!("time {} precedes any angle range", t.value()));
        }

        match self.interval_start.take() {
            None => {
                self.interval_start = Some(t);
                Ok(None)
            }
            Some(start) => {
                let interval = ClosedInterval {
                    start,
                    end: t,
                    min_pa: self.min_pa,
                    max_pa: self.max_pa,
                    probability: self.probability,
                };
                self.reset();
                Ok(Some(interval))
            }
        }
    }

    /// Check that the stream did not stop inside an interval.
    pub fn finish(&self) -> Result<(), String> {
        match self.interval_start {
            Some(start) => Err(format!(
                "stream ends inside interval starting at {}",
                start.value()
            )),
            None => Ok(()),
        }
    }

    fn reset(&mut self) {
        self.probability = 0.0;
        self.min_pa = 0.0;
        self.max_pa = 0.0;
    }
}

/// Ordered window list that folds contiguous, constraint-identical windows
/// into their predecessor.
///
/// Contiguity is checked on times converted to the output format.
#[derive(Debug, Clone, Default)]
pub struct WindowAccumulator {
    windows: Vec<SchedulingWindow>,
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `window`, or extend the most recent window when `window`
    /// continues it in `format`. Only the last window is ever a merge target.
    pub fn push(&mut self, window: SchedulingWindow, format: TimeFormat) {
        match self.windows.last_mut() {
            Some(prev) if prev.is_extended_by(&window, format) => prev.end = window.end,
            _ => self.windows.push(window),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn into_windows(self) -> Vec<SchedulingWindow> {
        self.windows
    }
}

/// Decode one visit's PCF stream into `windows`.
///
/// Every time token must be representable in `format`.
pub fn decode_pcf(
    pcf: &str,
    observation: u32,
    visit: u32,
    format: TimeFormat,
    windows: &mut WindowAccumulator,
) -> AptxResult<()> {
    let malformed = |reason: String| AptxError::MalformedPcf {
        observation: observation.to_string(),
        visit: visit.to_string(),
        reason,
    };

    let mut state = ConstraintState::new();

    for token in pcf.split_whitespace() {
        match PcfToken::parse(token).map_err(malformed)? {
            PcfToken::Range(a1, a2) => state.set_range(a1, a2),
            PcfToken::Probability(p) => state.set_probability(p),
            PcfToken::Time(t) => {
                if format.convert(t).is_none() {
                    return Err(malformed(format!(
                        "time {} cannot be expressed as {}",
                        t.value(),
                        format
                    )));
                }

                if let Some(interval) = state.push_time(t).map_err(malformed)? {
                    if interval.probability > 0.0 {
                        let window = SchedulingWindow {
                            observation,
                            visit,
                            start: interval.start,
                            end: interval.end,
                            min_pa: Degrees::new(interval.min_pa),
                            max_pa: Degrees::new(interval.max_pa),
                            probability: interval.probability,
                        };
                        windows.push(window, format);
                    }
                }
            }
        }
    }

    state.finish().map_err(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_classification() {
        assert_eq!(PcfToken::parse("0.0:10.5"), Ok(PcfToken::Range(0.0, 10.5)));
        assert_eq!(PcfToken::parse("0.25"), Ok(PcfToken::Probability(0.25)));
        assert_eq!(
            PcfToken::parse("1704067200000"),
            Ok(PcfToken::Time(EpochMillis::new(1_704_067_200_000)))
        );
        assert!(PcfToken::parse("1.5").is_err());
        assert!(PcfToken::parse("abc").is_err());
        assert!(PcfToken::parse("1:x").is_err());
    }

    #[test]
    fn test_state_pairs_times_and_resets() {
        let mut state = ConstraintState::new();
        state.set_range(5.0, 15.0);
        state.set_probability(0.5);

        assert_eq!(state.push_time(EpochMillis::new(10)), Ok(None));
        let interval = state.push_time(EpochMillis::new(20)).unwrap().unwrap();
        assert_eq!(interval.start, EpochMillis::new(10));
        assert_eq!(interval.end, EpochMillis::new(20));
        assert_eq!(interval.probability, 0.5);
        assert_eq!((interval.min_pa, interval.max_pa), (5.0, 15.0));

        // Next interval without fresh tokens carries zero constraints
        assert_eq!(state.push_time(EpochMillis::new(20)), Ok(None));
        let stale = state.push_time(EpochMillis::new(30)).unwrap().unwrap();
        assert_eq!(stale.probability, 0.0);
        assert_eq!((stale.min_pa, stale.max_pa), (0.0, 0.0));
        assert!(state.finish().is_ok());
    }

    #[test]
    fn test_state_rejects_time_before_range() {
        let mut state = ConstraintState::new();
        state.set_probability(1.0);
        assert!(state.push_time(EpochMillis::new(10)).is_err());
    }

    #[test]
    fn test_state_rejects_open_interval() {
        let mut state = ConstraintState::new();
        state.set_range(0.0, 1.0);
        state.push_time(EpochMillis::new(10)).unwrap();
        assert!(state.finish().is_err());
    }

    #[test]
    fn test_accumulator_merges_only_last() {
        let w = |start: i64, end: i64, p: f64| SchedulingWindow {
            observation: 1,
            visit: 1,
            start: EpochMillis::new(start * 1000),
            end: EpochMillis::new(end * 1000),
            min_pa: Degrees::new(0.0),
            max_pa: Degrees::new(10.0),
            probability: p,
        };

        let unix = TimeFormat::Unix;
        let mut acc = WindowAccumulator::new();
        acc.push(w(0, 10, 1.0), unix);
        acc.push(w(10, 20, 1.0), unix);
        acc.push(w(20, 30, 0.5), unix);
        // Contiguous with the first window's original end, but not with the last
        acc.push(w(20, 40, 1.0), unix);

        let windows = acc.into_windows();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].end, EpochMillis::new(20_000));
        assert_eq!(windows[1].probability, 0.5);
        assert_eq!(windows[2].start, EpochMillis::new(20_000));
    }
}
