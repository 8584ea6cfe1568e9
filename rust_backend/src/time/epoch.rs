use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliseconds since the Unix epoch, as written in scheduling token streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// Raw millisecond value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// UTC datetime, or `None` when the value is outside chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }

    /// Whole seconds since the epoch, truncated toward zero.
    pub fn unix_seconds(&self) -> i64 {
        self.0 / 1000
    }

    /// ISO-8601 text truncated to whole seconds, e.g. `2024-03-01T12:00:00`.
    pub fn isot(&self) -> Option<String> {
        self.to_utc()
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    /// Fractional year: calendar year plus the elapsed fraction of that UTC year.
    ///
    /// # Example
    /// ```
    /// use aptx_rust::time::EpochMillis;
    /// // 2023-07-02T12:00:00Z is exactly halfway through 2023
    /// let t = EpochMillis::new(1_688_299_200_000);
    /// assert!((t.decimal_year().unwrap() - 2023.5).abs() < 1e-9);
    /// ```
    pub fn decimal_year(&self) -> Option<f64> {
        let dt = self.to_utc()?;
        let year = dt.year();
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;

        let elapsed = (self.0 - start.timestamp_millis()) as f64;
        let length = (end.timestamp_millis() - start.timestamp_millis()) as f64;
        Some(year as f64 + elapsed / length)
    }
}

/// Output representation for window start/end times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Integer seconds since the Unix epoch
    #[default]
    Unix,
    /// ISO-8601 text truncated to whole seconds
    Isot,
    /// Fractional year
    DecimalYear,
}

impl TimeFormat {
    /// Convert an epoch time into this representation.
    pub fn convert(&self, t: EpochMillis) -> Option<WindowTime> {
        match self {
            TimeFormat::Unix => Some(WindowTime::Unix(t.unix_seconds())),
            TimeFormat::Isot => t.isot().map(WindowTime::Isot),
            TimeFormat::DecimalYear => t.decimal_year().map(WindowTime::DecimalYear),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::Unix => "unix",
            TimeFormat::Isot => "isot",
            TimeFormat::DecimalYear => "decimalyear",
        }
    }
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unix" => Ok(TimeFormat::Unix),
            "isot" => Ok(TimeFormat::Isot),
            "decimalyear" => Ok(TimeFormat::DecimalYear),
            other => Err(format!(
                "Unknown time format: {}. Must be 'unix', 'isot' or 'decimalyear'",
                other
            )),
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A converted time value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WindowTime {
    Unix(i64),
    Isot(String),
    DecimalYear(f64),
}

impl fmt::Display for WindowTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowTime::Unix(s) => write!(f, "{}", s),
            WindowTime::Isot(s) => f.write_str(s),
            WindowTime::DecimalYear(y) => write!(f, "{:.5}", y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-01T12:34:56.789Z
    const SAMPLE_MS: i64 = 1_709_296_496_789;

    #[test]
    fn test_unix_truncates_milliseconds() {
        let t = EpochMillis::new(SAMPLE_MS);
        assert_eq!(t.unix_seconds(), 1_709_296_496);
        assert_eq!(
            TimeFormat::Unix.convert(t),
            Some(WindowTime::Unix(1_709_296_496))
        );
    }

    #[test]
    fn test_isot_drops_fraction() {
        let t = EpochMillis::new(SAMPLE_MS);
        assert_eq!(t.isot().as_deref(), Some("2024-03-01T12:34:56"));
    }

    #[test]
    fn test_decimal_year_start_of_year() {
        // 2024-01-01T00:00:00Z
        let t = EpochMillis::new(1_704_067_200_000);
        assert_eq!(t.decimal_year(), Some(2024.0));
    }

    #[test]
    fn test_decimal_year_leap_year_length() {
        // 2024-07-02T00:00:00Z is day 183 of the 366-day year 2024
        let t = EpochMillis::new(1_719_878_400_000);
        let expected = 2024.0 + 183.0 / 366.0;
        assert!((t.decimal_year().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_window_time_display() {
        assert_eq!(WindowTime::Unix(42).to_string(), "42");
        assert_eq!(
            WindowTime::Isot("2024-03-01T12:34:56".into()).to_string(),
            "2024-03-01T12:34:56"
        );
        assert_eq!(WindowTime::DecimalYear(2024.123456789).to_string(), "2024.12346");
    }

    #[test]
    fn test_time_format_from_str() {
        assert_eq!("unix".parse::<TimeFormat>().unwrap(), TimeFormat::Unix);
        assert_eq!("ISOT".parse::<TimeFormat>().unwrap(), TimeFormat::Isot);
        assert_eq!(
            "decimalyear".parse::<TimeFormat>().unwrap(),
            TimeFormat::DecimalYear
        );
        assert!("mjd".parse::<TimeFormat>().is_err());
    }
}
