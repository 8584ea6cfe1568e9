use qtty::Degrees;
use serde::Serialize;
use std::fmt;

use crate::error::{AptxError, AptxResult};

const RA_SECONDS_DECIMALS: usize = 3;
const DEC_SECONDS_DECIMALS: usize = 2;

/// Equatorial coordinates as stored in a target's `Value` attribute:
/// `"hh mm ss.sss ±dd mm ss.ss"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquatorialCoordinates {
    pub ra: Degrees,
    pub dec: Degrees,
    /// RA text exactly as written
    pub ra_text: String,
    /// Dec text exactly as written
    pub dec_text: String,
}

impl EquatorialCoordinates {
    /// Parse sexagesimal hour-angle RA followed by degree Dec.
    ///
    /// # Example
    /// ```
    /// use aptx_rust::models::EquatorialCoordinates;
    ///
    /// let c = EquatorialCoordinates::parse("05 35 17.300 -05 23 28.00").unwrap();
    /// assert!((c.ra.value() - 83.8220833).abs() < 1e-6);
    /// assert!((c.dec.value() + 5.3911111).abs() < 1e-6);
    /// ```
    pub fn parse(value: &str) -> AptxResult<Self> {
        let words: Vec<&str> = value.split_whitespace().collect();
        if words.len() != 6 {
            return Err(AptxError::Xml(format!(
                "coordinates '{}' must have 6 sexagesimal fields",
                value
            )));
        }

        let ra_hours = sexagesimal_value(&words[0..3], value)?;
        let dec_abs = sexagesimal_value(&words[3..6], value)?;
        let dec_sign = if words[3].starts_with('-') { -1.0 } else { 1.0 };

        if !(0.0..24.0).contains(&ra_hours) || dec_abs > 90.0 {
            return Err(AptxError::Xml(format!("coordinates '{}' out of range", value)));
        }

        Ok(Self {
            ra: Degrees::new(ra_hours * 15.0),
            dec: Degrees::new(dec_sign * dec_abs),
            ra_text: words[0..3].join(" "),
            dec_text: words[3..6].join(" "),
        })
    }

    /// Build from angles, rendering the sexagesimal text.
    pub fn from_degrees(ra: Degrees, dec: Degrees) -> Self {
        let hours = ra.value().rem_euclid(360.0) / 15.0;
        let sign = if dec.value() < 0.0 { "-" } else { "+" };

        let ra_text = format_sexagesimal(hours, RA_SECONDS_DECIMALS);
        let dec_text = format!(
            "{}{}",
            sign,
            format_sexagesimal(dec.value().abs(), DEC_SECONDS_DECIMALS)
        );

        Self {
            ra,
            dec,
            ra_text,
            dec_text,
        }
    }
}

impl fmt::Display for EquatorialCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ra_text, self.dec_text)
    }
}

/// `[whole, minutes, seconds]` to a decimal magnitude; the sign of the
/// first field is ignored.
fn sexagesimal_value(fields: &[&str], original: &str) -> AptxResult<f64> {
    let mut parsed = [0.0; 3];
    for (slot, raw) in parsed.iter_mut().zip(fields) {
        *slot = raw.parse::<f64>().map_err(|_| {
            AptxError::Xml(format!("invalid coordinate field '{}' in '{}'", raw, original))
        })?;
    }

    let [whole, minutes, seconds] = parsed;
    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(AptxError::Xml(format!("coordinates '{}' out of range", original)));
    }
    Ok(whole.abs() + minutes / 60.0 + seconds / 3600.0)
}

/// Render a non-negative magnitude as `dd mm ss.s…` with rounding carried
/// into minutes and the whole part.
fn format_sexagesimal(magnitude: f64, decimals: usize) -> String {
    let scale = 10_i64.pow(decimals as u32);
    let total = (magnitude * 3600.0 * scale as f64).round() as i64;

    let whole = total / (3600 * scale);
    let minutes = (total / (60 * scale)) % 60;
    let seconds = (total % (60 * scale)) as f64 / scale as f64;

    format!(
        "{:02} {:02} {:0width$.prec$}",
        whole,
        minutes,
        seconds,
        width = decimals + 3,
        prec = decimals
    )
}
