//! Whitespace-separated field helpers shared by the report parsers.

use std::str::FromStr;

use crate::error::{AptxError, AptxResult};

/// True for report data lines: the first word is all ASCII digits.
pub(crate) fn is_data_line(words: &[&str]) -> bool {
    words
        .first()
        .map(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Parse `words[idx]` as `T`, naming the field in the error.
pub(crate) fn field<T: FromStr>(words: &[&str], idx: usize, name: &str, line: &str) -> AptxResult<T> {
    let raw = words.get(idx).ok_or_else(|| AptxError::MalformedExport {
        line: line.trim_end().to_string(),
        reason: format!("missing field '{}'", name),
    })?;

    raw.parse::<T>().map_err(|_| AptxError::MalformedExport {
        line: line.trim_end().to_string(),
        reason: format!("invalid value '{}' for field '{}'", raw, name),
    })
}

pub(crate) fn missing_header(line: &str, header: &str) -> AptxError {
    AptxError::MalformedExport {
        line: line.trim_end().to_string(),
        reason: format!("data line before any '{}' header", header),
    }
}
