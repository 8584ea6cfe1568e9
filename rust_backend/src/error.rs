//! Error types for export parsing, proposal access and guide-star decoding.

use polars::prelude::PolarsError;

/// Result type for library operations
pub type AptxResult<T> = Result<T, AptxError>;

/// Error type for library operations
#[derive(Debug, thiserror::Error)]
pub enum AptxError {
    #[error("'{table}' table data not found")]
    NoSuchTable { table: String },

    #[error("Malformed insert row for table '{table}' ({reason}): {line}")]
    MalformedRow {
        table: String,
        line: String,
        reason: String,
    },

    #[error("Proposal has no {kind} {number}")]
    NoSuchEntity { kind: &'static str, number: String },

    #[error("Observation {observation} is not up to date. Run visit planner.")]
    StaleVisitPlanner { observation: String },

    #[error("Malformed scheduling PCF for observation {observation} visit {visit}: {reason}")]
    MalformedPcf {
        observation: String,
        visit: String,
        reason: String,
    },

    #[error("Observation {observation} has no visit planner data")]
    NoVisitPlannerData { observation: String },

    #[error("Malformed export line ({reason}): {line}")]
    MalformedExport { line: String, reason: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table conversion error: {0}")]
    Polars(#[from] PolarsError),
}

impl From<quick_xml::Error> for AptxError {
    fn from(e: quick_xml::Error) -> Self {
        AptxError::Xml(e.to_string())
    }
}

impl From<zip::result::ZipError> for AptxError {
    fn from(e: zip::result::ZipError) -> Self {
        AptxError::Archive(e.to_string())
    }
}
