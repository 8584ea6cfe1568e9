//! Parsers for the text formats exported by the proposal tool.
//!
//! # Parsers
//!
//! - [`sql_parser`]: Pull per-table rows out of an `.sql` export
//! - [`pcf_parser`]: Decode scheduling PCF token streams into windows
//! - [`pointing_parser`]: Parse `.pointing` exposure pointing reports
//! - [`times_parser`]: Parse `.times` overhead reports
//!
//! # Example
//!
//! ```no_run
//! use aptx_rust::parsing::sql_parser::rows_for;
//!
//! let export = std::fs::read_to_string("1234.sql").expect("Failed to read export");
//! let rows = rows_for(export.lines(), "exposures").expect("Failed to parse rows");
//! ```

pub mod pcf_parser;
pub mod pointing_parser;
pub mod sql_parser;
pub mod times_parser;

mod fields;

#[cfg(test)]
mod sql_parser_tests;

pub use pcf_parser::{decode_pcf, WindowAccumulator};
pub use sql_parser::{list_tables, list_tables_excluding, rows_for};
