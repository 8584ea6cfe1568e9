//! Row-to-table transformations.
//!
//! Parsed SQL rows are heterogeneous key/value maps; [`table`] unions their
//! columns, fills gaps and coerces each column to a single type.
//!
//! # Example
//!
//! ```
//! use aptx_rust::core::Row;
//! use aptx_rust::transformations::materialize;
//!
//! let mut row = Row::new();
//! row.insert("obs".to_string(), "1".to_string());
//! let table = materialize(&[row]);
//! assert_eq!(table.height(), 1);
//! ```

pub mod table;

pub use table::{coerce_column, column_union, materialize, ColumnValues, Table, TypedColumn, MISSING_CELL};
