use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::domain::Row;

/// Filler for cells a row does not carry.
///
/// An empty string fails both integer and float coercion, so a column with
/// any missing cell always materializes as text.
pub const MISSING_CELL: &str = "";

/// Homogeneous values of one materialized column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValues::Integer(_) => "integer",
            ColumnValues::Float(_) => "float",
            ColumnValues::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedColumn {
    pub name: String,
    pub values: ColumnValues,
}

/// Typed table reconstructed from insert rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<TypedColumn>,
    height: usize,
}

impl Table {
    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Convert into a Polars DataFrame with Int64, Float64 and String columns.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| {
                let name: PlSmallStr = c.name.as_str().into();
                match &c.values {
                    ColumnValues::Integer(v) => Column::new(name, v),
                    ColumnValues::Float(v) => Column::new(name, v),
                    ColumnValues::Text(v) => Column::new(name, v),
                }
            })
            .collect();

        DataFrame::new(columns)
    }
}

/// Sorted union of the keys of all rows.
pub fn column_union(rows: &[Row]) -> BTreeSet<&str> {
    rows.iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect()
}

/// Build a typed table from rows that may carry different columns.
///
/// Every column holds one entry per row, with [`MISSING_CELL`] where a row
/// lacks the key, and is then coerced as a whole by [`coerce_column`].
pub fn materialize(rows: &[Row]) -> Table {
    let columns = column_union(rows)
        .into_iter()
        .map(|name| {
            let raw: Vec<&str> = rows
                .iter()
                .map(|row| row.get(name).map(String::as_str).unwrap_or(MISSING_CELL))
                .collect();
            coerce_column(name, &raw)
        })
        .collect();

    Table {
        columns,
        height: rows.len(),
    }
}

/// Coerce raw literals to integers, else floats, else quote-stripped text.
///
/// The tier applies to the whole column: a single value failing integer
/// parsing demotes every value to float, and so on.
pub fn coerce_column(name: &str, raw: &[&str]) -> TypedColumn {
    let values = if let Some(ints) = parse_all::<i64>(raw) {
        ColumnValues::Integer(ints)
    } else if let Some(floats) = parse_all::<f64>(raw) {
        ColumnValues::Float(floats)
    } else {
        ColumnValues::Text(raw.iter().map(|s| strip_quotes(s).to_string()).collect())
    };

    TypedColumn {
        name: name.to_string(),
        values,
    }
}

fn parse_all<T: std::str::FromStr>(raw: &[&str]) -> Option<Vec<T>> {
    raw.iter().map(|s| s.trim().parse::<T>().ok()).collect()
}

/// Remove one pair of surrounding single quotes.
pub fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
