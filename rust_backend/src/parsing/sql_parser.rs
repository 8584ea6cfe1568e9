use std::collections::BTreeSet;

use crate::config::BOOKKEEPING_TABLE;
use crate::core::domain::Row;
use crate::error::{AptxError, AptxResult};

/// Every row statement in an export starts with this prefix.
pub const INSERT_PREFIX: &str = "insert into ";

const VALUES_KEYWORD: &str = "values";

/// List the distinct table names found in an SQL export, sorted.
///
/// The exporter's bookkeeping pseudo-table is left out.
///
/// # Example
/// ```
/// use aptx_rust::parsing::sql_parser::list_tables;
///
/// let lines = [
///     "insert into visits (a) values (1)",
///     "insert into exposures (a) values (1)",
/// ];
/// let tables: Vec<String> = list_tables(lines).into_iter().collect();
/// assert_eq!(tables, vec!["exposures", "visits"]);
/// ```
pub fn list_tables<I, S>(lines: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    list_tables_excluding(lines, &[BOOKKEEPING_TABLE.to_string()])
}

/// List the distinct table names, leaving out every name in `excluded`.
pub fn list_tables_excluding<I, S>(lines: I, excluded: &[String]) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| table_name(line.as_ref()).map(str::to_string))
        .filter(|name| !excluded.iter().any(|e| e == name))
        .collect()
}

/// Table name of an insert statement: the text between the prefix and the
/// first `(`, trimmed.
fn table_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(INSERT_PREFIX)?;
    let open = rest.find('(')?;
    let name = rest[..open].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parse every insert statement for `table` into a [`Row`].
///
/// Only lines starting with exactly `insert into <table> ` match. Fails with
/// [`AptxError::NoSuchTable`] when nothing matches and with
/// [`AptxError::MalformedRow`] on the first line whose column and value
/// counts disagree.
pub fn rows_for<I, S>(lines: I, table: &str) -> AptxResult<Vec<Row>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = format!("{}{} ", INSERT_PREFIX, table);
    let mut rows = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if let Some(rest) = line.strip_prefix(prefix.as_str()) {
            rows.push(parse_insert(table, line, rest)?);
        }
    }

    if rows.is_empty() {
        return Err(AptxError::NoSuchTable {
            table: table.to_string(),
        });
    }

    log::debug!("Parsed {} rows for table '{}'", rows.len(), table);
    Ok(rows)
}

/// Parse the `(<cols>) values (<vals>)` part of an insert statement.
///
/// Either clause may be bracketed instead of parenthesized.
///
/// `line` is the full statement, reported back on failure.
pub fn parse_insert(table: &str, line: &str, clauses: &str) -> AptxResult<Row> {
    let malformed = |reason: String| AptxError::MalformedRow {
        table: table.to_string(),
        line: line.trim_end().to_string(),
        reason,
    };

    let clauses = clauses.trim();
    let keyword = find_values_keyword(clauses)
        .ok_or_else(|| malformed("missing 'values' keyword".to_string()))?;
    let key_clause = &clauses[..keyword];
    let value_clause = clauses[keyword + VALUES_KEYWORD.len()..]
        .trim()
        .trim_end_matches(';')
        .trim_end();

    let keys_inner = strip_enclosing(key_clause.trim())
        .ok_or_else(|| malformed("column list is not parenthesized".to_string()))?;
    let values_inner = strip_enclosing(value_clause)
        .ok_or_else(|| malformed("value list is not parenthesized".to_string()))?;

    let keys = split_list(keys_inner);
    let values = split_list(values_inner);

    if keys.len() != values.len() {
        return Err(malformed(format!(
            "{} columns but {} values",
            keys.len(),
            values.len()
        )));
    }

    Ok(keys
        .into_iter()
        .map(str::to_string)
        .zip(values.into_iter().map(str::to_string))
        .collect())
}

/// Byte offset of the standalone `values` keyword, matched case-insensitively
/// outside single-quoted literals.
fn find_values_keyword(clauses: &str) -> Option<usize> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut in_quotes = false;

    for (i, ch) in clauses.char_indices() {
        if ch == '\'' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        let Some(candidate) = clauses.get(i..i + VALUES_KEYWORD.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(VALUES_KEYWORD) {
            continue;
        }
        let before = clauses[..i].chars().next_back();
        let after = clauses[i + VALUES_KEYWORD.len()..].chars().next();
        if !before.is_some_and(is_word) && !after.is_some_and(is_word) {
            return Some(i);
        }
    }
    None
}

/// Strip one pair of enclosing parentheses or brackets.
fn strip_enclosing(clause: &str) -> Option<&str> {
    clause
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| clause.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
}

/// Split a comma-separated list, keeping commas inside single-quoted literals.
fn split_list(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, ch) in inner.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(inner[start..].trim());

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(
            table_name("insert into  exposures (a,b) values (1,2)"),
            Some("exposures")
        );
        assert_eq!(table_name("insert into visits(a) values (1)"), Some("visits"));
        assert_eq!(table_name("select * from visits"), None);
        assert_eq!(table_name("insert into broken"), None);
    }

    #[test]
    fn test_split_list_quoted_commas() {
        assert_eq!(
            split_list("1, 'a, b' ,2.5"),
            vec!["1", "'a, b'", "2.5"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn test_find_values_keyword() {
        assert_eq!(find_values_keyword("[a] VALUES [1]"), Some(4));
        assert_eq!(find_values_keyword("(values_seen) values (1)"), Some(14));
        assert_eq!(find_values_keyword("(a) ('values')"), None);
        assert_eq!(find_values_keyword("(a, b"), None);
    }

    #[test]
    fn test_strip_enclosing() {
        assert_eq!(strip_enclosing("(a,b)"), Some("a,b"));
        assert_eq!(strip_enclosing("[a,b]"), Some("a,b"));
        assert_eq!(strip_enclosing("a,b"), None);
    }
}
