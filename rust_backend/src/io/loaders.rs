use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use crate::config::AptxConfig;
use crate::models::Proposal;
use crate::parsing::{pointing_parser, sql_parser, times_parser};
use crate::transformations::{materialize, Table};

/// Result of loading one table from an SQL export
#[derive(Debug)]
pub struct TableLoadResult {
    pub table_name: String,
    pub table: Table,
    pub num_rows: usize,
}

impl TableLoadResult {
    pub fn new(table_name: &str, table: Table) -> Self {
        let num_rows = table.height();
        Self {
            table_name: table_name.to_string(),
            table,
            num_rows,
        }
    }
}

/// Loads tables out of `.sql` exports
pub struct SqlExportLoader;

impl SqlExportLoader {
    /// Read an export into lines
    pub fn read_lines(path: &Path) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SQL export: {}", path.display()))?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// List the tables of an export, skipping the configured exclusions
    pub fn list_tables(path: &Path, config: &AptxConfig) -> Result<Vec<String>> {
        let lines = Self::read_lines(path)?;
        let tables = sql_parser::list_tables_excluding(&lines, &config.sql.excluded_tables);
        log::debug!("{} lists {} tables", path.display(), tables.len());
        Ok(tables.into_iter().collect())
    }

    /// Load one table from an export file
    pub fn load_table(path: &Path, table: &str) -> Result<TableLoadResult> {
        let lines = Self::read_lines(path)?;
        Self::load_table_from_lines(&lines, table)
            .with_context(|| format!("Failed to load table '{}' from {}", table, path.display()))
    }

    /// Load one table from export text
    pub fn load_table_from_str(content: &str, table: &str) -> Result<TableLoadResult> {
        Self::load_table_from_lines(content.lines(), table)
    }

    fn load_table_from_lines<I, S>(lines: I, table: &str) -> Result<TableLoadResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = sql_parser::rows_for(lines, table)?;
        let typed = materialize(&rows);
        for column in typed.columns() {
            log::debug!("{}.{}: {}", table, column.name, column.values.type_name());
        }
        Ok(TableLoadResult::new(table, typed))
    }

    /// Load one table straight into a DataFrame
    pub fn load_dataframe(path: &Path, table: &str) -> Result<DataFrame> {
        let result = Self::load_table(path, table)?;
        result
            .table
            .to_dataframe()
            .context("Failed to convert table to DataFrame")
    }
}

/// Loads `.aptx` proposal archives
pub struct ProposalLoader;

impl ProposalLoader {
    /// Read and parse a proposal archive
    pub fn load(path: &Path) -> Result<Proposal> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read proposal archive: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Archive path has no file name")?;

        Proposal::from_archive_bytes(name, &bytes)
            .with_context(|| format!("Failed to parse proposal archive: {}", path.display()))
    }

    /// Schema version of a proposal archive
    pub fn schema_version(path: &Path) -> Result<Option<String>> {
        Ok(Self::load(path)?.schema_version().map(str::to_string))
    }
}

/// Loads the planning tool's `.pointing` and `.times` reports
pub struct ReportLoader;

impl ReportLoader {
    /// Load a pointing report as a DataFrame
    pub fn load_pointing(path: &Path) -> Result<DataFrame> {
        let records = pointing_parser::parse_pointing_file(path)?;
        pointing_parser::pointings_to_dataframe(&records)
            .context("Failed to convert pointings to DataFrame")
    }

    /// Load a times report
    pub fn load_times(path: &Path) -> Result<times_parser::TimesReport> {
        times_parser::parse_times_file(path)
    }
}
