//! Configuration file support.
//!
//! Settings are read from an `aptx.toml` file. Every section is optional and
//! falls back to the defaults used by the exporting tool's own output.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AptxError, AptxResult};
use crate::time::TimeFormat;

/// Pseudo-table the exporter writes for its own bookkeeping; never row data.
pub const BOOKKEEPING_TABLE: &str = "ppsdb_bookkeeping";

/// Constraint type of the guide-star windows inside a visit planner result.
pub const GUIDE_STAR_CONSTRAINT: &str = "guide-star";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AptxConfig {
    #[serde(default)]
    pub sql: SqlSettings,
    #[serde(default)]
    pub guide_star: GuideStarSettings,
}

/// SQL export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlSettings {
    #[serde(default = "default_excluded_tables")]
    pub excluded_tables: Vec<String>,
}

/// Guide-star window decoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideStarSettings {
    #[serde(default = "default_constraint_type")]
    pub constraint_type: String,
    #[serde(default)]
    pub time_format: TimeFormat,
}

fn default_excluded_tables() -> Vec<String> {
    vec![BOOKKEEPING_TABLE.to_string()]
}

fn default_constraint_type() -> String {
    GUIDE_STAR_CONSTRAINT.to_string()
}

impl Default for SqlSettings {
    fn default() -> Self {
        Self {
            excluded_tables: default_excluded_tables(),
        }
    }
}

impl Default for GuideStarSettings {
    fn default() -> Self {
        Self {
            constraint_type: default_constraint_type(),
            time_format: TimeFormat::default(),
        }
    }
}

impl AptxConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AptxConfig)` if successful
    /// * `Err(AptxError::ConfigurationError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> AptxResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AptxError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> AptxResult<Self> {
        toml::from_str(content).map_err(|e| {
            AptxError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `aptx.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    ///
    /// Returns the defaults when no file is found.
    pub fn from_default_location() -> AptxResult<Self> {
        let search_paths = [
            PathBuf::from("aptx.toml"),
            PathBuf::from("rust_backend/aptx.toml"),
            PathBuf::from("../aptx.toml"),
        ];

        for path in search_paths.iter() {
            if path.exists() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn load(path: Option<&Path>) -> AptxResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::from_default_location(),
        }
    }

    /// Returns true when `table` is excluded from table listings.
    pub fn is_excluded_table(&self, table: &str) -> bool {
        self.sql.excluded_tables.iter().any(|t| t == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AptxConfig::default();
        assert!(config.is_excluded_table(BOOKKEEPING_TABLE));
        assert_eq!(config.guide_star.constraint_type, "guide-star");
        assert_eq!(config.guide_star.time_format, TimeFormat::Unix);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AptxConfig::from_toml_str(
            r#"
            [guide_star]
            time_format = "isot"
            "#,
        )
        .unwrap();

        assert_eq!(config.guide_star.time_format, TimeFormat::Isot);
        assert_eq!(config.guide_star.constraint_type, "guide-star");
        assert_eq!(config.sql.excluded_tables, vec![BOOKKEEPING_TABLE.to_string()]);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[sql]\nexcluded_tables = [\"scratch\", \"audit\"]").unwrap();

        let config = AptxConfig::from_file(file.path()).unwrap();
        assert!(config.is_excluded_table("audit"));
        assert!(!config.is_excluded_table(BOOKKEEPING_TABLE));
    }

    #[test]
    fn test_invalid_file() {
        let result = AptxConfig::from_toml_str("[guide_star]\ntime_format = \"jd\"");
        assert!(matches!(result, Err(AptxError::ConfigurationError(_))));
    }
}
