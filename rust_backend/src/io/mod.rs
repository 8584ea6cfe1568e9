//! File loaders.
//!
//! Loaders read export files and archives from disk, run the matching parser
//! and attach file context to any failure.
//!
//! # Example
//!
//! ```no_run
//! use aptx_rust::io::loaders::SqlExportLoader;
//! use std::path::Path;
//!
//! let result = SqlExportLoader::load_table(Path::new("1234.sql"), "exposures")
//!     .expect("Failed to load");
//! println!("Loaded {} rows", result.num_rows);
//! ```

pub mod loaders;


pub use loaders::{ProposalLoader, ReportLoader, SqlExportLoader, TableLoadResult};
