//! Tools for proposal-planning exports.
//!
//! - SQL exports: list tables and rebuild typed tables from insert rows
//! - Proposal archives: navigate and edit targets and observations
//! - Visit-planner results: decode guide-star scheduling windows

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod models;
pub mod parsing;
pub mod services;
pub mod time;
pub mod transformations;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::AptxConfig;
pub use error::{AptxError, AptxResult};
pub use models::{Observation, Proposal, Target};
pub use services::GuideStarWindowDecoder;
