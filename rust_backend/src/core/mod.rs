//! Core domain records.
//!
//! This module defines the data structures shared by the export parsers and
//! the guide-star window decoder: loosely-typed insert rows and scheduling
//! windows.

pub mod domain;

pub use domain::{Row, SchedulingWindow};
