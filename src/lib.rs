//! Descriptive and inferential statistics over sales datasets.
//!
//! The [`sales::SummaryEngine`] is a set of pure functions over an immutable
//! [`sales::Dataset`]; the CSV importer, configuration and telemetry modules
//! are the ambient pieces the CLI and HTTP shell wire around it.

pub mod config;
pub mod error;
pub mod sales;
pub mod telemetry;
