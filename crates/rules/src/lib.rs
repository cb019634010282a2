//! Rule ingestion for the lofp documentation generator.
//!
//! This crate provides:
//! - Per-source field extraction (elastic, sigma, splunk) over a common
//!   decoded value tree
//! - A filesystem catalog that scans configured directories, decodes files
//!   by extension, and reports per-file outcomes
//!
//! One catalog loads one repository/branch; aggregation and rendering live
//! in `lofp-pages`.

pub mod catalog;
pub mod extract;

pub use catalog::{CatalogLoad, LoadOutcome, LoadStatus, RuleCatalog};
pub use extract::extract;
