//! Aggregation and markdown generation for the lofp documentation generator.
//!
//! Takes the normalized rule set a catalog produced, groups it by
//! false-positive string, and writes the site content: one mergeable page
//! per false positive plus overwrite-only tag indexes.

pub mod aggregate;
pub mod fp_page;
pub mod tag_page;
pub mod writer;

pub use aggregate::{aggregate, AggregationEntry};
pub use fp_page::{clean_filename, FpPage};
pub use tag_page::TagPage;
pub use writer::PageWriter;

/// ATT&CK technique reference URL base.
pub const ATTACK_URL_BASE: &str = "https://attack.mitre.org/techniques";
