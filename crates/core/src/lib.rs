//! Shared model for the lofp documentation generator.
//!
//! Holds the pieces every other crate depends on: the [`RuleSource`] enum,
//! the normalized [`RuleRecord`] model, run configuration, and the crate-wide
//! error type.

pub mod config;
pub mod error;
pub mod record;
pub mod source;

pub use config::{Config, SourceConfig, DEFAULT_CONFIG_FILE};
pub use error::{LofpError, Result};
pub use record::{append_missing_parents, normalize_fp, parent_technique, RuleRecord};
pub use source::RuleSource;

/// Web URL base used to resolve `owner/name` repository identifiers.
pub const GITHUB_URL_BASE: &str = "https://github.com";
