//! Run configuration loaded from a YAML file.
//!
//! One [`SourceConfig`] per rule source names the directories to scan, whether
//! to recurse, and the file glob pattern for that source's rule files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LofpError, Result};
use crate::source::RuleSource;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lofp.yml";

/// Per-source scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Rule directories to scan, relative to the checked-out repository.
    pub directories: Vec<PathBuf>,
    /// Whether to descend into subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive_directories: bool,
    /// File name pattern for rule files (e.g. `*.toml`).
    pub rule_glob_pattern: String,
}

fn default_recursive() -> bool {
    true
}

/// Full run configuration: one entry per supported rule source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub elastic: SourceConfig,
    pub sigma: SourceConfig,
    pub splunk: SourceConfig,
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// A missing or unreadable file is a fatal configuration error, not a
    /// recoverable one: without it there is nothing to scan.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = fs::read_to_string(path).map_err(|e| {
            LofpError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            LofpError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// The scan settings for one rule source.
    pub fn source(&self, source: RuleSource) -> &SourceConfig {
        match source {
            RuleSource::Elastic => &self.elastic,
            RuleSource::Sigma => &self.sigma,
            RuleSource::Splunk => &self.splunk,
        }
    }
}
