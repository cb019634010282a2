//! Filesystem rule catalog.
//!
//! Scans the configured directories of one rule repository, decodes each
//! matching file by extension, and extracts a [`RuleRecord`] per file.
//! Parse failures are reported per-file but do not abort the scan; a
//! repository name that cannot be located in a file path does, since it
//! means the supplied repository identifier and the directory layout
//! disagree.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_yaml::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use lofp_core::{LofpError, Result, RuleRecord, RuleSource, SourceConfig, GITHUB_URL_BASE};

use crate::extract::extract;

// ── Load result types ───────────────────────────────────────────────

/// Outcome of loading a single candidate file.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Path of the file as encountered on disk.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// File decoded and extracted into a rule.
    Loaded { rule_id: String },
    /// File was skipped (unsupported extension, unreadable).
    Skipped { reason: String },
    /// File matched but could not be decoded.
    Failed { error: String },
}

/// Result of one full catalog scan.
#[derive(Debug)]
pub struct CatalogLoad {
    /// Successfully extracted rules, in sorted path order.
    pub rules: Vec<RuleRecord>,
    /// Per-file outcomes, for reporting.
    pub outcomes: Vec<LoadOutcome>,
}

impl CatalogLoad {
    pub fn loaded_count(&self) -> usize {
        self.rules.len()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LoadStatus::Failed { .. }))
            .count()
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// Loader for the rules of one source repository/branch.
///
/// One catalog instance is bound to a single [`RuleSource`]; repositories
/// are never mixed within a load.
pub struct RuleCatalog {
    source: RuleSource,
    repo_url: String,
    repo_name: String,
    branch: String,
}

impl RuleCatalog {
    /// Create a catalog for an `owner/name` repository identifier.
    pub fn new(source: RuleSource, repo: &str, branch: &str) -> Self {
        let repo_name = repo.rsplit('/').next().unwrap_or(repo).to_string();
        Self {
            source,
            repo_url: format!("{}/{}", GITHUB_URL_BASE, repo),
            repo_name,
            branch: branch.to_string(),
        }
    }

    /// Web URL base of the repository this catalog loads from.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Scan per the source's configuration.
    pub fn load(&self, config: &SourceConfig) -> Result<CatalogLoad> {
        self.load_dirs(
            &config.directories,
            config.recursive_directories,
            &config.rule_glob_pattern,
        )
    }

    /// Scan the given directories for files matching `glob_pattern`.
    ///
    /// Files are parsed in parallel; results keep sorted path order, so
    /// output is identical to a sequential scan.
    pub fn load_dirs(
        &self,
        directories: &[PathBuf],
        recursive: bool,
        glob_pattern: &str,
    ) -> Result<CatalogLoad> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for dir in directories {
            let walker = if recursive {
                WalkDir::new(dir)
            } else {
                WalkDir::new(dir).max_depth(1)
            };
            for entry in walker.follow_links(true).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file()
                    && path
                        .file_name()
                        .and_then(OsStr::to_str)
                        .map(|name| glob_match(name, glob_pattern))
                        .unwrap_or(false)
                {
                    candidates.push(path.to_path_buf());
                }
            }
        }
        candidates.sort();

        let loaded: Vec<(LoadOutcome, Option<RuleRecord>)> = candidates
            .par_iter()
            .map(|path| self.load_file(path))
            .collect::<Result<Vec<_>>>()?;

        let mut rules = Vec::new();
        let mut outcomes = Vec::with_capacity(loaded.len());
        for (outcome, record) in loaded {
            rules.extend(record);
            outcomes.push(outcome);
        }

        info!(
            source = %self.source,
            loaded = rules.len(),
            scanned = outcomes.len(),
            "catalog scan complete"
        );
        Ok(CatalogLoad { rules, outcomes })
    }

    /// Load a single file.
    ///
    /// Only a failed repository-path resolution is fatal; everything else
    /// degrades to a skipped or failed outcome.
    fn load_file(&self, path: &Path) -> Result<(LoadOutcome, Option<RuleRecord>)> {
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
        if !matches!(ext, "json" | "toml" | "yaml" | "yml") {
            return Ok((
                LoadOutcome {
                    path: path.to_path_buf(),
                    status: LoadStatus::Skipped {
                        reason: format!("unsupported extension '{}'", ext),
                    },
                },
                None,
            ));
        }

        let relative = self.relative_to_repo(path)?;

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read rule file");
                return Ok((
                    LoadOutcome {
                        path: path.to_path_buf(),
                        status: LoadStatus::Skipped {
                            reason: format!("unreadable: {}", e),
                        },
                    },
                    None,
                ));
            }
        };

        match decode(ext, &raw) {
            Ok(value) => {
                let record = extract(self.source, &value, relative, &self.repo_url, &self.branch);
                debug!(path = %path.display(), rule_id = %record.id, "loaded rule");
                Ok((
                    LoadOutcome {
                        path: path.to_path_buf(),
                        status: LoadStatus::Loaded {
                            rule_id: record.id.clone(),
                        },
                    },
                    Some(record),
                ))
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to decode rule file");
                Ok((
                    LoadOutcome {
                        path: path.to_path_buf(),
                        status: LoadStatus::Failed { error },
                    },
                    None,
                ))
            }
        }
    }

    /// Path components after the repository-name segment of `path`.
    fn relative_to_repo(&self, path: &Path) -> Result<PathBuf> {
        let mut components = path.components();
        while let Some(component) = components.next() {
            if component.as_os_str() == OsStr::new(&self.repo_name) {
                return Ok(components.as_path().to_path_buf());
            }
        }
        Err(LofpError::RepoNotInPath {
            repo: self.repo_name.clone(),
            path: path.to_path_buf(),
        })
    }
}

/// Decode raw file content into a common value tree, by extension.
///
/// YAML is the common denominator: JSON parses directly as YAML, TOML
/// converts through serde.
fn decode(ext: &str, raw: &str) -> std::result::Result<Value, String> {
    match ext {
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        "toml" => toml::from_str::<toml::Value>(raw)
            .map_err(|e| e.to_string())
            .and_then(|v| serde_yaml::to_value(v).map_err(|e| e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        other => Err(format!("unsupported extension '{}'", other)),
    }
}

/// Match a file name against a shell-style pattern with `*` wildcards.
///
/// The corpus patterns are of the `*.toml` / `*.yml` shape; anything more
/// (character classes, `?`) is out of scope.
fn glob_match(name: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        None => name == pattern,
        Some((prefix, rest)) => {
            if !name.starts_with(prefix) {
                return false;
            }
            let name = &name[prefix.len()..];
            if rest.is_empty() {
                return true;
            }
            (0..=name.len())
                .filter(|&i| name.is_char_boundary(i))
                .any(|i| glob_match(&name[i..], rest))
        }
    }
}
