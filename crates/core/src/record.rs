//! Normalized rule model.
//!
//! A [`RuleRecord`] is the uniform, immutable view over one raw rule file,
//! regardless of which source ecosystem it came from. Records are constructed
//! once by the catalog loader and only ever borrowed afterwards.

use std::path::PathBuf;

use crate::source::RuleSource;

/// A normalized detection rule plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRecord {
    /// Source ecosystem that defines this rule's file schema.
    pub source: RuleSource,
    /// Path relative to the rule repository root.
    pub path: PathBuf,
    /// Web URL base of the rule repository (e.g. `https://github.com/elastic/detection-rules`).
    pub repo_url: String,
    /// Branch used to build web-view links.
    pub branch: String,
    /// Rule identifier. Empty when the source file carries none.
    pub id: String,
    /// Human-readable rule name.
    pub name: String,
    /// Free-text rule description.
    pub description: String,
    /// ATT&CK technique ids in canonical `T####` / `T####.###` form.
    /// Whenever a sub-technique is present, its parent technique is too.
    pub techniques: Vec<String>,
    /// Normalized false-positive strings (lower-cased, whitespace-collapsed).
    pub false_positives: Vec<String>,
    /// Source-language detection expression, opaque text.
    pub logic: String,
    /// Lower-cased log/telemetry category the rule depends on. May be empty.
    pub data_source: String,
}

impl RuleRecord {
    /// Web-view link to the rule file on its source repository.
    pub fn link(&self) -> String {
        format!("{}/blob/{}/{}", self.repo_url, self.branch, self.path.display())
    }

    /// Inline icon image tag for the rule's source ecosystem.
    pub fn icon_link(&self) -> String {
        format!(
            "<img src=\"/icons/{}\" alt=\"{}\" title=\"{}\" width=\"20\" />",
            self.source.icon_asset(),
            self.source,
            self.source
        )
    }
}

/// Normalize a false-positive string: collapse runs of whitespace into single
/// spaces, trim, and lower-case. Idempotent.
pub fn normalize_fp(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Parent technique of a sub-technique id (`T1059.001` -> `T1059`).
///
/// Returns `None` when the id has no sub-technique suffix.
pub fn parent_technique(id: &str) -> Option<&str> {
    id.split_once('.').map(|(parent, _)| parent)
}

/// Append the parent of every sub-technique not already present, preserving
/// the existing order. Parents are appended in first-occurrence order of
/// their sub-techniques.
pub fn append_missing_parents(techniques: &mut Vec<String>) {
    let mut parents = Vec::new();
    for id in techniques.iter() {
        if let Some(parent) = parent_technique(id) {
            if !techniques.iter().any(|t| t == parent) && !parents.iter().any(|p| p == parent) {
                parents.push(parent.to_string());
            }
        }
    }
    techniques.extend(parents);
}
