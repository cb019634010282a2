//! False-positive page rendering.
//!
//! One markdown document per unique false-positive string. A page that does
//! not exist yet is rendered fresh; an existing page is merged: the
//! technique list grows to the union of old and new, everything before the
//! `## Techniques` marker and everything from the `## Sample rules` marker
//! onward is kept verbatim, and the current run's rule blocks are appended.
//! Human edits to the header and to prior rule blocks survive regeneration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use lofp_core::{Result, RuleRecord};

use crate::aggregate::AggregationEntry;
use crate::ATTACK_URL_BASE;

const TECHNIQUES_MARKER: &str = "## Techniques";
const RULES_MARKER: &str = "## Sample rules";

/// Front matter of a false-positive page.
#[derive(Serialize)]
struct FrontMatter {
    title: String,
    description: String,
    tags: Vec<String>,
}

/// One false-positive page, bound to its target path.
pub struct FpPage<'a> {
    false_positive: &'a str,
    entry: &'a AggregationEntry<'a>,
    path: PathBuf,
}

impl<'a> FpPage<'a> {
    pub fn new(false_positive: &'a str, entry: &'a AggregationEntry<'a>, directory: &Path) -> Self {
        let path = directory.join(format!("{}.md", clean_filename(false_positive)));
        Self { false_positive, entry, path }
    }

    /// Target path derived from the sanitized false-positive string.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render and write the page, merging when the target already exists.
    pub fn write(&self) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = if self.path.exists() {
            self.render_merged(&fs::read_to_string(&self.path)?)
        } else {
            self.render_fresh()
        };
        fs::write(&self.path, body)?;
        debug!(path = %self.path.display(), "wrote false-positive page");
        Ok(self.path.clone())
    }

    /// Full document for a page that does not exist yet.
    fn render_fresh(&self) -> String {
        let front = FrontMatter {
            title: self.false_positive.replace('"', "\\\""),
            description: String::new(),
            tags: self.tags(),
        };
        let dumped = serde_yaml::to_string(&front).unwrap_or_default();

        let mut lines: Vec<String> = vec!["---".to_string()];
        lines.extend(dumped.lines().map(str::to_string));
        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(TECHNIQUES_MARKER.to_string());
        lines.push(String::new());
        lines.extend(self.entry.techniques.iter().map(|t| technique_link(t)));
        lines.push(String::new());
        lines.push(RULES_MARKER.to_string());
        lines.push(String::new());
        lines.extend(self.entry.rules.iter().map(|r| rule_block(r)));
        lines.join("\n")
    }

    /// Merge the current aggregation entry into an existing document.
    fn render_merged(&self, existing: &str) -> String {
        let existing_lines: Vec<&str> = existing.lines().collect();
        let start = existing_lines.iter().position(|l| l.starts_with(TECHNIQUES_MARKER));
        let end = existing_lines.iter().position(|l| l.starts_with(RULES_MARKER));
        let (Some(start), Some(end)) = (start, end) else {
            warn!(
                path = %self.path.display(),
                "existing page has no techniques/sample-rules markers, re-rendering fresh"
            );
            return self.render_fresh();
        };

        let mut techniques: BTreeSet<String> =
            existing_techniques(&existing_lines[start..end]).collect();
        techniques.extend(self.entry.techniques.iter().cloned());

        let mut lines: Vec<String> =
            existing_lines[..start].iter().map(|l| l.to_string()).collect();
        lines.push(TECHNIQUES_MARKER.to_string());
        lines.push(String::new());
        lines.extend(techniques.iter().map(|t| technique_link(t)));
        lines.push(String::new());
        lines.extend(existing_lines[end..].iter().map(|l| l.to_string()));
        lines.push(String::new());
        lines.extend(self.entry.rules.iter().map(|r| rule_block(r)));
        lines.join("\n")
    }

    /// Front-matter tags: techniques, then each contributing rule's data
    /// source and source name, deduplicated in first-seen order.
    fn tags(&self) -> Vec<String> {
        let mut tags = self.entry.techniques.clone();
        for rule in &self.entry.rules {
            if !rule.data_source.is_empty() && !tags.contains(&rule.data_source) {
                tags.push(rule.data_source.clone());
            }
        }
        for rule in &self.entry.rules {
            let source = rule.source.to_string();
            if !tags.contains(&source) {
                tags.push(source);
            }
        }
        tags
    }
}

/// Technique ids previously listed between the two section markers.
fn existing_techniques<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
    lines
        .iter()
        .filter_map(|l| l.strip_prefix("- ["))
        .filter_map(|l| l.split(']').next())
        .map(str::to_string)
}

/// Markdown list line linking a technique to its ATT&CK reference page.
///
/// Sub-technique ids become nested URL segments (`T1059.001` ->
/// `.../T1059/001/`).
fn technique_link(id: &str) -> String {
    format!("- [{}]({}/{}/)", id, ATTACK_URL_BASE, id.replace('.', "/"))
}

/// Derive a page file name from a false-positive string.
///
/// Keeps only lowercase ASCII letters and spaces, truncates to the first 75
/// surviving characters, then hyphen-joins the words. Distinct strings can
/// collapse to the same name; the later page wins silently.
pub fn clean_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == ' ')
        .take(75)
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-").replace('\\', "")
}

/// Full markdown block for one sample rule.
pub fn rule_block(rule: &RuleRecord) -> String {
    let mut lines = vec![
        format!("### {}", rule.name),
        String::new(),
        rule.icon_link(),
        format!("* **source**: [{}]({})", rule.source, rule.link()),
        "* **techniques**:".to_string(),
    ];
    lines.extend(rule.techniques.iter().map(|t| format!("  - {}", t)));
    lines.push(String::new());
    lines.push("#### Description".to_string());
    lines.push(String::new());
    lines.push(rule.description.clone());
    lines.push(String::new());
    lines.push("#### Detection logic".to_string());
    lines.push(String::new());
    lines.push(format!("```{}", rule.source.code_fence()));
    lines.push(rule.logic.clone());
    lines.push("```".to_string());
    lines.push(String::new());
    lines.join("\n")
}
