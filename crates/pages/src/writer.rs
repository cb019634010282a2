//! One full generation pass over a loaded rule set.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use lofp_core::{Result, RuleRecord, RuleSource};

use crate::aggregate::aggregate;
use crate::fp_page::FpPage;
use crate::tag_page::TagPage;

/// Aggregates rules and writes every false-positive page and tag index
/// under the target content directory.
pub struct PageWriter<'a> {
    rules: &'a [RuleRecord],
}

impl<'a> PageWriter<'a> {
    pub fn new(rules: &'a [RuleRecord]) -> Self {
        Self { rules }
    }

    /// Write all pages; returns the number of false-positive pages written.
    pub fn write_pages(&self, directory: &Path) -> Result<usize> {
        let (groups, techniques) = aggregate(self.rules);

        let mut paths_seen: HashMap<PathBuf, &str> = HashMap::new();
        for (fp, entry) in &groups {
            let page = FpPage::new(fp, entry, directory);
            if let Some(previous) = paths_seen.insert(page.path().to_path_buf(), fp.as_str()) {
                warn!(
                    path = %page.path().display(),
                    previous = %previous,
                    current = %fp,
                    "false-positive strings collide on filename, last render wins"
                );
            }
            page.write()?;
        }

        for technique in &techniques {
            TagPage::from_technique(technique).write(directory)?;
        }

        // One catalog load carries a single source, but nothing here depends
        // on that; keyed by source so merged rule sets also render.
        let mut sources: IndexMap<RuleSource, &str> = IndexMap::new();
        let mut data_sources: BTreeSet<&str> = BTreeSet::new();
        for rule in self.rules {
            sources.entry(rule.source).or_insert(rule.repo_url.as_str());
            if !rule.data_source.is_empty() {
                data_sources.insert(rule.data_source.as_str());
            }
        }
        for (source, repo_url) in &sources {
            TagPage::from_rule_source(*source, repo_url).write(directory)?;
        }
        for data_source in &data_sources {
            TagPage::from_data_source(data_source).write(directory)?;
        }

        info!(
            pages = groups.len(),
            techniques = techniques.len(),
            data_sources = data_sources.len(),
            "generation pass complete"
        );
        Ok(groups.len())
    }
}
