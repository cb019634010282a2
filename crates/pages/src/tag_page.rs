//! Tag index documents.
//!
//! Small cross-reference pages under `tags/<name>/_index.md`, one per
//! technique, rule source, and data source. Unlike false-positive pages
//! these carry no accumulated human content and are always fully
//! overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use lofp_core::{Result, RuleSource};

use crate::ATTACK_URL_BASE;

/// A rendered tag index page.
#[derive(Debug)]
pub struct TagPage {
    name: String,
    body: String,
}

impl TagPage {
    fn header(name: &str) -> String {
        format!("---\ntitle: \"{}\"\n---\n", name)
    }

    /// Index page for one ATT&CK technique.
    pub fn from_technique(id: &str) -> Self {
        let body = format!("{}\n> [{}]({}/{}/)", Self::header(id), id, ATTACK_URL_BASE, id);
        Self { name: id.to_string(), body }
    }

    /// Index page for one rule source ecosystem, linking its repository.
    pub fn from_rule_source(source: RuleSource, repo_url: &str) -> Self {
        let name = source.to_string();
        let body = format!("{}\n> [{}]({})", Self::header(&name), name, repo_url);
        Self { name, body }
    }

    /// Index page for one data source.
    pub fn from_data_source(data_source: &str) -> Self {
        let body = format!("{}\n> {} rule", Self::header(data_source), data_source);
        Self { name: data_source.to_string(), body }
    }

    /// Write under `<directory>/tags/<name>/_index.md`, overwriting.
    pub fn write(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join("tags").join(&self.name).join("_index.md");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &self.body)?;
        debug!(path = %path.display(), "wrote tag index");
        Ok(path)
    }
}
