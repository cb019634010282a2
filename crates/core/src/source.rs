//! Rule source identification.
//!
//! Each supported ruleset ecosystem (elastic, sigma, splunk) defines its own
//! file schema. `RuleSource` is the closed set of those ecosystems; the
//! extraction layer dispatches on it exhaustively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LofpError;

/// Supported rule source ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    Elastic,
    Sigma,
    Splunk,
}

impl RuleSource {
    /// All sources, in the order they appear in configuration.
    pub const ALL: [RuleSource; 3] = [RuleSource::Elastic, RuleSource::Sigma, RuleSource::Splunk];

    /// Lowercase name used in tags, links, and config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSource::Elastic => "elastic",
            RuleSource::Sigma => "sigma",
            RuleSource::Splunk => "splunk",
        }
    }

    /// Fence label for the detection-logic code block in rendered markdown.
    ///
    /// Elastic and splunk queries highlight acceptably as SQL; sigma detection
    /// blocks are re-serialized YAML.
    pub fn code_fence(&self) -> &'static str {
        match self {
            RuleSource::Elastic | RuleSource::Splunk => "sql",
            RuleSource::Sigma => "yaml",
        }
    }

    /// Icon asset filename for this source, under the site's `icons/` dir.
    pub fn icon_asset(&self) -> &'static str {
        match self {
            RuleSource::Elastic => "elastic.jpeg",
            RuleSource::Sigma => "sigma.png",
            RuleSource::Splunk => "splunk.png",
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSource {
    type Err = LofpError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "elastic" => Ok(RuleSource::Elastic),
            "sigma" => Ok(RuleSource::Sigma),
            "splunk" => Ok(RuleSource::Splunk),
            other => Err(LofpError::UnknownSource(other.to_string())),
        }
    }
}
