use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lofp_core::{RuleSource, DEFAULT_CONFIG_FILE};

/// Living off the False Positives page generator.
///
/// Loads a detection-rules checkout, groups the rules by the false
/// positives they declare, and renders one markdown page per unique
/// false-positive string plus tag indexes.
#[derive(Parser, Debug)]
#[command(name = "lofp", about = "Generate false-positive pages from detection-rule repos")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the YAML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// One subcommand per rule source.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process an elastic detection-rules checkout
    Elastic(GenerateArgs),
    /// Process a sigma rules checkout
    Sigma(GenerateArgs),
    /// Process a splunk security-content checkout
    Splunk(GenerateArgs),
}

impl Command {
    pub fn source(&self) -> RuleSource {
        match self {
            Command::Elastic(_) => RuleSource::Elastic,
            Command::Sigma(_) => RuleSource::Sigma,
            Command::Splunk(_) => RuleSource::Splunk,
        }
    }

    pub fn generate_args(&self) -> &GenerateArgs {
        match self {
            Command::Elastic(args) | Command::Sigma(args) | Command::Splunk(args) => args,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Repository identifier, `owner/name` style
    pub repo: String,

    /// Branch used to build web-view links
    pub branch: String,

    /// Rule directories to scan (default: the config entry for this source)
    #[arg(long, short = 'd')]
    pub directories: Vec<PathBuf>,

    /// Directory to write the generated pages to
    #[arg(long, short = 'w', default_value = "docs/content")]
    pub write_dir: PathBuf,
}
