mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lofp_core::Config;
use lofp_pages::PageWriter;
use lofp_rules::RuleCatalog;

use crate::cli::CliArgs;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = Config::from_file(&args.config).context("failed to load configuration")?;

    let source = args.command.source();
    let generate = args.command.generate_args();
    let source_config = config.source(source);

    // CLI directories override the config entry.
    let directories = if generate.directories.is_empty() {
        source_config.directories.clone()
    } else {
        generate.directories.clone()
    };

    let catalog = RuleCatalog::new(source, &generate.repo, &generate.branch);
    let load = catalog
        .load_dirs(
            &directories,
            source_config.recursive_directories,
            &source_config.rule_glob_pattern,
        )
        .with_context(|| format!("failed to load {} rules", source))?;

    let directory_list = directories
        .iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    info!(
        "{} rules loaded for {} from {}",
        load.loaded_count(),
        source,
        directory_list
    );
    if load.failed_count() > 0 {
        info!("{} files failed to decode and were skipped", load.failed_count());
    }

    let pages = PageWriter::new(&load.rules)
        .write_pages(&generate.write_dir)
        .context("failed to write pages")?;
    info!(
        "{} false-positive pages written to {}",
        pages,
        generate.write_dir.display()
    );

    Ok(())
}
