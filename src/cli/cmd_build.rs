// Build command - scan all shards and write the DOI index
use anyhow::{Context, Result};
use clap::Args;
use crossref_index::{MetadataManager, build_index};
use crossref_index::format::{format_bytes, format_duration_auto, format_number};

use super::progress::ProgressBar;
use super::utils::{self, BuildArgs, GlobalArgs};

#[derive(Args)]
#[command(
    about = "Build the DOI index for a dump directory",
    long_about = "Scan every shard of the dump directory in parallel and write a sorted
DOI → shard index next to it. Lookups then decompress only the shard that
holds the requested DOI.

Building is skipped when an index already exists; use --force to rebuild,
for example after shards were added or replaced. The previous index stays
in place until the new one is complete, and a failing shard leaves no
index behind.",
    help_template = crate::clap_help!(
        examples: "  # Build with one worker per CPU\n  \
                   {bin} build -C /data/crossref\n\n  \
                   # Rebuild with 8 workers\n  \
                   {bin} build -C /data/crossref --force -j 8\n\n  \
                   # Keep the first shard of duplicated DOIs\n  \
                   {bin} build --duplicates first"
    )
)]
pub struct BuildCommand {
    /// Rebuild even if an index exists
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub build: BuildArgs,
}

pub fn run(cmd: BuildCommand, globals: &GlobalArgs) -> Result<()> {
    let options = utils::options(globals, Some(&cmd.build));
    let index_path = options.index_path();

    if MetadataManager::index_exists(&options) && !cmd.force {
        eprintln!(
            "Index already exists at {} (use --force to rebuild)",
            index_path.display()
        );
        return Ok(());
    }

    let progress = ProgressBar::new(globals.quiet);
    let result = build_index(&options, Some(progress.callback()));
    progress.finish();

    let stats = result.with_context(|| {
        format!(
            "Failed to build index for {}",
            options.directory.display()
        )
    })?;

    if !globals.quiet {
        eprintln!("✓ Index written to {}", index_path.display());
        eprintln!("  Shards:        {}", format_number(stats.shards));
        eprintln!("  Workers:       {}", stats.workers);
        eprintln!("  Records:       {}", format_number(stats.records));
        eprintln!("  DOIs:          {}", format_number(stats.unique_entries));
        eprintln!("  Without DOI:   {}", format_number(stats.skipped_empty));
        if stats.duplicates > 0 {
            eprintln!("  Duplicates:    {}", format_number(stats.duplicates));
        }
        eprintln!("  Sorted runs:   {}", stats.flushes);
        eprintln!("  Index size:    {}", format_bytes(stats.index_bytes));
        eprintln!("  Time:          {}", format_duration_auto(stats.elapsed));
    }

    Ok(())
}
