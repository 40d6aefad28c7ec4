// Shared helpers for CLI commands

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use crossref_index::{DuplicatePolicy, MetadataManager, Options, OptionsBuilder, constants};
use std::path::PathBuf;

/// Flags shared by every command
pub struct GlobalArgs {
    pub dir: PathBuf,
    pub index_file: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    /// Keep the identifier's highest shard id
    Last,
    /// Keep the identifier's lowest shard id
    First,
}

impl From<PolicyArg> for DuplicatePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Last => DuplicatePolicy::LastShardWins,
            PolicyArg::First => DuplicatePolicy::FirstShardWins,
        }
    }
}

/// Options for commands that may build the index
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Number of worker threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0", help_heading = "Build Options")]
    pub threads: usize,

    /// Entries buffered before writing a sorted run (0 = only at the end)
    #[arg(long, default_value_t = constants::DEFAULT_FLUSH_INTERVAL, help_heading = "Build Options")]
    pub flush_interval: usize,

    /// Which shard keeps a DOI that appears in several shards
    #[arg(long, value_enum, default_value = "last", help_heading = "Build Options")]
    pub duplicates: PolicyArg,
}

pub fn options(globals: &GlobalArgs, build: Option<&BuildArgs>) -> Options {
    let mut builder = OptionsBuilder::new().directory(globals.dir.clone());
    if let Some(path) = &globals.index_file {
        builder = builder.index_file(path.clone());
    }
    if let Some(build) = build {
        builder = builder
            .num_threads(build.threads)
            .flush_interval(build.flush_interval)
            .duplicate_policy(build.duplicates.into());
    }
    builder.build()
}

/// Open an existing index; never builds
pub fn open_manager(globals: &GlobalArgs) -> Result<MetadataManager> {
    let options = options(globals, None);
    let index_path = options.index_path();
    if !MetadataManager::index_exists(&options) {
        anyhow::bail!(
            "No index at {}. Run '{} build' first",
            index_path.display(),
            constants::BINARY_NAME
        );
    }
    MetadataManager::open(options)
        .with_context(|| format!("Failed to open index {}", index_path.display()))
}
