use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use crossref_index::constants;
use std::path::PathBuf;

// CLI Commands (cmd_ prefix)
mod cmd_build;
mod cmd_dump;
mod cmd_lookup;
mod cmd_random;
mod cmd_server;
mod cmd_stats;

// Helper modules (no cmd_ prefix)
mod logger;
mod progress;
mod utils;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format custom help template with grouped commands
fn format_help_template() -> &'static str {
    concat!(
        "{about-with-newline}\n\n",
        "{usage-heading}\n  {usage}\n\n",
        "Options:\n{options}\n\n",
        "Index:\n",
        "  build     Build the DOI index for a dump directory\n",
        "  stats     Show index statistics\n",
        "  dump      Write the index as doi#shard lines\n",
        "\n",
        "Lookups:\n",
        "  lookup    Print the record for a DOI\n",
        "  random    Output random DOIs sampled from the shards\n",
        "\n",
        "Server:\n",
        "  serve     Start the HTTP lookup server\n",
        "\n",
        "See 'crossref-index <COMMAND> --help' for more information on a specific command.\n"
    )
}

#[derive(Parser)]
#[command(bin_name = "crossref-index")]
#[command(version = VERSION)]
#[command(about = concat!("crossref-index v", env!("CARGO_PKG_VERSION"), " - DOI lookups over Crossref metadata dumps"))]
#[command(long_about = concat!(
    "crossref-index v", env!("CARGO_PKG_VERSION"), " - DOI lookups over Crossref metadata dumps\n\n",
    "Indexes a directory of compressed Crossref shards (<id>.json.gz or\n",
    "<id>.json.zst) by DOI, then answers lookups by decompressing only\n",
    "the shard that holds the requested record."
))]
#[command(author)]
#[command(propagate_version = true)]
#[command(help_template = format_help_template())]
pub struct Cli {
    /// Dump directory containing the shard files
    #[arg(short = 'C', long = "dir", global = true, env = constants::DUMP_PATH_ENV, default_value = constants::DEFAULT_DUMP_PATH, value_hint = ValueHint::DirPath)]
    dir: PathBuf,

    /// Index file (default: <dir>/crossref-metadata-index.idx)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    index_file: Option<PathBuf>,

    /// Suppress progress output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Build(cmd_build::BuildCommand),
    Lookup(cmd_lookup::LookupCommand),
    Random(cmd_random::RandomCommand),
    Serve(cmd_server::ServerCommand),
    Stats(cmd_stats::StatsCommand),
    Dump(cmd_dump::DumpCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose, cli.quiet);

    let globals = utils::GlobalArgs {
        dir: cli.dir,
        index_file: cli.index_file,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Build(cmd) => cmd_build::run(cmd, &globals)?,
        Commands::Lookup(cmd) => cmd_lookup::run(cmd, &globals)?,
        Commands::Random(cmd) => cmd_random::run(cmd, &globals)?,
        Commands::Serve(cmd) => cmd_server::run(cmd, &globals)?,
        Commands::Stats(cmd) => cmd_stats::run(cmd, &globals)?,
        Commands::Dump(cmd) => cmd_dump::run(cmd, &globals)?,
    }

    Ok(())
}

/// Macro to create clap help templates with examples
/// This works around the limitation that {bin} doesn't work in after_help
#[macro_export]
macro_rules! clap_help {
    (examples: $examples:literal) => {{
        const BIN: &str = env!("CARGO_PKG_NAME");
        concat!(
            "{about-with-newline}\n",
            "{usage-heading} {usage}\n\n",
            "{all-args}\n\n",
            "Examples:\n",
            $examples
        ).replace("{bin}", BIN)
    }};
}
