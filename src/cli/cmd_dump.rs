use anyhow::{Context, Result};
use clap::{Args, ValueHint};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::utils::{self, GlobalArgs};

#[derive(Args)]
#[command(
    about = "Write the index as doi#shard lines",
    long_about = "Export every index entry as one 'doi#shard' line in DOI order. This is
the flat text format older tooling consumed; it is an export only and is
never read back.",
    help_template = crate::clap_help!(
        examples: "  # To stdout\n  \
                   {bin} dump | head\n\n  \
                   # To a file\n  \
                   {bin} dump -o crossref-metadata-index.txt"
    )
)]
pub struct DumpCommand {
    /// Output file (default: stdout)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: DumpCommand, globals: &GlobalArgs) -> Result<()> {
    let manager = utils::open_manager(globals)?;

    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let written = manager.dump(&mut out)?;
    log::info!("Wrote {} entries", written);

    Ok(())
}
