use anyhow::Result;
use clap::Args;
use crossref_index::format::format_duration_ms;

use super::utils::{self, GlobalArgs};

#[derive(Args)]
#[command(
    about = "Print the record for a DOI",
    long_about = "Look up one or more DOIs in the index and print each record as JSON.
Every lookup decompresses the whole shard holding the DOI, so expect the
time of one shard read per DOI.

Use --stats to print on stderr which shard was read and how long the index
probe and the shard read took.",
    help_template = crate::clap_help!(
        examples: "  # Pretty-printed record\n  \
                   {bin} lookup 10.1103/physrevb.80.125416\n\n  \
                   # Several DOIs, one JSON line each\n  \
                   {bin} lookup --compact 10.1/a 10.1/b\n\n  \
                   # With timing\n  \
                   {bin} lookup --stats 10.1103/physrevb.80.125416"
    )
)]
pub struct LookupCommand {
    /// DOIs to look up
    #[arg(required = true)]
    pub dois: Vec<String>,

    /// One JSON object per line instead of pretty output
    #[arg(long)]
    pub compact: bool,

    /// Print lookup timing to stderr
    #[arg(long)]
    pub stats: bool,
}

pub fn run(cmd: LookupCommand, globals: &GlobalArgs) -> Result<()> {
    let manager = utils::open_manager(globals)?;
    let mut failures = 0usize;

    for doi in &cmd.dois {
        let result = match manager.lookup_with_stats(doi) {
            Ok(result) => result,
            Err(e) if e.is_not_found() => {
                eprintln!("{}", e);
                failures += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if cmd.compact {
            println!("{}", serde_json::to_string(&result.record)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&result.record)?);
        }

        if cmd.stats {
            eprintln!(
                "  shard {} | index {} | load {} | total {} | scanned {}/{}",
                result.shard_id,
                format_duration_ms(result.index_time),
                format_duration_ms(result.load_time),
                format_duration_ms(result.total_time),
                result.records_scanned,
                result.shard_records
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} DOIs not found", failures, cmd.dois.len());
    }

    Ok(())
}
