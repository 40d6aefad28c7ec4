use anyhow::Result;
use clap::Args;
use crossref_index::format::{format_bytes, format_number};
use crossref_index::{ShardCodec, list_shards};
use serde_json::json;

use super::utils::{self, GlobalArgs};

#[derive(Args)]
#[command(
    about = "Show index statistics",
    long_about = "Summarize the dump directory and its index: shard count per compression
format, indexed DOIs and index file size. Use --json for machine-readable
output."
)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: StatsCommand, globals: &GlobalArgs) -> Result<()> {
    let shards = list_shards(&globals.dir)?;
    let gzip = shards.iter().filter(|s| s.codec == ShardCodec::Gzip).count();
    let zstd = shards.len() - gzip;

    let manager = utils::open_manager(globals)?;
    let stats = manager.stats();

    if cmd.json {
        let out = json!({
            "directory": globals.dir.display().to_string(),
            "index": manager.index_path().display().to_string(),
            "shards": shards.len(),
            "gzip_shards": gzip,
            "zstd_shards": zstd,
            "first_shard": shards.first().map(|s| s.id),
            "last_shard": shards.last().map(|s| s.id),
            "indexed_dois": stats.indexed_dois,
            "index_size_bytes": stats.index_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Directory:     {}", globals.dir.display());
    println!("Index:         {}", manager.index_path().display());
    println!(
        "Shards:        {} ({} gzip, {} zstd)",
        format_number(shards.len()),
        format_number(gzip),
        format_number(zstd)
    );
    if let (Some(first), Some(last)) = (shards.first(), shards.last()) {
        println!("Shard ids:     {} - {}", first.id, last.id);
    }
    println!("Indexed DOIs:  {}", format_number(stats.indexed_dois));
    println!("Index size:    {}", format_bytes(stats.index_size_bytes));

    Ok(())
}
