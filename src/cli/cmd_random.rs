use anyhow::Result;
use clap::Args;

use super::utils::GlobalArgs;

#[derive(Args, Debug)]
#[command(
    about = "Output random DOIs sampled from the shards",
    long_about = "Sample random DOIs straight from the shard files, for generating lookup
traffic or spot-checking an index. Picks distinct shards at random, then
random DOIs within each picked shard. No index is needed.

Both counts saturate: asking for more shards than exist reads every shard,
and a shard with fewer DOIs than --per-shard contributes all of them. The
--seed flag makes the sample reproducible."
)]
pub struct RandomCommand {
    /// Number of shards to sample from
    #[arg(short = 's', long, default_value = "1")]
    pub shards: usize,

    /// DOIs to pick per sampled shard
    #[arg(short = 'n', long, default_value = "10")]
    pub per_shard: usize,

    /// Optional deterministic seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit JSON array instead of newline-delimited text
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: RandomCommand, globals: &GlobalArgs) -> Result<()> {
    let dois = crossref_index::random_dois(&globals.dir, cmd.shards, cmd.per_shard, cmd.seed)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&dois)?);
    } else {
        for doi in dois {
            println!("{}", doi);
        }
    }

    Ok(())
}
