//! Random DOI sampling for test and benchmark traffic
use crate::catalog::{self, ShardRef};
use crate::error::Result;
use crate::shard;
use rand::seq::index;
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Pick `shard_count` distinct shards, then up to `per_shard` DOIs from each
///
/// Both counts saturate: asking for more shards than the corpus holds reads
/// every shard, and a shard with fewer than `per_shard` DOIs contributes all
/// of them. The same `seed` over the same corpus yields the same sample.
pub fn random_dois(
    root: &Path,
    shard_count: usize,
    per_shard: usize,
    seed: Option<u64>,
) -> Result<Vec<String>> {
    let start = Instant::now();
    let shards = catalog::list_shards(root)?;

    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let take = shard_count.min(shards.len());
    let selected: Vec<&ShardRef> = index::sample(&mut rng, shards.len(), take)
        .into_iter()
        .map(|i| &shards[i])
        .collect();

    // Shards are read in parallel; picking stays sequential so a seed is reproducible
    let candidates: Vec<Vec<String>> = selected
        .par_iter()
        .map(|shard_ref| {
            shard::read_shard_ref(shard_ref).map(|records| {
                records
                    .into_iter()
                    .filter(|r| r.has_identifier())
                    .map(|r| r.doi)
                    .collect::<Vec<String>>()
            })
        })
        .collect::<Result<_>>()?;

    let mut dois = Vec::new();
    for mut shard_dois in candidates {
        if shard_dois.len() <= per_shard {
            dois.append(&mut shard_dois);
            continue;
        }

        let picked = index::sample(&mut rng, shard_dois.len(), per_shard);
        dois.extend(picked.into_iter().map(|i| std::mem::take(&mut shard_dois[i])));
    }

    log::debug!(
        "[Sample] {} DOIs from {} of {} shards in {:.1}ms",
        dois.len(),
        take,
        shards.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(dois)
}
