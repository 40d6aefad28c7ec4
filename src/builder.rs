//! Parallel index construction
//!
//! The shard list is cut into contiguous blocks, one per worker. Workers
//! decode their shards and send the identifiers to a single coordinator, which
//! performs every write to the index store. The first worker error cancels the
//! remaining workers and discards everything written so far.
use crate::catalog::{self, ShardRef};
use crate::error::{IndexError, Result};
use crate::options::{DuplicatePolicy, Options};
use crate::shard;
use crate::store::{IndexWriter, Resolver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::time::{Duration, Instant};

/// Outcome of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub shards: usize,
    pub workers: usize,
    pub records: u64,
    /// Identifiers sent to the store, duplicates included
    pub entries_emitted: u64,
    /// Records skipped for having no identifier
    pub skipped_empty: u64,
    /// Identifiers that appeared in more than one place
    pub duplicates: u64,
    /// Entries in the committed index
    pub unique_entries: u64,
    pub flushes: usize,
    pub index_bytes: u64,
    pub elapsed: Duration,
}

enum WorkerMessage {
    Shard {
        shard_id: u64,
        dois: Vec<String>,
        records: usize,
        skipped: usize,
    },
    Failed(IndexError),
}

#[derive(Default)]
struct Counters {
    shards_done: usize,
    records: u64,
    entries: u64,
    skipped: u64,
    flushes: usize,
}

/// Build the index for `options.directory` and commit it to `options.index_path()`
///
/// `progress` is called by the coordinator with `(shards_done, shards_total)`.
/// Any existing index file is only replaced once the new one is complete.
pub fn build_index<F>(options: &Options, progress: Option<F>) -> Result<BuildStats>
where
    F: Fn(usize, usize),
{
    let start = Instant::now();
    let shards = catalog::list_shards(&options.directory)?;
    let workers = options.resolved_threads().clamp(1, shards.len().max(1));
    let partitions = partition_shards(&shards, workers);
    let index_path = options.index_path();

    log::info!(
        "[Build] {} workers processing {} shards in blocks of {} (flush every {} entries)",
        partitions.len(),
        shards.len(),
        partitions.first().map(|p| p.len()).unwrap_or(0),
        options.flush_interval
    );

    let mut writer =
        IndexWriter::create(&index_path)?.with_resolver(resolver_for(options.duplicate_policy));
    let cancel = AtomicBool::new(false);
    let (tx, rx) = sync_channel::<WorkerMessage>(partitions.len() * 2);

    let (outcome, panicked) = std::thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .enumerate()
            .map(|(worker_id, block)| {
                let tx = tx.clone();
                let cancel = &cancel;
                scope.spawn(move || run_worker(worker_id, block, tx, cancel))
            })
            .collect();
        drop(tx);

        let outcome = coordinate(
            rx,
            &mut writer,
            options.flush_interval,
            shards.len(),
            progress.as_ref(),
        );
        if outcome.is_err() {
            cancel.store(true, Ordering::Relaxed);
        }

        let panicked = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| r.is_err())
            .count();
        (outcome, panicked)
    });

    let counters = match outcome {
        Ok(counters) => counters,
        Err(e) => {
            log::warn!("[Build] Aborted: {}", e);
            writer.abort();
            return Err(e);
        }
    };

    if panicked > 0 || counters.shards_done != shards.len() {
        log::warn!(
            "[Build] Aborted: {} workers panicked, {}/{} shards processed",
            panicked,
            counters.shards_done,
            shards.len()
        );
        writer.abort();
        return Err(IndexError::WorkerPanic);
    }

    let commit = writer.finish()?;
    let stats = BuildStats {
        shards: shards.len(),
        workers: partitions.len(),
        records: counters.records,
        entries_emitted: counters.entries,
        skipped_empty: counters.skipped,
        duplicates: counters.entries.saturating_sub(commit.entries),
        unique_entries: commit.entries,
        flushes: counters.flushes,
        index_bytes: commit.bytes,
        elapsed: start.elapsed(),
    };

    if stats.duplicates > 0 {
        log::warn!(
            "[Build] {} identifiers appear more than once; kept per {:?}",
            stats.duplicates,
            options.duplicate_policy
        );
    }
    log::info!(
        "[Build] ✓ Indexed {} DOIs from {} records in {} shards in {:.3}s ({} without DOI skipped)",
        stats.unique_entries,
        stats.records,
        stats.shards,
        stats.elapsed.as_secs_f64(),
        stats.skipped_empty
    );

    Ok(stats)
}

/// Split shards into contiguous blocks of `ceil(n / workers)`
///
/// The last block may be smaller, and fewer than `workers` blocks come back
/// when the shards do not fill them all.
pub fn partition_shards(shards: &[ShardRef], workers: usize) -> Vec<&[ShardRef]> {
    if shards.is_empty() {
        return Vec::new();
    }
    let block = shards.len().div_ceil(workers.max(1));
    shards.chunks(block).collect()
}

fn resolver_for(policy: DuplicatePolicy) -> Resolver {
    match policy {
        DuplicatePolicy::LastShardWins => keep_highest_shard,
        DuplicatePolicy::FirstShardWins => keep_lowest_shard,
    }
}

fn shard_value(value: &[u8]) -> Option<u64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

fn keep_highest_shard(existing: &[u8], incoming: &[u8]) -> bool {
    shard_value(incoming) >= shard_value(existing)
}

fn keep_lowest_shard(existing: &[u8], incoming: &[u8]) -> bool {
    shard_value(incoming) < shard_value(existing)
}

fn run_worker(
    worker_id: usize,
    block: &[ShardRef],
    tx: SyncSender<WorkerMessage>,
    cancel: &AtomicBool,
) {
    let start = Instant::now();
    let mut done = 0usize;

    for shard_ref in block {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("[Build] Worker {} cancelled after {} shards", worker_id, done);
            return;
        }

        let shard_start = Instant::now();
        let records = match shard::read_shard_ref(shard_ref) {
            Ok(records) => records,
            Err(e) => {
                tx.send(WorkerMessage::Failed(e)).ok();
                return;
            }
        };

        let total = records.len();
        let dois: Vec<String> = records
            .into_iter()
            .filter(|r| r.has_identifier())
            .map(|r| r.doi)
            .collect();
        let skipped = total - dois.len();

        log::debug!(
            "[Build] Worker {}: shard {} → {} DOIs ({} skipped) in {:.1}ms",
            worker_id,
            shard_ref.id,
            dois.len(),
            skipped,
            shard_start.elapsed().as_secs_f64() * 1000.0
        );

        let message = WorkerMessage::Shard {
            shard_id: shard_ref.id,
            dois,
            records: total,
            skipped,
        };
        if tx.send(message).is_err() {
            // Coordinator gave up
            return;
        }
        done += 1;
    }

    log::debug!(
        "[Build] Worker {} finished {} shards in {:.3}s",
        worker_id,
        done,
        start.elapsed().as_secs_f64()
    );
}

fn coordinate<F>(
    rx: Receiver<WorkerMessage>,
    writer: &mut IndexWriter,
    flush_interval: usize,
    total_shards: usize,
    progress: Option<&F>,
) -> Result<Counters>
where
    F: Fn(usize, usize),
{
    let mut counters = Counters::default();
    let mut since_flush = 0usize;

    for message in rx {
        let (shard_id, dois, records, skipped) = match message {
            WorkerMessage::Shard {
                shard_id,
                dois,
                records,
                skipped,
            } => (shard_id, dois, records, skipped),
            WorkerMessage::Failed(e) => return Err(e),
        };

        let value = shard_id.to_string();
        for doi in &dois {
            writer.set(doi.as_bytes(), value.as_bytes())?;
            since_flush += 1;

            if flush_interval > 0 && since_flush >= flush_interval {
                writer.flush()?;
                counters.flushes += 1;
                since_flush = 0;
            }
        }

        counters.shards_done += 1;
        counters.records += records as u64;
        counters.entries += dois.len() as u64;
        counters.skipped += skipped as u64;

        if let Some(cb) = progress {
            cb(counters.shards_done, total_shards);
        }
    }

    Ok(counters)
}
