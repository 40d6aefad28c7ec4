//! Point lookups: index → shard id → full shard read → linear scan
use crate::error::{IndexError, Result};
use crate::record::Record;
use crate::shard;
use crate::store::IndexReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct LookupEngine {
    root: PathBuf,
    reader: IndexReader,

    lookups: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    records_scanned: AtomicU64,
}

/// A record together with how it was found
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub record: Record,
    pub shard_id: u64,
    /// Records decoded from the shard before the match
    pub records_scanned: usize,
    pub shard_records: usize,
    pub index_time: Duration,
    pub load_time: Duration,
    pub total_time: Duration,
}

/// Cumulative lookup counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupStats {
    pub indexed_dois: usize,
    pub index_size_bytes: u64,
    pub lookups: u64,
    pub not_indexed: u64,
    pub stale: u64,
    pub records_scanned: u64,
}

impl LookupEngine {
    /// Open the persisted index at `index_path` for lookups into `root`
    pub fn open(root: impl Into<PathBuf>, index_path: &Path) -> Result<Self> {
        let reader = IndexReader::open(index_path)?;
        Ok(Self::with_reader(root, reader))
    }

    pub fn with_reader(root: impl Into<PathBuf>, reader: IndexReader) -> Self {
        Self {
            root: root.into(),
            reader,
            lookups: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            records_scanned: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Return the record whose DOI equals `doi` exactly
    pub fn lookup(&self, doi: &str) -> Result<Record> {
        self.lookup_with_stats(doi).map(|r| r.record)
    }

    pub fn lookup_with_stats(&self, doi: &str) -> Result<LookupResult> {
        let start = Instant::now();
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let shard_id = match self.shard_for(doi) {
            Ok(id) => id,
            Err(IndexError::NotFound) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("[Lookup] {} not indexed", doi);
                return Err(IndexError::NotIndexed(doi.to_string()));
            }
            Err(e) => return Err(e),
        };
        let index_time = start.elapsed();

        let load_start = Instant::now();
        let mut records = shard::read_shard(&self.root, shard_id)?;
        let load_time = load_start.elapsed();
        let shard_records = records.len();

        let Some(position) = records.iter().position(|r| r.doi == doi) else {
            self.stale.fetch_add(1, Ordering::Relaxed);
            self.records_scanned
                .fetch_add(shard_records as u64, Ordering::Relaxed);
            log::warn!(
                "[Lookup] Index points {} to shard {}, which no longer contains it",
                doi,
                shard_id
            );
            return Err(IndexError::StaleIndex {
                doi: doi.to_string(),
                shard_id,
            });
        };

        let records_scanned = position + 1;
        self.records_scanned
            .fetch_add(records_scanned as u64, Ordering::Relaxed);
        let record = records.swap_remove(position);
        let total_time = start.elapsed();

        log::debug!(
            "[Lookup] {} → shard {} (index {:.3}ms, load {:.1}ms, scanned {}/{})",
            doi,
            shard_id,
            index_time.as_secs_f64() * 1000.0,
            load_time.as_secs_f64() * 1000.0,
            records_scanned,
            shard_records
        );

        Ok(LookupResult {
            record,
            shard_id,
            records_scanned,
            shard_records,
            index_time,
            load_time,
            total_time,
        })
    }

    /// Shard id stored for `doi`, without touching the shard
    pub fn shard_for(&self, doi: &str) -> Result<u64> {
        let value = self.reader.get(doi.as_bytes())?;
        std::str::from_utf8(value)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| IndexError::StoreCorrupt {
                path: self.reader.path().to_path_buf(),
                reason: format!("value for {:?} is not a shard id", doi),
            })
    }

    pub fn stats(&self) -> LookupStats {
        LookupStats {
            indexed_dois: self.reader.len(),
            index_size_bytes: self.reader.size_bytes(),
            lookups: self.lookups.load(Ordering::Relaxed),
            not_indexed: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IndexWriter;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn write_shard(dir: &Path, id: u64, payload: &str) {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(payload.as_bytes()).unwrap();
        std::fs::write(dir.join(format!("{}.json.gz", id)), enc.finish().unwrap()).unwrap();
    }

    fn engine_with(dir: &Path, entries: &[(&str, &str)]) -> LookupEngine {
        let index_path = dir.join("test.idx");
        let mut writer = IndexWriter::create(&index_path).unwrap();
        for (k, v) in entries {
            writer.set(k.as_bytes(), v.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        LookupEngine::open(dir, &index_path).unwrap()
    }

    #[test]
    fn test_lookup_found() {
        let dir = tempfile::tempdir().unwrap();
        write_shard(
            dir.path(),
            1,
            r#"{"items": [{"DOI": "10.5/x"}, {"DOI": "10.5/c", "publisher": "ACM"}]}"#,
        );
        let engine = engine_with(dir.path(), &[("10.5/c", "1")]);

        let result = engine.lookup_with_stats("10.5/c").unwrap();
        assert_eq!(result.record.doi, "10.5/c");
        assert_eq!(result.record.publisher, "ACM");
        assert_eq!(result.shard_id, 1);
        assert_eq!(result.records_scanned, 2);
        assert_eq!(result.shard_records, 2);
    }

    #[test]
    fn test_lookup_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("10.5/c", "1")]);

        assert!(matches!(
            engine.lookup("10.5/z"),
            Err(IndexError::NotIndexed(doi)) if doi == "10.5/z"
        ));
        assert!(matches!(engine.lookup(""), Err(IndexError::NotIndexed(_))));
        assert_eq!(engine.stats().not_indexed, 2);
    }

    #[test]
    fn test_lookup_stale() {
        let dir = tempfile::tempdir().unwrap();
        write_shard(dir.path(), 0, r#"{"items": [{"DOI": "10.5/a"}]}"#);
        let engine = engine_with(dir.path(), &[("10.5/gone", "0")]);

        assert!(matches!(
            engine.lookup("10.5/gone"),
            Err(IndexError::StaleIndex { shard_id: 0, .. })
        ));
        let stats = engine.stats();
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.lookups, 1);
    }

    #[test]
    fn test_lookup_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("10.5/a", "shard-zero")]);
        assert!(matches!(
            engine.lookup("10.5/a"),
            Err(IndexError::StoreCorrupt { .. })
        ));
    }

    #[test]
    fn test_lookup_missing_shard_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), &[("10.5/a", "7")]);
        assert!(matches!(
            engine.lookup("10.5/a"),
            Err(IndexError::ShardRead { shard_id: 7, .. })
        ));
    }
}
