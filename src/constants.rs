//! Global constants and helpers for corpus filenames, index layout and build defaults
use std::path::{Path, PathBuf};

/// Binary name used in banners and log lines
pub const BINARY_NAME: &str = "crossref-index";

/// Package version from Cargo.toml (set at compile time)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Corpus Constants
// ============================================================================

/// Gzip-compressed JSON shard extension (Crossref public data file format)
pub const SHARD_EXT_GZIP: &str = ".json.gz";

/// Zstd-compressed JSON shard extension
pub const SHARD_EXT_ZSTD: &str = ".json.zst";

/// Upper bound on the buffer reserved before decompressing a shard
pub const SHARD_MAX_INITIAL_BUFFER: usize = 256 * 1024 * 1024;

/// Default corpus directory when neither `--dir` nor `DUMP_PATH` is given
pub const DEFAULT_DUMP_PATH: &str = ".";

/// Environment variable naming the corpus directory
pub const DUMP_PATH_ENV: &str = "DUMP_PATH";

// ============================================================================
// Index Constants
// ============================================================================

/// Default persisted index filename (lives inside the corpus directory)
pub const INDEX_FILE_NAME: &str = "crossref-metadata-index.idx";

/// Separator of the legacy flat `identifier#shardId` export format
pub const LEGACY_SEPARATOR: char = '#';

/// Index file magic
pub const INDEX_MAGIC: &[u8; 4] = b"CRIX";

/// Index file format version
pub const INDEX_VERSION: u32 = 1;

/// Header size in bytes
pub const INDEX_HEADER_SIZE: usize = 32;

/// Number of buckets in the first-byte prefix table
pub const INDEX_PREFIX_BUCKETS: usize = 256;

/// Marker for an empty prefix bucket
pub const INDEX_EMPTY_BUCKET: u32 = u32::MAX;

/// Offset of the per-entry offset table (header + prefix table)
pub const INDEX_OFFSET_TABLE_START: usize = INDEX_HEADER_SIZE + INDEX_PREFIX_BUCKETS * 4;

/// Longest key the index stores (u16 length prefix)
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Longest value the index stores (u8 length prefix)
pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

// ============================================================================
// Build Constants
// ============================================================================

/// Entries buffered by the coordinator before a durable flush
pub const DEFAULT_FLUSH_INTERVAL: usize = 1_000_000;

/// Fallback worker count when available parallelism cannot be detected
pub const FALLBACK_WORKERS: usize = 4;

/// Returns the staging directory used for flushed runs of an index file
pub fn staging_dir(index_path: &Path) -> PathBuf {
    let mut name = index_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".staging");
    index_path.with_file_name(name)
}

/// Returns the temporary path an index is written to before the final rename
pub fn temp_index_path(index_path: &Path) -> PathBuf {
    let mut name = index_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    index_path.with_file_name(name)
}

// ============================================================================
// Server Constants
// ============================================================================

/// Default HTTP port of the lookup service
pub const DEFAULT_SERVER_PORT: u16 = 9098;

/// Upper bound on shards sampled per `/random` request
pub const MAX_RANDOM_SHARDS: usize = 100;

/// Upper bound on identifiers sampled per shard per `/random` request
pub const MAX_RANDOM_PER_SHARD: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_and_temp_paths() {
        let p = Path::new("/data/dump/crossref-metadata-index.idx");
        assert_eq!(
            staging_dir(p),
            PathBuf::from("/data/dump/crossref-metadata-index.idx.staging")
        );
        assert_eq!(
            temp_index_path(p),
            PathBuf::from("/data/dump/crossref-metadata-index.idx.tmp")
        );
    }

    #[test]
    fn test_offset_table_start() {
        assert_eq!(INDEX_OFFSET_TABLE_START, 1056);
    }
}
