use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by index construction and lookups
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Cannot read corpus directory {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid shard filename {0:?}: id is not a non-negative integer")]
    InvalidShardName(String),

    #[error("Shard {0} appears more than once in the corpus directory")]
    DuplicateShard(u64),

    #[error("Cannot read shard {shard_id}: {source}")]
    ShardRead {
        shard_id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt compressed stream in shard {shard_id}: {source}")]
    Decompression {
        shard_id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed payload in shard {shard_id}: {source}")]
    Decode {
        shard_id: u64,
        #[source]
        source: sonic_rs::Error,
    },

    #[error("Index file {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Index store I/O error: {0}")]
    Store(#[from] std::io::Error),

    #[error("Key not found in index")]
    NotFound,

    #[error("DOI {0} not indexed")]
    NotIndexed(String),

    #[error("DOI {doi} not found in shard {shard_id} (index is stale)")]
    StaleIndex { doi: String, shard_id: u64 },

    #[error("Index worker panicked")]
    WorkerPanic,
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Outcomes reported to callers as "not found" rather than as failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IndexError::NotFound | IndexError::NotIndexed(_) | IndexError::StaleIndex { .. }
        )
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::StoreCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::NotIndexed("10.1000/xyz".to_string());
        assert_eq!(err.to_string(), "DOI 10.1000/xyz not indexed");

        let err = IndexError::StaleIndex {
            doi: "10.1000/xyz".to_string(),
            shard_id: 7,
        };
        assert_eq!(
            err.to_string(),
            "DOI 10.1000/xyz not found in shard 7 (index is stale)"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(IndexError::NotFound.is_not_found());
        assert!(IndexError::NotIndexed("a".into()).is_not_found());
        assert!(
            IndexError::StaleIndex {
                doi: "a".into(),
                shard_id: 1
            }
            .is_not_found()
        );
        assert!(!IndexError::WorkerPanic.is_not_found());
        assert!(!IndexError::corrupt("/tmp/x", "bad magic").is_not_found());
    }
}
