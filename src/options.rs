use crate::constants;
use std::path::PathBuf;

/// Configuration of a corpus and its index
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory containing shard files
    pub directory: PathBuf,
    /// Index file; defaults to `crossref-metadata-index.idx` inside `directory`
    pub index_file: Option<PathBuf>,
    /// Number of build workers (0 = auto)
    pub num_threads: usize,
    /// Entries buffered before the builder flushes the index store
    pub flush_interval: usize,
    /// Which shard keeps an identifier found in more than one shard
    pub duplicate_policy: DuplicatePolicy,
}

/// Resolution of identifiers that appear in more than one shard
///
/// Duplicates are a data-quality anomaly. The policy is applied by shard id,
/// not by arrival order, so the index does not depend on the worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The highest shard id wins
    #[default]
    LastShardWins,
    /// The lowest shard id wins
    FirstShardWins,
}

impl Options {
    /// Path of the persisted index
    pub fn index_path(&self) -> PathBuf {
        self.index_file
            .clone()
            .unwrap_or_else(|| self.directory.join(constants::INDEX_FILE_NAME))
    }

    /// Worker count with 0 resolved to the available parallelism
    pub fn resolved_threads(&self) -> usize {
        if self.num_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(constants::FALLBACK_WORKERS)
        } else {
            self.num_threads
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(constants::DEFAULT_DUMP_PATH),
            index_file: None,
            num_threads: 0,
            flush_interval: constants::DEFAULT_FLUSH_INTERVAL,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Builder for Options
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: Options::default(),
        }
    }

    pub fn directory<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.options.directory = dir.into();
        self
    }

    pub fn index_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.index_file = Some(path.into());
        self
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.options.num_threads = n;
        self
    }

    /// 0 disables intermediate flushes
    pub fn flush_interval(mut self, entries: usize) -> Self {
        self.options.flush_interval = entries;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.options.duplicate_policy = policy;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index_path() {
        let options = OptionsBuilder::new().directory("/data/crossref/2023").build();
        assert_eq!(
            options.index_path(),
            PathBuf::from("/data/crossref/2023/crossref-metadata-index.idx")
        );
        assert_eq!(options.flush_interval, 1_000_000);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::LastShardWins);
    }

    #[test]
    fn test_index_file_override() {
        let options = OptionsBuilder::new()
            .directory("/data")
            .index_file("/var/cache/doi.idx")
            .build();
        assert_eq!(options.index_path(), PathBuf::from("/var/cache/doi.idx"));
    }

    #[test]
    fn test_resolved_threads() {
        assert_eq!(OptionsBuilder::new().num_threads(3).build().resolved_threads(), 3);
        assert!(OptionsBuilder::new().build().resolved_threads() >= 1);
    }
}
