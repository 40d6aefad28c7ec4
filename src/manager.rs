// src/manager.rs
use crate::builder::{self, BuildStats};
use crate::constants;
use crate::error::{IndexError, Result};
use crate::lookup::{LookupEngine, LookupResult, LookupStats};
use crate::options::Options;
use crate::record::Record;
use crate::sample;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Process-level context: corpus configuration plus the opened index
///
/// Created once by the entry point and shared by reference with whatever
/// serves lookups.
pub struct MetadataManager {
    options: Options,
    engine: LookupEngine,
    build_stats: Option<BuildStats>,
}

impl MetadataManager {
    /// Build the index if it does not exist yet, then open it
    ///
    /// Only existence is checked. A corpus that changed since the index was
    /// built needs an explicit [`MetadataManager::rebuild`].
    pub fn initialize_index(options: Options) -> Result<Self> {
        Self::initialize_with_progress(options, None::<fn(usize, usize)>)
    }

    pub fn initialize_with_progress<F>(options: Options, progress: Option<F>) -> Result<Self>
    where
        F: Fn(usize, usize),
    {
        let index_path = options.index_path();
        if index_path.exists() {
            log::debug!("[Index] Using existing index {}", index_path.display());
            return Self::open(options);
        }

        log::info!(
            "[Index] No index at {}, building from {}",
            index_path.display(),
            options.directory.display()
        );
        Self::rebuild(options, progress)
    }

    /// Build the index unconditionally, replacing any existing one
    pub fn rebuild<F>(options: Options, progress: Option<F>) -> Result<Self>
    where
        F: Fn(usize, usize),
    {
        let stats = builder::build_index(&options, progress)?;
        let mut manager = Self::open(options)?;
        manager.build_stats = Some(stats);
        Ok(manager)
    }

    /// Open an existing index without building
    pub fn open(options: Options) -> Result<Self> {
        let index_path = options.index_path();
        let engine = LookupEngine::open(options.directory.clone(), &index_path)?;

        log::info!(
            "[Index] Opened {} ({} DOIs, {} bytes)",
            index_path.display(),
            engine.reader().len(),
            engine.reader().size_bytes()
        );

        Ok(Self {
            options,
            engine,
            build_stats: None,
        })
    }

    pub fn index_exists(options: &Options) -> bool {
        options.index_path().exists()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn directory(&self) -> &Path {
        &self.options.directory
    }

    pub fn index_path(&self) -> PathBuf {
        self.options.index_path()
    }

    /// Stats of the build performed by this manager, if any
    pub fn build_stats(&self) -> Option<&BuildStats> {
        self.build_stats.as_ref()
    }

    pub fn engine(&self) -> &LookupEngine {
        &self.engine
    }

    // === Lookups ===

    pub fn lookup(&self, doi: &str) -> Result<Record> {
        self.engine.lookup(doi)
    }

    pub fn lookup_with_stats(&self, doi: &str) -> Result<LookupResult> {
        self.engine.lookup_with_stats(doi)
    }

    pub fn random_dois(
        &self,
        shard_count: usize,
        per_shard: usize,
        seed: Option<u64>,
    ) -> Result<Vec<String>> {
        sample::random_dois(&self.options.directory, shard_count, per_shard, seed)
    }

    pub fn stats(&self) -> LookupStats {
        self.engine.stats()
    }

    /// Write every entry as a `doi#shard` line, in key order
    pub fn dump<W: Write>(&self, out: &mut W) -> Result<u64> {
        let reader = self.engine.reader();
        let mut written = 0u64;

        for entry in reader.iter() {
            let (key, value) = entry?;
            let (Ok(doi), Ok(shard)) = (std::str::from_utf8(key), std::str::from_utf8(value))
            else {
                return Err(IndexError::StoreCorrupt {
                    path: reader.path().to_path_buf(),
                    reason: format!("entry {} is not valid UTF-8", written),
                });
            };
            writeln!(out, "{}{}{}", doi, constants::LEGACY_SEPARATOR, shard)?;
            written += 1;
        }

        out.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsBuilder;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_shard(dir: &Path, id: u64, payload: &str) {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(payload.as_bytes()).unwrap();
        std::fs::write(dir.join(format!("{}.json.gz", id)), enc.finish().unwrap()).unwrap();
    }

    #[test]
    fn test_initialize_builds_once() {
        let dir = tempfile::tempdir().unwrap();
        write_shard(dir.path(), 0, r#"{"items":[{"DOI":"A"},{"DOI":"B"}]}"#);
        let options = OptionsBuilder::new().directory(dir.path()).num_threads(1).build();

        let first = MetadataManager::initialize_index(options.clone()).unwrap();
        assert_eq!(first.build_stats().map(|s| s.unique_entries), Some(2));

        let second = MetadataManager::initialize_index(options).unwrap();
        assert!(second.build_stats().is_none());
        assert_eq!(second.lookup("B").unwrap().doi, "B");
    }

    #[test]
    fn test_open_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let options = OptionsBuilder::new().directory(dir.path()).build();
        assert!(!MetadataManager::index_exists(&options));
        assert!(matches!(
            MetadataManager::open(options),
            Err(IndexError::Store(_))
        ));
    }

    #[test]
    fn test_dump_legacy_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_shard(dir.path(), 3, r#"{"items":[{"DOI":"10.2/b"},{"DOI":"10.2/a"}]}"#);
        let options = OptionsBuilder::new().directory(dir.path()).build();
        let manager = MetadataManager::initialize_index(options).unwrap();

        let mut out = Vec::new();
        assert_eq!(manager.dump(&mut out).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "10.2/a#3\n10.2/b#3\n");
    }
}
