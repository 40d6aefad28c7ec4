//! Corpus directory scanning: shard filename → shard id
use crate::error::{IndexError, Result};
use crate::shard::ShardCodec;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A shard file found in the corpus directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRef {
    pub id: u64,
    pub path: PathBuf,
    pub codec: ShardCodec,
}

/// List all shard files of a corpus, sorted by shard id
///
/// Entries that do not carry a shard extension (the index file, staging
/// directories, stray files) are ignored. A file that carries a shard
/// extension but whose stem is not a non-negative integer is an error, since
/// silently dropping it would leave its records unindexed.
pub fn list_shards(root: &Path) -> Result<Vec<ShardRef>> {
    let entries = std::fs::read_dir(root).map_err(|source| IndexError::Catalog {
        path: root.to_path_buf(),
        source,
    })?;

    let mut shards = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        let entry = entry.map_err(|source| IndexError::Catalog {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };

        let Some((id, codec)) = parse_shard_name(filename)? else {
            continue;
        };

        if !seen.insert(id) {
            return Err(IndexError::DuplicateShard(id));
        }
        shards.push(ShardRef { id, path, codec });
    }

    shards.sort_by_key(|s| s.id);

    log::debug!(
        "[Catalog] Found {} shards in {}",
        shards.len(),
        root.display()
    );

    Ok(shards)
}

/// Parse `<id>.json.gz` / `<id>.json.zst`
///
/// Returns `Ok(None)` for names without a shard extension. The stem must be
/// the canonical decimal form of the id (`7`, not `007` or `+7`): lookups
/// rebuild the filename from the stored id.
pub fn parse_shard_name(filename: &str) -> Result<Option<(u64, ShardCodec)>> {
    for codec in ShardCodec::ALL {
        if let Some(stem) = filename.strip_suffix(codec.extension()) {
            let canonical = !stem.is_empty()
                && stem.bytes().all(|b| b.is_ascii_digit())
                && (stem == "0" || !stem.starts_with('0'));
            let id = stem
                .parse::<u64>()
                .ok()
                .filter(|_| canonical)
                .ok_or_else(|| IndexError::InvalidShardName(filename.to_string()))?;
            return Ok(Some((id, codec)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_shard_name() {
        assert_eq!(
            parse_shard_name("0.json.gz").unwrap(),
            Some((0, ShardCodec::Gzip))
        );
        assert_eq!(
            parse_shard_name("27105.json.zst").unwrap(),
            Some((27105, ShardCodec::Zstd))
        );
        assert_eq!(parse_shard_name("crossref-metadata-index.idx").unwrap(), None);
        assert_eq!(parse_shard_name("notes.json").unwrap(), None);
        assert!(matches!(
            parse_shard_name("part-a.json.gz"),
            Err(IndexError::InvalidShardName(_))
        ));
        assert!(matches!(
            parse_shard_name("-1.json.gz"),
            Err(IndexError::InvalidShardName(_))
        ));
        assert_eq!(
            parse_shard_name("4294967296.json.gz").unwrap(),
            Some((4_294_967_296, ShardCodec::Gzip))
        );
    }

    #[test]
    fn test_parse_shard_name_requires_canonical_stem() {
        for name in [
            "007.json.gz",
            "00.json.zst",
            "+3.json.gz",
            ".json.gz",
            " 3.json.gz",
            "18446744073709551616.json.gz",
        ] {
            assert!(
                matches!(parse_shard_name(name), Err(IndexError::InvalidShardName(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_list_shards_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.json.gz", "2.json.zst", "0.json.gz", "README.md"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("5.json.gz.staging")).unwrap();

        let shards = list_shards(dir.path()).unwrap();
        let ids: Vec<u64> = shards.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 2, 10]);
        assert_eq!(shards[1].codec, ShardCodec::Zstd);
        assert_eq!(shards[2].path, dir.path().join("10.json.gz"));
    }

    #[test]
    fn test_list_shards_rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.json.gz"), b"").unwrap();
        fs::write(dir.path().join("x1.json.gz"), b"").unwrap();
        assert!(matches!(
            list_shards(dir.path()),
            Err(IndexError::InvalidShardName(_))
        ));
    }

    #[test]
    fn test_list_shards_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("3.json.gz"), b"").unwrap();
        fs::write(dir.path().join("3.json.zst"), b"").unwrap();
        assert!(matches!(
            list_shards(dir.path()),
            Err(IndexError::DuplicateShard(3))
        ));
    }

    #[test]
    fn test_list_shards_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            list_shards(&missing),
            Err(IndexError::Catalog { .. })
        ));
    }
}
