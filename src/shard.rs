//! Shard reading: full decompression followed by a full decode
//!
//! Neither codec offers random access inside a shard, so every read
//! decompresses the whole file into memory and decodes every record. This is
//! the dominant cost of a lookup.
use crate::catalog::ShardRef;
use crate::constants;
use crate::error::{IndexError, Result};
use crate::record::{Record, RecordList};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Compression format of a shard file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardCodec {
    Gzip,
    Zstd,
}

impl ShardCodec {
    /// Probe order used when a shard is addressed by id only
    pub const ALL: [ShardCodec; 2] = [ShardCodec::Gzip, ShardCodec::Zstd];

    pub fn extension(&self) -> &'static str {
        match self {
            ShardCodec::Gzip => constants::SHARD_EXT_GZIP,
            ShardCodec::Zstd => constants::SHARD_EXT_ZSTD,
        }
    }

    pub fn filename(&self, shard_id: u64) -> String {
        format!("{}{}", shard_id, self.extension())
    }
}

/// Read shard `shard_id` from the corpus directory
pub fn read_shard(root: &Path, shard_id: u64) -> Result<Vec<Record>> {
    let shard = locate_shard(root, shard_id)?;
    read_shard_ref(&shard)
}

/// Read a shard already located by the catalog
pub fn read_shard_ref(shard: &ShardRef) -> Result<Vec<Record>> {
    let raw = decompress(&shard.path, shard.codec, shard.id)?;
    decode(&raw, shard.id)
}

/// Find the file backing `shard_id`
fn locate_shard(root: &Path, shard_id: u64) -> Result<ShardRef> {
    ShardCodec::ALL
        .iter()
        .map(|codec| (*codec, root.join(codec.filename(shard_id))))
        .find(|(_, path)| path.is_file())
        .map(|(codec, path)| ShardRef {
            id: shard_id,
            path,
            codec,
        })
        .ok_or_else(|| IndexError::ShardRead {
            shard_id,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "no {} or {} file in {}",
                    ShardCodec::Gzip.filename(shard_id),
                    ShardCodec::Zstd.filename(shard_id),
                    root.display()
                ),
            ),
        })
}

fn decompress(path: &Path, codec: ShardCodec, shard_id: u64) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|source| IndexError::ShardRead { shard_id, source })?;
    let size_hint = file.metadata().map(|m| m.len()).unwrap_or(0);
    let reader = BufReader::with_capacity(1024 * 1024, file);

    let mut raw = Vec::with_capacity(initial_capacity(size_hint));
    let corrupt = |source| IndexError::Decompression { shard_id, source };

    match codec {
        ShardCodec::Gzip => {
            flate2::read::MultiGzDecoder::new(reader)
                .read_to_end(&mut raw)
                .map_err(corrupt)?;
        }
        ShardCodec::Zstd => {
            zstd::Decoder::with_buffer(reader)
                .map_err(corrupt)?
                .read_to_end(&mut raw)
                .map_err(corrupt)?;
        }
    }

    Ok(raw)
}

/// Buffer to reserve up front for a shard of `compressed_len` bytes
///
/// Compressed JSON usually expands 5-10x; beyond the cap `read_to_end` grows
/// the buffer and reports allocation trouble as an error.
fn initial_capacity(compressed_len: u64) -> usize {
    let cap = constants::SHARD_MAX_INITIAL_BUFFER as u64;
    compressed_len.saturating_mul(8).min(cap) as usize
}

fn decode(raw: &[u8], shard_id: u64) -> Result<Vec<Record>> {
    let list: RecordList =
        sonic_rs::from_slice(raw).map_err(|source| IndexError::Decode { shard_id, source })?;
    Ok(list.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const PAYLOAD: &str = r#"{"items": [{"DOI": "10.1/a"}, {"DOI": ""}, {"DOI": "10.1/b"}]}"#;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_read_gzip_shard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("4.json.gz"), gzip(PAYLOAD.as_bytes())).unwrap();

        let records = read_shard(dir.path(), 4).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].doi, "10.1/a");
        assert!(records[1].doi.is_empty());
    }

    #[test]
    fn test_read_zstd_shard() {
        let dir = tempfile::tempdir().unwrap();
        let compressed = zstd::encode_all(PAYLOAD.as_bytes(), 1).unwrap();
        std::fs::write(dir.path().join("9.json.zst"), compressed).unwrap();

        let records = read_shard(dir.path(), 9).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].doi, "10.1/b");
    }

    #[test]
    fn test_missing_shard() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_shard(dir.path(), 1),
            Err(IndexError::ShardRead { shard_id: 1, .. })
        ));
    }

    #[test]
    fn test_corrupt_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = gzip(PAYLOAD.as_bytes());
        data.truncate(data.len() / 2);
        std::fs::write(dir.path().join("0.json.gz"), data).unwrap();

        assert!(matches!(
            read_shard(dir.path(), 0),
            Err(IndexError::Decompression { shard_id: 0, .. })
        ));
    }

    #[test]
    fn test_not_compressed_at_all() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0.json.gz"), PAYLOAD).unwrap();

        assert!(matches!(
            read_shard(dir.path(), 0),
            Err(IndexError::Decompression { .. })
        ));
    }

    #[test]
    fn test_initial_capacity_is_capped() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(1000), 8000);
        assert_eq!(
            initial_capacity(10 * 1024 * 1024 * 1024),
            constants::SHARD_MAX_INITIAL_BUFFER
        );
        assert_eq!(initial_capacity(u64::MAX), constants::SHARD_MAX_INITIAL_BUFFER);
    }

    #[test]
    fn test_malformed_payload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2.json.gz"),
            gzip(br#"{"items": [{"DOI": "10.1/a"},"#),
        )
        .unwrap();

        assert!(matches!(
            read_shard(dir.path(), 2),
            Err(IndexError::Decode { shard_id: 2, .. })
        ));
    }
}
