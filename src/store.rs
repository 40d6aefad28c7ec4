// Ordered on-disk key→value store backing the DOI index
//
// File layout (little-endian):
//
//   header       32 bytes   magic "CRIX", version u32, entry_count u64,
//                           data_start u64, file_len u64
//   prefix table 256 × u32  index of the first entry whose key starts with
//                           each byte, or u32::MAX
//   offset table n × u64    entry offset relative to data_start
//   entries                 u16 key_len, key, u8 value_len, value
//
// Entries are sorted by key. Readers mmap the file and binary-search the
// offset table inside the prefix bucket, so a point lookup touches a handful
// of pages instead of loading the index.
//
// Writers buffer sets in memory and flush them as sorted run files into a
// staging directory next to the index. `finish` merges the runs into
// `<index>.tmp`, fsyncs it and renames it into place; an index file is never
// visible half-written.
use crate::constants::{
    self, INDEX_EMPTY_BUCKET, INDEX_HEADER_SIZE, INDEX_MAGIC, INDEX_OFFSET_TABLE_START,
    INDEX_PREFIX_BUCKETS, INDEX_VERSION, MAX_KEY_LEN, MAX_VALUE_LEN,
};
use crate::error::{IndexError, Result};
use memmap2::{Mmap, MmapOptions};
use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Decides whether `incoming` replaces `existing` for the same key
///
/// Called in write order: `existing` was set before `incoming`.
pub type Resolver = fn(existing: &[u8], incoming: &[u8]) -> bool;

/// Plain overwrite semantics: the later write wins
pub fn overwrite(_existing: &[u8], _incoming: &[u8]) -> bool {
    true
}

// ============================================================================
// IndexWriter
// ============================================================================

/// Summary of a committed index
#[derive(Debug, Clone, Default)]
pub struct CommitStats {
    pub entries: u64,
    pub runs_merged: usize,
    pub bytes: u64,
}

pub struct IndexWriter {
    path: PathBuf,
    staging: PathBuf,
    memtable: BTreeMap<Vec<u8>, Vec<u8>>,
    runs: Vec<PathBuf>,
    resolver: Resolver,
    finished: bool,
}

impl IndexWriter {
    /// Start a new index at `path`
    ///
    /// Leftovers of an interrupted build (staging directory, temp file) are
    /// discarded. An existing index at `path` stays in place until `finish`
    /// replaces it.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let staging = constants::staging_dir(&path);

        if staging.exists() {
            log::debug!("[Index] Removing stale staging dir {}", staging.display());
            fs::remove_dir_all(&staging)?;
        }
        let tmp = constants::temp_index_path(&path);
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }
        fs::create_dir_all(&staging)?;

        Ok(Self {
            path,
            staging,
            memtable: BTreeMap::new(),
            runs: Vec::new(),
            resolver: overwrite,
            finished: false,
        })
    }

    /// Use a custom conflict resolver instead of plain overwrite
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries buffered since the last flush
    pub fn pending(&self) -> usize {
        self.memtable.len()
    }

    /// Insert or overwrite `key`
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(invalid_input(format!("key length {} out of range", key.len())));
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(invalid_input(format!(
                "value length {} out of range",
                value.len()
            )));
        }

        match self.memtable.entry(key.to_vec()) {
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
            }
            Entry::Occupied(mut slot) => {
                if (self.resolver)(slot.get(), value) {
                    *slot.get_mut() = value.to_vec();
                }
            }
        }
        Ok(())
    }

    /// Persist buffered entries as a sorted run and release their memory
    pub fn flush(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let run_path = self.staging.join(format!("{:06}.run", self.runs.len()));
        let count = self.memtable.len();

        let file = File::create(&run_path)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        for (key, value) in std::mem::take(&mut self.memtable) {
            write_entry(&mut writer, &key, &value)?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        log::debug!(
            "[Index] Flushed run #{}: {} entries in {:.3}s",
            self.runs.len(),
            count,
            start.elapsed().as_secs_f64()
        );

        self.runs.push(run_path);
        Ok(())
    }

    /// Merge all runs into the final index file and commit it atomically
    pub fn finish(mut self) -> Result<CommitStats> {
        let start = Instant::now();
        self.flush()?;

        let tmp_path = constants::temp_index_path(&self.path);
        let data_path = self.staging.join("entries.tmp");
        let offsets_path = self.staging.join("offsets.tmp");

        // Pass 1: k-way merge of the runs into separate entry and offset files
        let mut data = BufWriter::with_capacity(1024 * 1024, File::create(&data_path)?);
        let mut offsets = BufWriter::with_capacity(1024 * 1024, File::create(&offsets_path)?);
        let mut prefix_table = [INDEX_EMPTY_BUCKET; INDEX_PREFIX_BUCKETS];
        let mut entry_count: u64 = 0;
        let mut data_len: u64 = 0;

        let mut merger = RunMerger::open(&self.runs, self.resolver)?;
        while let Some((key, value)) = merger.next_entry()? {
            if entry_count >= INDEX_EMPTY_BUCKET as u64 {
                return Err(invalid_input("too many entries for one index file".into()));
            }
            let bucket = key[0] as usize;
            if prefix_table[bucket] == INDEX_EMPTY_BUCKET {
                prefix_table[bucket] = entry_count as u32;
            }
            offsets.write_all(&data_len.to_le_bytes())?;
            data_len += write_entry(&mut data, &key, &value)? as u64;
            entry_count += 1;
        }
        data.flush()?;
        offsets.flush()?;
        drop(data);
        drop(offsets);

        // Pass 2: header + prefix table + offset table + entries
        let data_start = INDEX_OFFSET_TABLE_START as u64 + entry_count * 8;
        let file_len = data_start + data_len;

        let mut out = BufWriter::with_capacity(1024 * 1024, File::create(&tmp_path)?);
        let mut header = Vec::with_capacity(INDEX_HEADER_SIZE);
        header.extend_from_slice(INDEX_MAGIC);
        header.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        header.extend_from_slice(&entry_count.to_le_bytes());
        header.extend_from_slice(&data_start.to_le_bytes());
        header.extend_from_slice(&file_len.to_le_bytes());
        out.write_all(&header)?;
        for bucket in prefix_table.iter() {
            out.write_all(&bucket.to_le_bytes())?;
        }
        io::copy(&mut File::open(&offsets_path)?, &mut out)?;
        io::copy(&mut File::open(&data_path)?, &mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path);

        let runs_merged = self.runs.len();
        self.finished = true;
        if let Err(e) = fs::remove_dir_all(&self.staging) {
            log::warn!(
                "[Index] Could not remove staging dir {}: {}",
                self.staging.display(),
                e
            );
        }

        log::info!(
            "[Index] Committed {}: {} entries from {} runs, {} bytes in {:.3}s",
            self.path.display(),
            entry_count,
            runs_merged,
            file_len,
            start.elapsed().as_secs_f64()
        );

        Ok(CommitStats {
            entries: entry_count,
            runs_merged,
            bytes: file_len,
        })
    }

    /// Drop everything written so far without touching the index path
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.memtable.clear();
        fs::remove_dir_all(&self.staging).ok();
        fs::remove_file(constants::temp_index_path(&self.path)).ok();
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!("[Index] Discarding unfinished index {}", self.path.display());
        }
        self.discard();
    }
}

fn write_entry<W: Write>(writer: &mut W, key: &[u8], value: &[u8]) -> io::Result<usize> {
    writer.write_all(&(key.len() as u16).to_le_bytes())?;
    writer.write_all(key)?;
    writer.write_all(&[value.len() as u8])?;
    writer.write_all(value)?;
    Ok(2 + key.len() + 1 + value.len())
}

fn invalid_input(msg: String) -> IndexError {
    IndexError::Store(io::Error::new(io::ErrorKind::InvalidInput, msg))
}

fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        dir.sync_all().ok();
    }
}

// ============================================================================
// Run merging
// ============================================================================

struct RunReader {
    reader: BufReader<File>,
}

impl RunReader {
    fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            reader: BufReader::with_capacity(256 * 1024, File::open(path)?),
        })
    }

    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut len = [0u8; 2];
        match self.reader.read_exact(&mut len) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let mut key = vec![0u8; u16::from_le_bytes(len) as usize];
        self.reader.read_exact(&mut key)?;

        let mut vlen = [0u8; 1];
        self.reader.read_exact(&mut vlen)?;
        let mut value = vec![0u8; vlen[0] as usize];
        self.reader.read_exact(&mut value)?;

        Ok(Some((key, value)))
    }
}

/// Streams the union of sorted runs in key order
///
/// Equal keys are folded oldest run first through the resolver, which gives
/// the same result as if every set had gone into one memtable.
struct RunMerger {
    runs: Vec<RunReader>,
    heads: Vec<Option<Vec<u8>>>,
    heap: BinaryHeap<Reverse<(Vec<u8>, usize)>>,
    resolver: Resolver,
}

impl RunMerger {
    fn open(paths: &[PathBuf], resolver: Resolver) -> Result<Self> {
        let mut merger = Self {
            runs: Vec::with_capacity(paths.len()),
            heads: vec![None; paths.len()],
            heap: BinaryHeap::with_capacity(paths.len()),
            resolver,
        };
        for path in paths {
            merger.runs.push(RunReader::open(path)?);
        }
        for idx in 0..merger.runs.len() {
            merger.advance(idx)?;
        }
        Ok(merger)
    }

    fn advance(&mut self, idx: usize) -> Result<()> {
        if let Some((key, value)) = self.runs[idx].next_entry()? {
            self.heads[idx] = Some(value);
            self.heap.push(Reverse((key, idx)));
        }
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let Some(Reverse((key, idx))) = self.heap.pop() else {
            return Ok(None);
        };
        let mut value = self.heads[idx].take().unwrap_or_default();
        self.advance(idx)?;

        while let Some(Reverse((next_key, _))) = self.heap.peek() {
            if *next_key != key {
                break;
            }
            let Some(Reverse((_, next_idx))) = self.heap.pop() else {
                break;
            };
            let incoming = self.heads[next_idx].take().unwrap_or_default();
            if (self.resolver)(&value, &incoming) {
                value = incoming;
            }
            self.advance(next_idx)?;
        }

        Ok(Some((key, value)))
    }
}

// ============================================================================
// IndexReader
// ============================================================================

/// Read-only, memory-mapped view of a committed index
pub struct IndexReader {
    path: PathBuf,
    mmap: Mmap,
    entry_count: usize,
    data_start: usize,
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("path", &self.path)
            .field("entry_count", &self.entry_count)
            .finish()
    }
}

impl IndexReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        if file.metadata()?.len() < INDEX_OFFSET_TABLE_START as u64 {
            return Err(IndexError::corrupt(&path, "file shorter than header"));
        }
        // SAFETY: committed index files are never modified in place; rebuilds
        // write a new file and rename it over the old one.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let data = &mmap[..];
        if &data[0..4] != INDEX_MAGIC {
            return Err(IndexError::corrupt(&path, "bad magic"));
        }
        let version = read_u32(data, 4);
        if version != INDEX_VERSION {
            return Err(IndexError::corrupt(
                &path,
                format!("unsupported version {}", version),
            ));
        }
        let entry_count = read_u64(data, 8);
        let data_start = read_u64(data, 16);
        let file_len = read_u64(data, 24);

        if file_len != data.len() as u64 {
            return Err(IndexError::corrupt(
                &path,
                format!("length {} does not match header {}", data.len(), file_len),
            ));
        }
        let expected_start =
            (INDEX_OFFSET_TABLE_START as u64).checked_add(entry_count.saturating_mul(8));
        if expected_start != Some(data_start) || data_start > file_len {
            return Err(IndexError::corrupt(&path, "inconsistent offset table"));
        }

        log::debug!(
            "[Index] Opened {} ({} entries, {} bytes)",
            path.display(),
            entry_count,
            file_len
        );

        Ok(Self {
            path,
            entry_count: entry_count as usize,
            data_start: data_start as usize,
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Size of the index file in bytes
    pub fn size_bytes(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> Result<&[u8]> {
        let Some((mut left, mut right)) = self.prefix_range(key) else {
            return Err(IndexError::NotFound);
        };

        while left < right {
            let mid = left + (right - left) / 2;
            let (entry_key, value) = self.entry_at(mid)?;
            match key.cmp(entry_key) {
                std::cmp::Ordering::Equal => return Ok(value),
                std::cmp::Ordering::Less => right = mid,
                std::cmp::Ordering::Greater => left = mid + 1,
            }
        }

        Err(IndexError::NotFound)
    }

    /// All entries in key order
    pub fn iter(&self) -> impl Iterator<Item = Result<(&[u8], &[u8])>> + '_ {
        (0..self.entry_count).map(move |i| self.entry_at(i))
    }

    /// Entry index range `[left, right)` that can hold keys with `key[0]`
    fn prefix_range(&self, key: &[u8]) -> Option<(usize, usize)> {
        let first = *key.first()? as usize;
        let data = &self.mmap[..];

        let left = read_u32(data, INDEX_HEADER_SIZE + first * 4);
        if left == INDEX_EMPTY_BUCKET {
            return None;
        }

        let right = ((first + 1)..INDEX_PREFIX_BUCKETS)
            .map(|bucket| read_u32(data, INDEX_HEADER_SIZE + bucket * 4))
            .find(|&idx| idx != INDEX_EMPTY_BUCKET)
            .map(|idx| idx as usize)
            .unwrap_or(self.entry_count);

        Some((left as usize, right.min(self.entry_count)))
    }

    fn entry_at(&self, idx: usize) -> Result<(&[u8], &[u8])> {
        let data = &self.mmap[..];
        let corrupt = |reason: &str| IndexError::corrupt(&self.path, format!("entry {}: {}", idx, reason));

        let offset_pos = INDEX_OFFSET_TABLE_START + idx * 8;
        let rel = read_u64(data, offset_pos) as usize;
        let mut pos = self
            .data_start
            .checked_add(rel)
            .filter(|p| p + 2 <= data.len())
            .ok_or_else(|| corrupt("offset out of bounds"))?;

        let key_len = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;
        if pos + key_len + 1 > data.len() {
            return Err(corrupt("key out of bounds"));
        }
        let key = &data[pos..pos + key_len];
        pos += key_len;

        let value_len = data[pos] as usize;
        pos += 1;
        if pos + value_len > data.len() {
            return Err(corrupt("value out of bounds"));
        }
        Ok((key, &data[pos..pos + value_len]))
    }
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(buf)
}
