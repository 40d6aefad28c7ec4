// src/lib.rs
//! DOI index over a sharded Crossref metadata dump
//!
//! A dump is a directory of independently compressed shards
//! (`<id>.json.gz` or `<id>.json.zst`), each holding `{"items": [...]}`.
//! [`build_index`] scans every shard in parallel and persists a sorted
//! DOI → shard id file; [`LookupEngine`] answers a lookup by decompressing
//! the single shard that holds the DOI.
//!
//! ```no_run
//! use crossref_index::{MetadataManager, OptionsBuilder};
//!
//! # fn main() -> crossref_index::Result<()> {
//! let options = OptionsBuilder::new().directory("/data/crossref").build();
//! let manager = MetadataManager::initialize_index(options)?;
//! let record = manager.lookup("10.1103/physrevb.80.125416")?;
//! println!("{}", record.publisher);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod format;
pub mod lookup;
pub mod manager;
pub mod options;
pub mod record;
pub mod sample;
pub mod shard;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

pub use builder::{BuildStats, build_index};
pub use catalog::{ShardRef, list_shards};
pub use error::{IndexError, Result};
pub use lookup::{LookupEngine, LookupResult, LookupStats};
pub use manager::MetadataManager;
pub use options::{DuplicatePolicy, Options, OptionsBuilder};
pub use record::{Author, Record, Reference};
pub use sample::random_dois;
pub use shard::{ShardCodec, read_shard};
pub use store::{IndexReader, IndexWriter};
