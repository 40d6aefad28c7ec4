use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crossref_index::{MetadataManager, Options, OptionsBuilder};

pub fn setup_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(anyhow::Error::from)
}

/// Shard payload with one record per DOI; "" gives a record without identifier
pub fn shard_payload(dois: &[&str]) -> String {
    let items: Vec<serde_json::Value> = dois
        .iter()
        .map(|doi| {
            serde_json::json!({
                "DOI": doi,
                "title": [format!("Title of {}", doi)],
                "publisher": "Test Publisher",
                "type": "journal-article",
                "author": [{"given": "Ada", "family": "Lovelace"}],
            })
        })
        .collect();
    serde_json::json!({ "items": items }).to_string()
}

pub fn write_gzip_shard(dir: &Path, id: u64, dois: &[&str]) -> Result<()> {
    write_gzip_file(dir, &format!("{}.json.gz", id), shard_payload(dois).as_bytes())
}

/// Gzip `payload` into `dir/filename` as-is, valid JSON or not
pub fn write_gzip_file(dir: &Path, filename: &str, payload: &[u8]) -> Result<()> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(payload)?;
    std::fs::write(dir.join(filename), enc.finish()?)?;
    Ok(())
}

#[allow(dead_code)]
pub fn write_zstd_shard(dir: &Path, id: u64, dois: &[&str]) -> Result<()> {
    let compressed = zstd::encode_all(shard_payload(dois).as_bytes(), 3)?;
    std::fs::write(dir.join(format!("{}.json.zst", id)), compressed)?;
    Ok(())
}

/// `shards` shards of `per_shard` DOIs each, alternating gzip and zstd
#[allow(dead_code)]
pub fn write_corpus(dir: &Path, shards: u64, per_shard: u32) -> Result<Vec<String>> {
    let mut all = Vec::new();
    for id in 0..shards {
        let dois: Vec<String> = (0..per_shard)
            .map(|i| format!("10.{}/item-{}", 1000 + id, i))
            .collect();
        let refs: Vec<&str> = dois.iter().map(|s| s.as_str()).collect();
        if id % 2 == 0 {
            write_gzip_shard(dir, id, &refs)?;
        } else {
            write_zstd_shard(dir, id, &refs)?;
        }
        all.extend(dois);
    }
    Ok(all)
}

pub fn options(dir: &Path, threads: usize) -> Options {
    OptionsBuilder::new()
        .directory(dir)
        .num_threads(threads)
        .build()
}

#[allow(dead_code)]
pub fn setup_manager(dir: &Path) -> Result<MetadataManager> {
    Ok(MetadataManager::initialize_index(options(dir, 2))?)
}

#[cfg(feature = "server")]
#[allow(dead_code)]
pub async fn start_test_server(
    manager: Arc<MetadataManager>,
    port: u16,
) -> Result<tokio::task::JoinHandle<()>> {
    let config = crossref_index::server::ServerConfig {
        version: "test".to_string(),
        ..Default::default()
    };
    let server = crossref_index::server::Server::new(manager, config);
    let app = server.router();
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(server_handle)
}

#[cfg(not(feature = "server"))]
#[allow(dead_code)]
pub async fn start_test_server(
    _manager: Arc<MetadataManager>,
    _port: u16,
) -> Result<tokio::task::JoinHandle<()>> {
    anyhow::bail!("server feature not enabled for tests");
}
