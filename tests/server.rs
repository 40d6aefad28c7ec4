#![cfg(feature = "server")]

mod common;

use anyhow::Result;
use std::sync::Arc;

async fn setup_server(port: u16) -> Result<(tempfile::TempDir, tokio::task::JoinHandle<()>)> {
    let dir = common::setup_temp_dir()?;
    common::write_gzip_shard(dir.path(), 0, &["10.1/a", "10.1/b", ""])?;
    common::write_zstd_shard(dir.path(), 1, &["10.1/c"])?;

    let manager = Arc::new(common::setup_manager(dir.path())?);
    let handle = common::start_test_server(manager, port).await?;
    Ok((dir, handle))
}

#[tokio::test]
async fn test_server_lookup_endpoint() -> Result<()> {
    let port = 3041;
    let (_dir, server_handle) = setup_server(port).await?;
    let client = reqwest::Client::new();
    let base_url = format!("http://127.0.0.1:{}", port);

    let res = client
        .get(format!("{}/id", base_url))
        .query(&[("doi", "10.1/c")])
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("x-shard-id").and_then(|v| v.to_str().ok()),
        Some("1")
    );
    let body = res.text().await?;
    // Pretty-printed
    assert!(body.contains("\n  \"DOI\": \"10.1/c\""));
    let json: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(json["publisher"], "Test Publisher");
    assert_eq!(json["type"], "journal-article");

    let res = client
        .get(format!("{}/id", base_url))
        .query(&[("doi", "10.1/zzz")])
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    let json: serde_json::Value = res.json().await?;
    assert!(json["error"].as_str().unwrap_or("").contains("not indexed"));

    let res = client.get(format!("{}/id", base_url)).send().await?;
    assert_eq!(res.status(), 400);

    let res = client.get(format!("{}/id?doi=", base_url)).send().await?;
    assert_eq!(res.status(), 400);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_server_random_and_status() -> Result<()> {
    let port = 3042;
    let (_dir, server_handle) = setup_server(port).await?;
    let client = reqwest::Client::new();
    let base_url = format!("http://127.0.0.1:{}", port);

    let res = client
        .get(format!("{}/random?shards=10&per_shard=10&seed=3", base_url))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let json: serde_json::Value = res.json().await?;
    let mut dois: Vec<String> = json["dois"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    dois.sort();
    assert_eq!(dois, vec!["10.1/a", "10.1/b", "10.1/c"]);
    assert_eq!(json["seed"], 3);

    let res = client
        .get(format!("{}/random?shards=100000", base_url))
        .send()
        .await?;
    assert_eq!(res.status(), 400);

    // One lookup so the counters move
    client
        .get(format!("{}/id?doi=10.1/a", base_url))
        .send()
        .await?;

    let res = client.get(format!("{}/status", base_url)).send().await?;
    assert!(res.status().is_success());
    let json: serde_json::Value = res.json().await?;
    assert_eq!(json["server"]["version"], "test");
    assert_eq!(json["index"]["indexed_dois"], 3);
    assert_eq!(json["lookups"]["lookups"], 1);
    assert_eq!(json["build"]["skipped_empty"], 1);

    let res = client.get(format!("{}/", base_url)).send().await?;
    assert!(res.status().is_success());
    let body = res.text().await?;
    assert!(body.contains("crossref-index server"));

    server_handle.abort();
    Ok(())
}
