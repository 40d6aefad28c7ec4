// Server startup: index initialization, bind, serve until Ctrl+C

use crate::constants;
use crate::manager::MetadataManager;
use crate::options::Options;
use crate::server::{Server, ServerConfig};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Configuration for server startup
pub struct StartupConfig {
    pub options: Options,
    pub host: String,
    pub port: u16,
}

/// Build progress reporter, called with (shards_done, shards_total)
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Initialize the index (building it when absent), then serve lookups
pub async fn start_server(config: StartupConfig, progress: Option<ProgressCallback>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let socket_addr: SocketAddr = addr.parse().context("Invalid address format")?;

    let options = config.options;
    let directory = options.directory.clone();
    let manager = tokio::task::spawn_blocking(move || {
        MetadataManager::initialize_with_progress(options, progress)
    })
    .await
    .context("Index initialization task failed")?
    .with_context(|| format!("Failed to initialize index for {}", directory.display()))?;
    let manager = Arc::new(manager);

    let server = Server::new(Arc::clone(&manager), ServerConfig::default());
    let app = server.router();

    let listener = tokio::net::TcpListener::bind(socket_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    display_server_info(&manager, &addr);
    eprintln!("\nPress Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("[Server] Stopped after {} lookups", manager.stats().lookups);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[Server] Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("[Server] Shutdown requested");
}

fn display_server_info(manager: &MetadataManager, addr: &str) {
    let stats = manager.stats();
    eprintln!("{} v{} HTTP server started", constants::BINARY_NAME, constants::VERSION);
    eprintln!("  Directory: {}", manager.directory().display());
    eprintln!("  Index:     {}", manager.index_path().display());
    eprintln!("  DOIs:      {}", crate::format::format_number(stats.indexed_dois));
    eprintln!("  Listening: http://{}", addr);
    eprintln!("  Lookup:    http://{}/id?doi=<doi>", addr);
}
