// HTTP lookup service over a MetadataManager

mod config;
mod error;
mod handle_id;
mod handle_random;
mod handle_root;
mod handle_status;
mod routes;
mod startup;

use crate::manager::MetadataManager;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

pub use config::ServerConfig;
pub use startup::{ProgressCallback, StartupConfig, start_server};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ServerState {
    pub manager: Arc<MetadataManager>,
    pub config: ServerConfig,
    pub start_time: Instant,
}

pub struct Server {
    manager: Arc<MetadataManager>,
    config: ServerConfig,
    start_time: Instant,
}

impl Server {
    pub fn new(manager: Arc<MetadataManager>, config: ServerConfig) -> Self {
        Self {
            manager,
            config,
            start_time: Instant::now(),
        }
    }

    pub fn router(&self) -> Router {
        routes::create_router(ServerState {
            manager: Arc::clone(&self.manager),
            config: self.config.clone(),
            start_time: self.start_time,
        })
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }
}
