// Status handler

use crate::server::ServerState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn handle_status(State(state): State<ServerState>) -> impl IntoResponse {
    let manager = &state.manager;
    let stats = manager.stats();

    let mut response = json!({
        "server": {
            "version": state.config.version,
            "uptime_seconds": state.start_time.elapsed().as_secs(),
        },
        "index": {
            "directory": manager.directory().display().to_string(),
            "path": manager.index_path().display().to_string(),
            "indexed_dois": stats.indexed_dois,
            "size_bytes": stats.index_size_bytes,
        },
        "lookups": stats,
    });

    if let Some(build) = manager.build_stats() {
        response["build"] = json!({
            "shards": build.shards,
            "workers": build.workers,
            "records": build.records,
            "skipped_empty": build.skipped_empty,
            "duplicates": build.duplicates,
            "elapsed_ms": build.elapsed.as_millis() as u64,
        });
    }

    (StatusCode::OK, axum::Json(response)).into_response()
}
