// Root page handler

use crate::constants;
use crate::format::{format_bytes, format_duration_auto, format_number};
use crate::server::ServerState;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};

pub async fn handle_root(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = state.manager.stats();
    let uptime = state.start_time.elapsed();

    let mut response = String::new();
    response.push_str(&format!(
        "\n  {} server v{}\n\n",
        constants::BINARY_NAME,
        state.config.version
    ));
    response.push_str("Crossref metadata lookups by DOI, served from a sharded dump.\n\n");

    response.push_str("Index\n");
    response.push_str("━━━━━\n");
    response.push_str(&format!(
        "  Directory:     {}\n",
        state.manager.directory().display()
    ));
    response.push_str(&format!(
        "  DOIs:          {}\n",
        format_number(stats.indexed_dois)
    ));
    response.push_str(&format!(
        "  Size:          {}\n",
        format_bytes(stats.index_size_bytes)
    ));
    response.push_str(&format!("  Lookups:       {}\n", format_number(stats.lookups)));
    response.push_str(&format!("  Uptime:        {}\n\n", format_duration_auto(uptime)));

    response.push_str("Endpoints\n");
    response.push_str("━━━━━━━━━\n");
    response.push_str("  GET /id?doi=<doi>                       Full record for a DOI\n");
    response.push_str("  GET /random?shards=&per_shard=&seed=    Random DOIs for testing\n");
    response.push_str("  GET /status                             Index and lookup statistics\n");

    let mut headers = HeaderMap::new();
    headers.insert(
        "Content-Type",
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    (StatusCode::OK, headers, response).into_response()
}
