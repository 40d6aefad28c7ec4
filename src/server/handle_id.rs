// DOI lookup handler

use crate::server::ServerState;
use crate::server::error::{bad_request, index_error, internal_error, task_join_error};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct IdQuery {
    pub doi: Option<String>,
}

/// `GET /id?doi=<doi>`: the full record as pretty-printed JSON
pub async fn handle_id(
    State(state): State<ServerState>,
    Query(params): Query<IdQuery>,
) -> impl IntoResponse {
    let doi = match params.doi {
        Some(doi) if !doi.trim().is_empty() => doi,
        _ => return bad_request("Missing 'doi' query parameter").into_response(),
    };

    let result = match tokio::task::spawn_blocking({
        let manager = Arc::clone(&state.manager);
        move || manager.lookup_with_stats(&doi)
    })
    .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => return index_error(&e),
        Err(e) => return task_join_error(e),
    };

    let body = match serde_json::to_string_pretty(&result.record) {
        Ok(body) => body,
        Err(e) => return internal_error(&e.to_string()),
    };

    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    if let Ok(shard) = HeaderValue::from_str(&result.shard_id.to_string()) {
        headers.insert("X-Shard-Id", shard);
    }
    if let Ok(elapsed) = HeaderValue::from_str(&format!(
        "{:.3}",
        result.total_time.as_secs_f64() * 1000.0
    )) {
        headers.insert("X-Lookup-Ms", elapsed);
    }

    (StatusCode::OK, headers, body).into_response()
}
