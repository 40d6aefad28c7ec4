use crate::server::ServerState;
use crate::server::error::{bad_request, index_error, task_join_error};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Deserialize)]
pub struct RandomQuery {
    pub shards: Option<usize>,
    pub per_shard: Option<usize>,
    pub seed: Option<u64>,
}

pub async fn handle_random_dois(
    State(state): State<ServerState>,
    Query(params): Query<RandomQuery>,
) -> impl IntoResponse {
    let shards = params.shards.unwrap_or(1);
    let per_shard = params.per_shard.unwrap_or(10);
    if shards > state.config.max_random_shards {
        return bad_request(&format!(
            "shards must be <= {}",
            state.config.max_random_shards
        ));
    }
    if per_shard > state.config.max_random_per_shard {
        return bad_request(&format!(
            "per_shard must be <= {}",
            state.config.max_random_per_shard
        ));
    }

    let effective_seed = params.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });

    let dois = match tokio::task::spawn_blocking({
        let manager = Arc::clone(&state.manager);
        move || manager.random_dois(shards, per_shard, Some(effective_seed))
    })
    .await
    {
        Ok(Ok(list)) => list,
        Ok(Err(e)) => return index_error(&e),
        Err(e) => return task_join_error(e),
    };

    (
        StatusCode::OK,
        axum::Json(json!({
            "dois": dois,
            "count": dois.len(),
            "seed": effective_seed
        })),
    )
        .into_response()
}
