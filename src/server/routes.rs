// Route setup

use crate::server::ServerState;
use crate::server::handle_id::handle_id;
use crate::server::handle_random::handle_random_dois;
use crate::server::handle_root::handle_root;
use crate::server::handle_status::handle_status;
use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/id", get(handle_id))
        .route("/random", get(handle_random_dois))
        .route("/status", get(handle_status))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
