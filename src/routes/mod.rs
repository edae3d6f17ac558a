// HTTP routes: dump upload, status polling and result queries

mod error;
mod http;

pub use error::ApiError;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::ResultCache;
use crate::dump_repo::DumpRepo;
use crate::worker::JobRunner;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<DumpRepo>,
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) runner: Arc<JobRunner>,
}

/// `max_upload_bytes` bounds the request body (the decoder enforces the same limit).
pub fn app(
    repo: Arc<DumpRepo>,
    cache: Arc<ResultCache>,
    runner: Arc<JobRunner>,
    max_upload_bytes: usize,
) -> Router {
    let state = AppState {
        repo,
        cache,
        runner,
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route(
            "/api/dumps",
            post(http::upload_handler).get(http::list_handler),
        ) // POST, GET /api/dumps
        .route(
            "/api/dumps/{id}",
            get(http::dump_handler).delete(http::delete_handler),
        ) // GET, DELETE /api/dumps/{id}
        .route("/api/dumps/{id}/records", get(http::records_handler))
        .route("/api/dumps/{id}/analysis", get(http::analysis_handler))
        .route("/api/dumps/{id}/stats", get(http::stats_handler))
        .route("/api/dumps/{id}/decode-stats", get(http::decode_stats_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
