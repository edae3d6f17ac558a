// Handlers: version, dump upload/list/status/delete, published result queries

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::dump_repo::DeleteOutcome;
use crate::models::DumpFormat;
use crate::pipeline::ProcessedDump;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadParams {
    filename: Option<String>,
    /// Declared format; validated against the content, never trusted.
    format: Option<String>,
}

/// POST /api/dumps: accept the raw artifact, answer 202 with the pending dump.
pub(super) async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let declared = match params.format.as_deref() {
        None | Some("") => None,
        Some(s) => Some(DumpFormat::parse(s).ok_or_else(|| {
            ApiError::BadRequest(format!("format must be one of mp, mdg, mixed; got {:?}", s))
        })?),
    };
    let filename = params
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "upload.bin".to_string());

    let dump = state
        .repo
        .create_dump(&filename, declared, body.len() as u64)
        .await?;
    tracing::info!(
        dump_id = dump.id,
        filename = %dump.filename,
        size_bytes = dump.size_bytes,
        operation = "upload",
        "dump accepted"
    );
    state.runner.submit(&dump, body);
    Ok((StatusCode::ACCEPTED, axum::Json(dump)).into_response())
}

/// GET /api/dumps: status rows, newest first.
pub(super) async fn list_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let dumps = state.repo.list_dumps().await?;
    Ok(axum::Json(dumps).into_response())
}

/// GET /api/dumps/{id}: status surface.
pub(super) async fn dump_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let dump = state.repo.get_dump(id).await?.ok_or(ApiError::NotFound(id))?;
    Ok(axum::Json(dump).into_response())
}

/// DELETE /api/dumps/{id}: discard a completed or failed dump.
pub(super) async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_dump(id).await? {
        DeleteOutcome::Deleted => {
            state.cache.invalidate(id).await;
            tracing::info!(dump_id = id, operation = "delete", "dump discarded");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::NotFound => Err(ApiError::NotFound(id)),
        DeleteOutcome::InFlight(status) => Err(ApiError::InFlight { id, status }),
    }
}

/// GET /api/dumps/{id}/records
pub(super) async fn records_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let outputs = published(&state, id).await?;
    Ok(axum::Json(&outputs.records).into_response())
}

/// GET /api/dumps/{id}/analysis
pub(super) async fn analysis_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let outputs = published(&state, id).await?;
    Ok(axum::Json(&outputs.analysis).into_response())
}

/// GET /api/dumps/{id}/stats
pub(super) async fn stats_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let outputs = published(&state, id).await?;
    Ok(axum::Json(&outputs.stats).into_response())
}

/// GET /api/dumps/{id}/decode-stats
pub(super) async fn decode_stats_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let outputs = published(&state, id).await?;
    Ok(axum::Json(&outputs.decode_stats).into_response())
}

/// Published outputs, or 404 / 409 with the dump's current status.
async fn published(state: &AppState, id: i64) -> Result<Arc<ProcessedDump>, ApiError> {
    if let Some(outputs) = state.cache.get_or_load(&state.repo, id).await? {
        return Ok(outputs);
    }
    let dump = state.repo.get_dump(id).await?.ok_or(ApiError::NotFound(id))?;
    Err(ApiError::NotReady {
        id,
        status: dump.status,
    })
}
