// API error -> HTTP status + JSON body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::DumpStatus;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("dump {0} not found")]
    NotFound(i64),
    #[error("dump {id} is {status}; results are only available once completed")]
    NotReady { id: i64, status: DumpStatus },
    #[error("dump {id} is {status}; only completed or failed dumps can be deleted")]
    InFlight { id: i64, status: DumpStatus },
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotReady { .. } | ApiError::InFlight { .. } => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = match &self {
            ApiError::NotReady { status, .. } | ApiError::InFlight { status, .. } => {
                serde_json::json!({ "error": self.to_string(), "status": status })
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                serde_json::json!({ "error": "internal server error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (code, axum::Json(body)).into_response()
    }
}
