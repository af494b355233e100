//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use murmur_store::StoreError;
use murmur_votes::VoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Storage kept failing transiently; the client may retry later.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VoteError> for RpcError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::StorageExhausted { .. } => RpcError::Unavailable(e.to_string()),
            VoteError::Store(inner) => inner.into(),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            RpcError::Unavailable(e.to_string())
        } else {
            RpcError::Store(e.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for RpcError {
    fn from(e: tokio::task::JoinError) -> Self {
        RpcError::Server(format!("blocking task failed: {e}"))
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
