// RPC error taxonomy shared by the guard chain, input validation, handlers and transport
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::StoreError;
use crate::llm::LlmError;

/// Stable machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    BadInput,
    NotFound,
    UpstreamUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::BadInput => "BAD_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::BadInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-facing error returned by every procedure, whatever layer raised it
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    // 401
    Unauthorized(String),

    // 403
    Forbidden(String),

    // 400
    BadInput {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },

    // 404
    NotFound(String),

    // 503 (store or text-generation backend)
    UpstreamUnavailable(String),

    // 500
    Internal(String),
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Unauthorized(_) => ErrorKind::Unauthorized,
            RpcError::Forbidden(_) => ErrorKind::Forbidden,
            RpcError::BadInput { .. } => ErrorKind::BadInput,
            RpcError::NotFound(_) => ErrorKind::NotFound,
            RpcError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            RpcError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            RpcError::Unauthorized(msg) => msg,
            RpcError::Forbidden(msg) => msg,
            RpcError::BadInput { message, .. } => message,
            RpcError::NotFound(msg) => msg,
            RpcError::UpstreamUnavailable(msg) => msg,
            RpcError::Internal(msg) => msg,
        }
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            RpcError::BadInput { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "code": self.kind().as_str(),
            "message": self.message(),
        });

        if let Some(field_errors) = self.field_errors() {
            body["field_errors"] = json!(field_errors);
        }

        body
    }
}

impl RpcError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        RpcError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        RpcError::Forbidden(message.into())
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        RpcError::BadInput {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn invalid_fields(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        RpcError::BadInput {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RpcError::NotFound(message.into())
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        RpcError::UpstreamUnavailable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RpcError::Internal(message.into())
    }
}

// Backend errors are logged with their real cause and collapsed into client-safe shapes

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => RpcError::not_found(msg),
            StoreError::Rejected(msg) => RpcError::bad_input(msg),
            StoreError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                RpcError::upstream_unavailable("Database temporarily unavailable")
            }
            StoreError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                RpcError::upstream_unavailable("Service is being updated, please try again later")
            }
            StoreError::Sqlx(e) => {
                if StoreError::is_connectivity(&e) {
                    tracing::error!("Store connectivity error: {}", e);
                    RpcError::upstream_unavailable("Database temporarily unavailable")
                } else {
                    tracing::error!("SQLx error: {}", e);
                    RpcError::internal("Database error occurred")
                }
            }
        }
    }
}

impl From<LlmError> for RpcError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Task(msg) => {
                tracing::error!("Text generation task failed: {}", msg);
                RpcError::internal("Text generation failed")
            }
            other => {
                tracing::error!("Text generation backend error: {}", other);
                RpcError::upstream_unavailable("Text generation is temporarily unavailable")
            }
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for RpcError {}

impl IntoResponse for RpcError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
