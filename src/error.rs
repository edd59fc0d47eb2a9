//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Configuration-time failures. All of these surface before any statement is emitted
/// or any query is executed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cyclic dependency between resources: {}", resources.join(" -> "))]
    CyclicDependency { resources: Vec<String> },
    #[error("unknown resource '{target}' referenced by relationship '{resource}.{relationship}'")]
    UnknownResource {
        resource: String,
        relationship: String,
        target: String,
    },
    #[error("ambiguous relationship '{resource}.{relationship}': {}", describe_candidates(candidates))]
    AmbiguousRelationship {
        resource: String,
        relationship: String,
        candidates: Vec<String>,
    },
    #[error("invalid {kind} '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("duplicate relationship '{relationship}' on resource '{resource}'")]
    DuplicateRelationship { resource: String, relationship: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

fn describe_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "no inverse relationship found on target".to_string()
    } else {
        format!("multiple inverse candidates on target ({})", candidates.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The transactional apply of a migration batch failed. Not retried.
    #[error("migration apply failed: {0}")]
    Apply(#[source] sqlx::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub status: String,
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn single(status: StatusCode, code: &str, detail: Option<String>) -> Self {
        ErrorBody {
            errors: vec![ErrorDetail {
                status: status.as_u16().to_string(),
                code: code.to_string(),
                title: status.canonical_reason().unwrap_or("Error").to_string(),
                detail,
            }],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Apply(_) => (StatusCode::INTERNAL_SERVER_ERROR, "apply_failure"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody::single(status, code, Some(self.to_string()));
        (status, Json(body)).into_response()
    }
}
