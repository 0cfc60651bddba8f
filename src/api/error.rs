//! HTTP error responses
//!
//! Every failure is rendered as `{"error": {"code": ..., "message": ...}}`.

use crate::core::error::CoreError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that is not JSON at all.
    #[error("{0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthenticated() -> ApiError {
        ApiError::Core(CoreError::Unauthenticated)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // well-formed JSON whose fields have the wrong shape
            JsonRejection::JsonDataError(e) => {
                ApiError::Core(CoreError::validation("body", e.body_text()))
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Core(CoreError::validation("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            ApiError::Core(CoreError::Persistence(e)) => {
                error!("request failed on the record store: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_FAILURE",
                    "the record store is unavailable".to_owned(),
                )
            }
            ApiError::Core(CoreError::Internal(e)) => {
                error!("request failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal server error".to_owned(),
                )
            }
            ApiError::Core(core) => {
                let (status, code) = match &core {
                    // same code as a missing session: never reveal which field was wrong
                    CoreError::InvalidCredentials | CoreError::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED")
                    }
                    CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    CoreError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION"),
                    CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CoreError::UsernameTaken(_) => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
                    CoreError::Persistence(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILURE")
                    }
                    CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
                };
                (status, code, core.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
