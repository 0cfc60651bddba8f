//! Domain errors shared by the core services.

use crate::infrastructure::traits::StoreError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Username/password pair did not match an active account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session, or the session is unknown or expired.
    #[error("authentication required")]
    Unauthenticated,

    /// Valid session with insufficient role.
    #[error("{0} access required")]
    Forbidden(&'static str),

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("record store failure: {0}")]
    Persistence(#[from] StoreError),

    /// Server-side fault unrelated to the caller's input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            message: message.into(),
        }
    }
}
