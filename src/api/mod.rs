use crate::api::error::ApiError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

pub mod admin;
pub mod alerts;
pub mod auth;
pub mod error;
pub mod feedback;
pub mod recommendations;
pub mod sentiment;

pub const SESSION_COOKIE: &str = "session_token";
const BEARER_PREFIX: &str = "Bearer ";

/// Session token presented by the caller, from `Authorization: Bearer` or
/// the session cookie. Only extracted here; resolving it is up to the
/// handler.
#[derive(Debug)]
pub struct SessionToken(pub String);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .map(|token| SessionToken(token.to_owned()))
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

pub fn expired_session_cookie() -> String {
    session_cookie("", 0)
}
