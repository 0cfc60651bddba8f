//! Login, logout and the current user

use crate::api::auth::schemas::{
    AuthStatus, LoginRequest, LoginResponse, LogoutResponse, MeResponse,
};
use crate::api::error::ApiResult;
use crate::api::{SessionToken, expired_session_cookie, session_cookie};
use crate::core::auth::SESSION_TTL_HOURS;
use crate::core::traits::{AuthService, RecommendationService};
use crate::infrastructure::entities::Role;
use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use log::warn;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/status", get(status))
}

async fn login(
    Inject(auth_service): Inject<dyn AuthService>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = request?;
    let (user, session) = auth_service
        .login(&request.username, &request.password)
        .await?;

    let cookie = session_cookie(&session.token, SESSION_TTL_HOURS * 3600);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.token,
            token_type: "bearer",
            expires_at: session.expires_at,
            user,
        }),
    ))
}

async fn logout(
    Inject(auth_service): Inject<dyn AuthService>,
    SessionToken(token): SessionToken,
) -> impl IntoResponse {
    let logged_out = auth_service.end_session(&token).await;
    (
        [(SET_COOKIE, expired_session_cookie())],
        Json(LogoutResponse { logged_out }),
    )
}

async fn me(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
) -> ApiResult<Json<MeResponse>> {
    let user = auth_service.require_authenticated(&token).await?;
    let profile = match user.role {
        Role::Guest => recommendation_service.profile(&user.user_id).await?,
        _ => None,
    };
    Ok(Json(MeResponse { user, profile }))
}

/// Whether the caller holds a live session. Never fails.
async fn status(
    Inject(auth_service): Inject<dyn AuthService>,
    token: Option<SessionToken>,
) -> Json<AuthStatus> {
    let user = match token {
        Some(SessionToken(token)) => auth_service
            .resolve_session(&token)
            .await
            .unwrap_or_else(|e| {
                warn!("session status lookup failed: {e}");
                None
            }),
        None => None,
    };
    Json(AuthStatus {
        authenticated: user.is_some(),
        user,
    })
}

pub mod schemas {
    use crate::infrastructure::entities::{GuestProfile, User};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    pub struct LoginRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Serialize, Debug)]
    pub struct LoginResponse {
        pub token: String,
        pub token_type: &'static str,
        pub expires_at: DateTime<Utc>,
        pub user: User,
    }

    #[derive(Serialize, Debug)]
    pub struct LogoutResponse {
        pub logged_out: bool,
    }

    #[derive(Serialize, Debug)]
    pub struct AuthStatus {
        pub authenticated: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user: Option<User>,
    }

    #[derive(Serialize, Debug)]
    pub struct MeResponse {
        pub user: User,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub profile: Option<GuestProfile>,
    }
}
