//! User administration, admin role only

use crate::api::SessionToken;
use crate::api::admin::schemas::{CreateGuest, CreateUser, SetActive, SetRole, UserChanged};
use crate::api::error::ApiResult;
use crate::core::traits::AuthService;
use crate::infrastructure::entities::User;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;
use log::info;

pub fn router() -> Router {
    Router::new()
        .route("/guests", post(create_guest))
        .route("/users", post(create_user))
        .route("/users/:user_id/active", post(set_active))
        .route("/users/:user_id/role", post(set_role))
}

async fn create_guest(
    Inject(auth_service): Inject<dyn AuthService>,
    SessionToken(token): SessionToken,
    request: Result<Json<CreateGuest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let admin = auth_service.require_admin(&token).await?;
    let Json(request) = request?;
    let guest = auth_service.create_guest_user(request.into()).await?;
    info!("{} registered guest {}", admin.user_id, guest.user_id);
    Ok((StatusCode::CREATED, Json(guest)))
}

async fn create_user(
    Inject(auth_service): Inject<dyn AuthService>,
    SessionToken(token): SessionToken,
    request: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let admin = auth_service.require_admin(&token).await?;
    let Json(request) = request?;
    let user = auth_service.create_user(request.into()).await?;
    info!("{} registered {} {}", admin.user_id, user.role, user.user_id);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn set_active(
    Inject(auth_service): Inject<dyn AuthService>,
    SessionToken(token): SessionToken,
    Path(user_id): Path<String>,
    request: Result<Json<SetActive>, JsonRejection>,
) -> ApiResult<Json<UserChanged>> {
    auth_service.require_admin(&token).await?;
    let Json(request) = request?;
    auth_service
        .set_user_active(&user_id, request.active)
        .await?;
    Ok(Json(UserChanged {
        user_id,
        active: Some(request.active),
        role: None,
    }))
}

async fn set_role(
    Inject(auth_service): Inject<dyn AuthService>,
    SessionToken(token): SessionToken,
    Path(user_id): Path<String>,
    request: Result<Json<SetRole>, JsonRejection>,
) -> ApiResult<Json<UserChanged>> {
    auth_service.require_admin(&token).await?;
    let Json(request) = request?;
    auth_service.set_user_role(&user_id, request.role).await?;
    Ok(Json(UserChanged {
        user_id,
        active: None,
        role: Some(request.role),
    }))
}

pub mod schemas {
    use crate::infrastructure::entities::{NewUser, Role};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    pub struct CreateGuest {
        pub username: String,
        pub password: String,
        pub first_name: String,
        pub last_name: String,
        #[serde(default)]
        pub email: String,
        pub loyalty_tier: Option<String>,
    }

    impl From<CreateGuest> for NewUser {
        fn from(guest: CreateGuest) -> Self {
            NewUser {
                username: guest.username,
                password: guest.password,
                role: Role::Guest,
                first_name: guest.first_name,
                last_name: guest.last_name,
                email: guest.email,
                loyalty_tier: guest.loyalty_tier,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct CreateUser {
        #[serde(flatten)]
        pub fields: CreateGuest,
        pub role: Role,
    }

    impl From<CreateUser> for NewUser {
        fn from(user: CreateUser) -> Self {
            let fields: NewUser = user.fields.into();
            NewUser {
                role: user.role,
                ..fields
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct SetActive {
        pub active: bool,
    }

    #[derive(Deserialize, Debug)]
    pub struct SetRole {
        pub role: Role,
    }

    #[derive(Serialize, Debug)]
    pub struct UserChanged {
        pub user_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub active: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub role: Option<Role>,
    }
}
