//! Alert queue endpoints, staff and admin only

use crate::api::SessionToken;
use crate::api::alerts::schemas::{AlertList, ListAlertsQuery, MarkedRead};
use crate::api::error::ApiResult;
use crate::core::alerts::ALERT_CAPACITY;
use crate::core::error::CoreError;
use crate::core::traits::{AlertService, AuthService};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

const DEFAULT_LIMIT: usize = 20;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_alerts))
        .route("/:alert_id/read", post(mark_read))
}

async fn list_alerts(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(alert_service): Inject<dyn AlertService>,
    SessionToken(token): SessionToken,
    query: Result<Query<ListAlertsQuery>, QueryRejection>,
) -> ApiResult<Json<AlertList>> {
    auth_service.require_staff(&token).await?;
    let Query(query) = query?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(ALERT_CAPACITY);
    let alerts = alert_service
        .list_alerts(limit, query.unread_only.unwrap_or(false))
        .await;
    let counts = alert_service.counts().await;

    Ok(Json(AlertList {
        alerts,
        unread_count: counts.unread,
        total_count: counts.total,
    }))
}

async fn mark_read(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(alert_service): Inject<dyn AlertService>,
    SessionToken(token): SessionToken,
    Path(alert_id): Path<String>,
) -> ApiResult<Json<MarkedRead>> {
    let reader = auth_service.require_staff(&token).await?;

    match alert_service.mark_read(&alert_id, &reader.username).await {
        Some(newly_read) => Ok(Json(MarkedRead {
            alert_id,
            already_read: !newly_read,
        })),
        None => Err(CoreError::NotFound(format!("alert {alert_id}")).into()),
    }
}

pub mod schemas {
    use crate::core::alerts::Alert;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct ListAlertsQuery {
        pub limit: Option<usize>,
        pub unread_only: Option<bool>,
    }

    #[derive(Serialize, Debug)]
    pub struct AlertList {
        pub alerts: Vec<Alert>,
        pub unread_count: usize,
        pub total_count: usize,
    }

    #[derive(Serialize, Debug)]
    pub struct MarkedRead {
        pub alert_id: String,
        pub already_read: bool,
    }
}
