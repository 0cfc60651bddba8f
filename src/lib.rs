//! Guest feedback, alerting and recommendation service - library exports for testing
//!

pub mod api;
pub mod core;
pub mod infrastructure;

use crate::core::alerts::InMemoryAlertQueue;
use crate::core::auth::SessionAuthService;
use crate::core::recommendations::PersonalizedRecommendationService;
use crate::core::services::MyFeedbackService;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::notifier::WebhookNotifier;
use crate::infrastructure::repositories::{
    DbFeedbackRepository, DbGuestProfileRepository, DbUserRepository,
};
use axum::routing::get;
use axum::{Json, Router};
use di::{Injectable, ServiceCollection};
use serde_json::{Value, json};

/// Every component of the service. All of them are singletons: the session
/// table, alert queue and recommendation memo must outlive single requests.
pub fn service_collection() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(AppConfig::singleton())
        .add(DatabaseConnection::singleton())
        .add(DbUserRepository::singleton())
        .add(DbFeedbackRepository::singleton())
        .add(DbGuestProfileRepository::singleton())
        .add(WebhookNotifier::singleton())
        .add(SessionAuthService::singleton())
        .add(InMemoryAlertQueue::singleton())
        .add(MyFeedbackService::singleton())
        .add(PersonalizedRecommendationService::singleton());
    services
}

/// All routes, without a provider attached.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", api::auth::router())
        .nest("/admin", api::admin::router())
        .nest("/feedback", api::feedback::router())
        .nest("/alerts", api::alerts::router())
        .nest("/sentiment", api::sentiment::router())
        .nest("/recommendations", api::recommendations::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
