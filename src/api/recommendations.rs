//! Recommendation endpoints

use crate::api::SessionToken;
use crate::api::error::ApiResult;
use crate::api::recommendations::schemas::{CatalogRecommendations, RecommendationQuery};
use crate::core::catalog::{Activity, Amenity, DiningVenue};
use crate::core::error::CoreError;
use crate::core::recommendations::{RecommendationBundle, resolve_target};
use crate::core::traits::{AuthService, RecommendationService};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(personalized))
        .route("/default", get(default_bundle))
        .route("/dining", get(dining))
        .route("/activities", get(activities))
        .route("/amenities", get(amenities))
        .route("/guest/:guest_id/latest", get(latest))
}

/// Bundle for the requested guest, or for the caller when none is named.
async fn bundle_for(
    auth_service: &dyn AuthService,
    recommendation_service: &dyn RecommendationService,
    token: &str,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<RecommendationBundle> {
    let user = auth_service.require_authenticated(token).await?;
    let Query(query) = query?;
    let guest_id = resolve_target(&user, query.guest_id.as_deref())?;
    Ok(recommendation_service.personalized(&guest_id).await)
}

async fn personalized(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<RecommendationBundle>> {
    let bundle = bundle_for(&*auth_service, &*recommendation_service, &token, query).await?;
    Ok(Json(bundle))
}

async fn dining(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<CatalogRecommendations<DiningVenue>>> {
    let bundle = bundle_for(&*auth_service, &*recommendation_service, &token, query).await?;
    Ok(Json(CatalogRecommendations {
        guest_id: bundle.guest_id,
        recommendations: bundle.dining,
    }))
}

async fn activities(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<CatalogRecommendations<Activity>>> {
    let bundle = bundle_for(&*auth_service, &*recommendation_service, &token, query).await?;
    Ok(Json(CatalogRecommendations {
        guest_id: bundle.guest_id,
        recommendations: bundle.activities,
    }))
}

async fn amenities(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<CatalogRecommendations<Amenity>>> {
    let bundle = bundle_for(&*auth_service, &*recommendation_service, &token, query).await?;
    Ok(Json(CatalogRecommendations {
        guest_id: bundle.guest_id,
        recommendations: bundle.amenities,
    }))
}

async fn default_bundle(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
) -> ApiResult<Json<RecommendationBundle>> {
    auth_service.require_authenticated(&token).await?;
    Ok(Json(recommendation_service.default_bundle()))
}

async fn latest(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(recommendation_service): Inject<dyn RecommendationService>,
    SessionToken(token): SessionToken,
    Path(guest_id): Path<String>,
) -> ApiResult<Json<RecommendationBundle>> {
    let user = auth_service.require_authenticated(&token).await?;
    let guest_id = resolve_target(&user, Some(&guest_id))?;

    recommendation_service
        .latest(&guest_id)
        .await
        .map(Json)
        .ok_or_else(|| CoreError::NotFound(format!("recommendations for {guest_id}")).into())
}

pub mod schemas {
    use crate::core::recommendations::Recommendation;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct RecommendationQuery {
        pub guest_id: Option<String>,
    }

    /// One catalog's slice of a guest's bundle.
    #[derive(Serialize, Debug)]
    pub struct CatalogRecommendations<T> {
        pub guest_id: String,
        pub recommendations: Vec<Recommendation<T>>,
    }
}
