//! Ad-hoc sentiment analysis

use crate::api::SessionToken;
use crate::api::error::ApiResult;
use crate::api::sentiment::schemas::{AnalyzeBatch, AnalyzeText, AnalyzedText, BatchResults};
use crate::core::traits::{AuthService, FeedbackService};
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/analyze", post(analyze_text))
        .route("/batch", post(analyze_batch))
}

async fn analyze_text(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    request: Result<Json<AnalyzeText>, JsonRejection>,
) -> ApiResult<Json<AnalyzedText>> {
    auth_service.require_authenticated(&token).await?;
    let Json(request) = request?;
    let result = feedback_service.analyze_text(&request.text)?;
    Ok(Json(AnalyzedText {
        text: request.text,
        result,
    }))
}

async fn analyze_batch(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    request: Result<Json<AnalyzeBatch>, JsonRejection>,
) -> ApiResult<Json<BatchResults>> {
    auth_service.require_authenticated(&token).await?;
    let Json(request) = request?;
    let results = feedback_service.analyze_batch(&request.texts)?;
    Ok(Json(BatchResults {
        count: results.len(),
        negative_count: results.iter().filter(|r| r.is_negative).count(),
        results,
    }))
}

pub mod schemas {
    use crate::core::sentiment::SentimentResult;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct AnalyzeText {
        pub text: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct AnalyzeBatch {
        pub texts: Vec<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct AnalyzedText {
        pub text: String,
        #[serde(flatten)]
        pub result: SentimentResult,
    }

    #[derive(Serialize, Debug)]
    pub struct BatchResults {
        pub results: Vec<SentimentResult>,
        pub count: usize,
        /// Results flagged as high-confidence negative.
        pub negative_count: usize,
    }
}
