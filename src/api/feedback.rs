//! Feedback endpoints

use crate::api::SessionToken;
use crate::api::error::ApiResult;
use crate::api::feedback::schemas::{
    FeedbackList, GuestFeedbackList, GuestInsightsView, SummaryQuery,
};
use crate::core::feedback::{
    FeedbackSubmission, FeedbackSummary, SentimentTrends, SubmissionReceipt, average_rating,
};
use crate::core::traits::{AuthService, FeedbackService};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

const DEFAULT_SUMMARY_DAYS: u32 = 7;
const DEFAULT_TREND_DAYS: u32 = 30;

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit_feedback))
        .route("/mine", get(my_feedback))
        .route("/guest/:guest_id", get(guest_feedback))
        .route("/guest/:guest_id/insights", get(guest_insights))
        .route("/summary", get(summary))
        .route("/trends", get(trends))
}

async fn submit_feedback(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    submission: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmissionReceipt>)> {
    let author = auth_service.require_authenticated(&token).await?;
    let Json(submission) = submission?;
    let receipt = feedback_service.submit_feedback(&author, submission).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn my_feedback(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
) -> ApiResult<Json<FeedbackList>> {
    let author = auth_service.require_authenticated(&token).await?;
    let records = feedback_service.my_feedback(&author).await?;
    Ok(Json(FeedbackList {
        count: records.len(),
        feedback: records,
    }))
}

async fn guest_feedback(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    Path(guest_id): Path<String>,
) -> ApiResult<Json<GuestFeedbackList>> {
    auth_service.require_staff(&token).await?;
    let records = feedback_service.guest_feedback(&guest_id).await?;
    Ok(Json(GuestFeedbackList {
        guest_id,
        count: records.len(),
        average_rating: average_rating(&records),
        feedback: records.into_iter().map(schemas::StaffFeedbackView::from).collect(),
    }))
}

async fn summary(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<FeedbackSummary>> {
    auth_service.require_staff(&token).await?;
    let Query(query) = query?;
    let days = query.days.unwrap_or(DEFAULT_SUMMARY_DAYS);
    Ok(Json(feedback_service.summarize(days).await?))
}

async fn trends(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<SentimentTrends>> {
    auth_service.require_staff(&token).await?;
    let Query(query) = query?;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(Json(feedback_service.sentiment_trends(days).await?))
}

async fn guest_insights(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(feedback_service): Inject<dyn FeedbackService>,
    SessionToken(token): SessionToken,
    Path(guest_id): Path<String>,
) -> ApiResult<Json<GuestInsightsView>> {
    auth_service.require_staff(&token).await?;
    let insights = feedback_service.guest_insights(&guest_id).await?;
    let history = feedback_service.guest_feedback(&guest_id).await?;
    Ok(Json(GuestInsightsView {
        insights,
        feedback_history: history.into_iter().map(schemas::StaffFeedbackView::from).collect(),
    }))
}

pub mod schemas {
    use crate::core::alerts::ANONYMOUS_NAME;
    use crate::core::feedback::GuestInsights;
    use crate::core::sentiment::SentimentResult;
    use crate::infrastructure::entities::{FeedbackCategory, FeedbackRecord, FeedbackStatus};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Debug)]
    pub struct FeedbackList {
        pub feedback: Vec<FeedbackRecord>,
        pub count: usize,
    }

    /// A record as shown to staff. Anonymous submissions hide the name.
    #[derive(Serialize, Debug)]
    pub struct StaffFeedbackView {
        pub feedback_id: String,
        pub guest_id: String,
        pub guest_name: String,
        pub rating: u8,
        pub category: FeedbackCategory,
        pub subject: String,
        pub comment: String,
        pub location: Option<String>,
        pub staff_member: Option<String>,
        pub anonymous: bool,
        pub sentiment: SentimentResult,
        pub submitted_at: DateTime<Utc>,
        pub status: FeedbackStatus,
    }

    impl From<FeedbackRecord> for StaffFeedbackView {
        fn from(record: FeedbackRecord) -> Self {
            StaffFeedbackView {
                guest_name: if record.anonymous {
                    ANONYMOUS_NAME.to_owned()
                } else {
                    record.guest_name
                },
                feedback_id: record.feedback_id,
                guest_id: record.guest_id,
                rating: record.rating,
                category: record.category,
                subject: record.subject,
                comment: record.comment,
                location: record.location,
                staff_member: record.staff_member,
                anonymous: record.anonymous,
                sentiment: record.sentiment,
                submitted_at: record.submitted_at,
                status: record.status,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct GuestFeedbackList {
        pub guest_id: String,
        pub feedback: Vec<StaffFeedbackView>,
        pub count: usize,
        pub average_rating: Option<f64>,
    }

    #[derive(Serialize, Debug)]
    pub struct GuestInsightsView {
        #[serde(flatten)]
        pub insights: GuestInsights,
        pub feedback_history: Vec<StaffFeedbackView>,
    }

    /// Trailing window in days, for the summary and the trends.
    #[derive(Deserialize, Debug)]
    pub struct SummaryQuery {
        pub days: Option<u32>,
    }
}
