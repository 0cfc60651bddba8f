//! Implementations for the feedback service the app needs.
//!

use crate::core::alerts::generate_id;
use crate::core::error::{CoreError, CoreResult};
use crate::core::feedback::{
    FeedbackSubmission, FeedbackSummary, GuestInsights, MAX_BATCH, MAX_SUMMARY_DAYS,
    SentimentTrends, SubmissionReceipt,
};
use crate::core::sentiment::{SentimentClassifier, SentimentResult};
use crate::core::traits::{AlertService, FeedbackService};
use crate::infrastructure::entities::{FeedbackRecord, FeedbackStatus, User};
use crate::infrastructure::traits::{AlertNotifier, FeedbackRepository, GuestProfileRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, inject, injectable};
use log::{error, info};

pub struct MyFeedbackService {
    feedback: Ref<dyn FeedbackRepository>,
    profiles: Ref<dyn GuestProfileRepository>,
    alerts: Ref<dyn AlertService>,
    notifier: Ref<dyn AlertNotifier>,
    classifier: SentimentClassifier,
}

#[injectable(FeedbackService)]
impl MyFeedbackService {
    #[inject]
    pub fn create(
        feedback: Ref<dyn FeedbackRepository>,
        profiles: Ref<dyn GuestProfileRepository>,
        alerts: Ref<dyn AlertService>,
        notifier: Ref<dyn AlertNotifier>,
    ) -> MyFeedbackService {
        MyFeedbackService::with_classifier(
            feedback,
            profiles,
            alerts,
            notifier,
            SentimentClassifier::default(),
        )
    }
}

impl MyFeedbackService {
    pub fn with_classifier(
        feedback: Ref<dyn FeedbackRepository>,
        profiles: Ref<dyn GuestProfileRepository>,
        alerts: Ref<dyn AlertService>,
        notifier: Ref<dyn AlertNotifier>,
        classifier: SentimentClassifier,
    ) -> MyFeedbackService {
        MyFeedbackService {
            feedback,
            profiles,
            alerts,
            notifier,
            classifier,
        }
    }
}

fn check_window(days: u32) -> CoreResult<()> {
    if days == 0 || days > MAX_SUMMARY_DAYS {
        return Err(CoreError::validation(
            "days",
            format!("must be between 1 and {MAX_SUMMARY_DAYS}"),
        ));
    }
    Ok(())
}

#[async_trait]
impl FeedbackService for MyFeedbackService {
    async fn submit_feedback(
        &self,
        author: &User,
        submission: FeedbackSubmission,
    ) -> CoreResult<SubmissionReceipt> {
        let submission = submission.validate()?;
        let sentiment = self.classifier.classify(&submission.comment);
        let submitted_at = Utc::now();

        let guest_name = match author.display_name() {
            name if name.is_empty() => author.username.clone(),
            name => name,
        };

        let record = FeedbackRecord {
            feedback_id: generate_id("FB", submitted_at),
            guest_id: author.user_id.clone(),
            guest_name,
            rating: submission.rating,
            category: submission.category,
            subject: submission.subject,
            comment: submission.comment,
            location: submission.location,
            staff_member: submission.staff_member,
            anonymous: submission.anonymous,
            sentiment: sentiment.clone(),
            submitted_at,
            status: FeedbackStatus::New,
        };

        // Nothing is alerted for a submission that was not stored.
        self.feedback.append(&record).await.inspect_err(|e| {
            error!("feedback {} was not stored: {e}", record.feedback_id);
        })?;

        let alert = self.alerts.create_alert(&record, &sentiment).await;
        self.notifier.notify(&alert);

        info!(
            "Feedback {} from {} accepted (rating {}, {} {:.2})",
            record.feedback_id, record.guest_id, record.rating, sentiment.sentiment, sentiment.confidence
        );

        Ok(SubmissionReceipt {
            feedback_id: record.feedback_id,
            sentiment: sentiment.sentiment,
            confidence: sentiment.confidence,
            alert_created: true,
            alert_id: alert.alert_id,
        })
    }

    async fn my_feedback(&self, author: &User) -> CoreResult<Vec<FeedbackRecord>> {
        Ok(self.feedback.list_by_guest(&author.user_id).await?)
    }

    async fn guest_feedback(&self, guest_id: &str) -> CoreResult<Vec<FeedbackRecord>> {
        Ok(self.feedback.list_by_guest(guest_id).await?)
    }

    async fn summarize(&self, days: u32) -> CoreResult<FeedbackSummary> {
        check_window(days)?;
        let records = self.feedback.list_recent(days).await?;
        Ok(FeedbackSummary::from_records(days, &records))
    }

    async fn sentiment_trends(&self, days: u32) -> CoreResult<SentimentTrends> {
        check_window(days)?;
        let records = self.feedback.list_recent(days).await?;
        Ok(SentimentTrends::from_records(days, &records))
    }

    async fn guest_insights(&self, guest_id: &str) -> CoreResult<GuestInsights> {
        let profile = self
            .profiles
            .get(guest_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("guest {guest_id}")))?;
        let records = self.feedback.list_by_guest(guest_id).await?;
        Ok(GuestInsights::build(&profile, &records))
    }

    fn analyze_text(&self, text: &str) -> CoreResult<SentimentResult> {
        if text.trim().is_empty() {
            return Err(CoreError::validation("text", "must not be empty"));
        }
        Ok(self.classifier.classify(text))
    }

    fn analyze_batch(&self, texts: &[String]) -> CoreResult<Vec<SentimentResult>> {
        if texts.len() > MAX_BATCH {
            return Err(CoreError::validation(
                "texts",
                format!("at most {MAX_BATCH} texts per batch, got {}", texts.len()),
            ));
        }
        Ok(self.classifier.analyze_batch(texts))
    }
}
