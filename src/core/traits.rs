//! DI "Interfaces"

use crate::core::alerts::{Alert, AlertCounts};
use crate::core::auth::Session;
use crate::core::error::{CoreError, CoreResult};
use crate::core::feedback::{
    FeedbackSubmission, FeedbackSummary, GuestInsights, SentimentTrends, SubmissionReceipt,
};
use crate::core::recommendations::RecommendationBundle;
use crate::core::sentiment::SentimentResult;
use crate::infrastructure::entities::{FeedbackRecord, GuestProfile, NewUser, Role, User};
use async_trait::async_trait;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Checks a username/password pair against the user store.
    ///
    /// Returns `InvalidCredentials` for unknown users, wrong passwords and
    /// deactivated accounts alike.
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<User>;

    /// Registers a new session for `user`, valid for 24 hours.
    async fn create_session(&self, user: &User) -> Session;

    /// Resolves a token to its live user.
    ///
    /// Expired sessions are removed on this lookup. Returns `Ok(None)` for
    /// unknown or expired tokens and for sessions whose user has since
    /// disappeared or been deactivated.
    async fn resolve_session(&self, token: &str) -> CoreResult<Option<User>>;

    /// Removes the session if present. Idempotent.
    async fn end_session(&self, token: &str) -> bool;

    /// Drops every expired session. Returns how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Creates a user with the next sequential id for its role.
    ///
    /// Returns `UsernameTaken` if the username exists in any letter case.
    async fn create_user(&self, new_user: NewUser) -> CoreResult<User>;

    async fn set_user_active(&self, user_id: &str, active: bool) -> CoreResult<()>;

    async fn set_user_role(&self, user_id: &str, role: Role) -> CoreResult<()>;

    async fn login(&self, username: &str, password: &str) -> CoreResult<(User, Session)> {
        let user = self.authenticate(username, password).await?;
        let session = self.create_session(&user).await;
        Ok((user, session))
    }

    async fn require_authenticated(&self, token: &str) -> CoreResult<User> {
        self.resolve_session(token)
            .await?
            .ok_or(CoreError::Unauthenticated)
    }

    async fn require_staff(&self, token: &str) -> CoreResult<User> {
        let user = self.require_authenticated(token).await?;
        if user.role.is_staff() {
            Ok(user)
        } else {
            Err(CoreError::Forbidden("staff"))
        }
    }

    async fn require_admin(&self, token: &str) -> CoreResult<User> {
        let user = self.require_authenticated(token).await?;
        if user.role == Role::Admin {
            Ok(user)
        } else {
            Err(CoreError::Forbidden("admin"))
        }
    }

    /// Registers a guest account.
    async fn create_guest_user(&self, mut new_user: NewUser) -> CoreResult<User> {
        new_user.role = Role::Guest;
        self.create_user(new_user).await
    }
}

#[async_trait]
pub trait AlertService: Send + Sync {
    /// Builds the alert for an accepted submission and puts it at the head
    /// of the queue.
    async fn create_alert(&self, feedback: &FeedbackRecord, sentiment: &SentimentResult) -> Alert;

    /// `None` if the alert is unknown, `Some(false)` if it was already read
    /// (the first reader is kept), `Some(true)` if it was marked now.
    async fn mark_read(&self, alert_id: &str, reader: &str) -> Option<bool>;

    /// Most recent first, at most `limit` entries.
    async fn list_alerts(&self, limit: usize, unread_only: bool) -> Vec<Alert>;

    async fn counts(&self) -> AlertCounts;
}

#[async_trait]
pub trait FeedbackService: Send + Sync {
    /// Validates, classifies and stores a submission, then raises its alert.
    async fn submit_feedback(
        &self,
        author: &User,
        submission: FeedbackSubmission,
    ) -> CoreResult<SubmissionReceipt>;

    /// The author's own records, most recent first.
    async fn my_feedback(&self, author: &User) -> CoreResult<Vec<FeedbackRecord>>;

    async fn guest_feedback(&self, guest_id: &str) -> CoreResult<Vec<FeedbackRecord>>;

    async fn summarize(&self, days: u32) -> CoreResult<FeedbackSummary>;

    /// Daily sentiment shares over the trailing `days`.
    async fn sentiment_trends(&self, days: u32) -> CoreResult<SentimentTrends>;

    /// `NotFound` when no guest profile exists for `guest_id`.
    async fn guest_insights(&self, guest_id: &str) -> CoreResult<GuestInsights>;

    fn analyze_text(&self, text: &str) -> CoreResult<SentimentResult>;

    fn analyze_batch(&self, texts: &[String]) -> CoreResult<Vec<SentimentResult>>;
}

#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Never fails: unknown guests and internal errors yield the default bundle.
    async fn personalized(&self, guest_id: &str) -> RecommendationBundle;

    fn default_bundle(&self) -> RecommendationBundle;

    /// Most recently generated bundle for the guest, if any.
    async fn latest(&self, guest_id: &str) -> Option<RecommendationBundle>;

    async fn profile(&self, guest_id: &str) -> CoreResult<Option<GuestProfile>>;
}
