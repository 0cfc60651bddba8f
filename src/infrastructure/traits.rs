//! Infrastructure traits, used for DI on higher levels

use crate::core::alerts::Alert;
use crate::infrastructure::entities;
use crate::infrastructure::entities::Role;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<entities::UserRecord>>;

    /// Exact, case-sensitive match.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<entities::UserRecord>>;

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<entities::UserRecord>>;

    /// Case-insensitive match.
    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    async fn count_by_role(&self, role: Role) -> StoreResult<i64>;

    /// Returns `StoreError::Conflict` if the id or username already exists.
    async fn append_user(&self, user: entities::UserRecord) -> StoreResult<()>;

    /// Returns `false` if no such user exists.
    async fn set_active(&self, user_id: &str, active: bool) -> StoreResult<bool>;

    /// Returns `false` if no such user exists.
    async fn set_role(&self, user_id: &str, role: Role) -> StoreResult<bool>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn append(&self, record: &entities::FeedbackRecord) -> StoreResult<()>;

    /// Most recent first.
    async fn list_by_guest(&self, guest_id: &str) -> StoreResult<Vec<entities::FeedbackRecord>>;

    /// Records submitted within the last `days` days, most recent first.
    async fn list_recent(&self, days: u32) -> StoreResult<Vec<entities::FeedbackRecord>>;
}

#[async_trait]
pub trait GuestProfileRepository: Send + Sync {
    async fn get(&self, guest_id: &str) -> StoreResult<Option<entities::GuestProfile>>;
}

/// Best-effort outbound delivery of alerts. Implementations must not block
/// the caller and must swallow their own failures.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: &Alert);
}
