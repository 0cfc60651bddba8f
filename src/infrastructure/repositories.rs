//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{FeedbackRecord, GuestProfile, Role, UserRecord};
use crate::infrastructure::traits::{
    FeedbackRepository, GuestProfileRepository, StoreError, StoreResult, UserRepository,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use di::{Ref, injectable};
use log::error;
use sqlx::types::Json;

fn log_error(e: &sqlx::Error) {
    error!("{e}");
}

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let users = sqlx::query_as("SELECT * FROM users ORDER BY created_at ASC, user_id ASC")
            .fetch_all(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(users)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        // the column collates NOCASE; login matching is case-sensitive
        let user = sqlx::query_as("SELECT * FROM users WHERE username = ? COLLATE BINARY")
            .bind(username)
            .fetch_optional(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)",
        )
        .bind(username)
        .fetch_one(&**self.connection)
        .await
        .inspect_err(log_error)?;
        Ok(exists)
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(count)
    }

    async fn append_user(&self, user: UserRecord) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, role, first_name, last_name, email, loyalty_tier, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.loyalty_tier)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&**self.connection)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict(
                format!("user {} / {}", user.user_id, user.username),
            )),
            Err(e) => {
                log_error(&e);
                Err(e.into())
            }
        }
    }

    async fn set_active(&self, user_id: &str, active: bool) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE user_id = ?")
            .bind(active)
            .bind(user_id)
            .execute(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_role(&self, user_id: &str, role: Role) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE user_id = ?")
            .bind(role)
            .bind(user_id)
            .execute(&**self.connection)
            .await
            .inspect_err(log_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[injectable(FeedbackRepository)]
pub struct DbFeedbackRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl FeedbackRepository for DbFeedbackRepository {
    async fn append(&self, record: &FeedbackRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO feedback (feedback_id, guest_id, guest_name, rating, category, subject, comment, location, staff_member, anonymous, sentiment, submitted_at, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.feedback_id)
        .bind(&record.guest_id)
        .bind(&record.guest_name)
        .bind(record.rating)
        .bind(record.category)
        .bind(&record.subject)
        .bind(&record.comment)
        .bind(&record.location)
        .bind(&record.staff_member)
        .bind(record.anonymous)
        .bind(Json(&record.sentiment))
        .bind(record.submitted_at)
        .bind(record.status)
        .execute(&**self.connection)
        .await
        .inspect_err(log_error)?;
        Ok(())
    }

    async fn list_by_guest(&self, guest_id: &str) -> StoreResult<Vec<FeedbackRecord>> {
        let records = sqlx::query_as(
            "SELECT * FROM feedback WHERE guest_id = ? ORDER BY submitted_at DESC, rowid DESC",
        )
        .bind(guest_id)
        .fetch_all(&**self.connection)
        .await
        .inspect_err(log_error)?;
        Ok(records)
    }

    async fn list_recent(&self, days: u32) -> StoreResult<Vec<FeedbackRecord>> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let records = sqlx::query_as(
            "SELECT * FROM feedback WHERE submitted_at >= ? ORDER BY submitted_at DESC, rowid DESC",
        )
        .bind(cutoff)
        .fetch_all(&**self.connection)
        .await
        .inspect_err(log_error)?;
        Ok(records)
    }
}

#[injectable(GuestProfileRepository)]
pub struct DbGuestProfileRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl GuestProfileRepository for DbGuestProfileRepository {
    async fn get(&self, guest_id: &str) -> StoreResult<Option<GuestProfile>> {
        let profile = sqlx::query_as(
            "SELECT guest_id, display_name, loyalty_tier, cuisine, activity_level FROM guest_profiles WHERE guest_id = ?",
        )
        .bind(guest_id)
        .fetch_optional(&**self.connection)
        .await
        .inspect_err(log_error)?;

        if profile.is_some() {
            return Ok(profile);
        }

        // guests registered through the admin API have no explicit profile yet
        let profile = sqlx::query_as(
            "SELECT user_id AS guest_id, trim(first_name || ' ' || last_name) AS display_name, loyalty_tier, NULL AS cuisine, NULL AS activity_level FROM users WHERE user_id = ? AND role = 'guest'",
        )
        .bind(guest_id)
        .fetch_optional(&**self.connection)
        .await
        .inspect_err(log_error)?;
        Ok(profile)
    }
}
