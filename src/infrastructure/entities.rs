//! Database entities

use crate::core::sentiment::SentimentResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Staff,
    #[serde(alias = "customer")]
    #[strum(to_string = "guest", serialize = "customer")]
    Guest,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

/// Stored user row, including the credential. Never leaves the auth layer.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub loyalty_tier: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub loyalty_tier: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            user_id: record.user_id,
            username: record.username,
            role: record.role,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            loyalty_tier: record.loyalty_tier,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

/// Fields supplied by an administrator when registering an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub loyalty_tier: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FeedbackCategory {
    General,
    Room,
    Dining,
    Service,
    Amenities,
    Activities,
    BusinessServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackStatus {
    New,
    InReview,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FeedbackRecord {
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
    #[sqlx(json)]
    pub sentiment: SentimentResult,
    pub submitted_at: DateTime<Utc>,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize)]
pub struct GuestPreferences {
    pub cuisine: Option<String>,
    pub activity_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct GuestProfile {
    pub guest_id: String,
    pub display_name: String,
    pub loyalty_tier: String,
    #[sqlx(flatten)]
    pub preferences: GuestPreferences,
}
