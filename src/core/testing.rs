//! In-memory stand-ins for the record stores, used by the core unit tests.

use crate::core::alerts::Alert;
use crate::infrastructure::entities::{FeedbackRecord, GuestProfile, Role, UserRecord};
use crate::infrastructure::traits::{
    AlertNotifier, FeedbackRepository, GuestProfileRepository, StoreError, StoreResult,
    UserRepository,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<i64> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.role == role).count() as i64)
    }

    async fn append_user(&self, user: UserRecord) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| {
            u.user_id == user.user_id || u.username.eq_ignore_ascii_case(&user.username)
        }) {
            return Err(StoreError::Conflict(user.user_id));
        }
        users.push(user);
        Ok(())
    }

    async fn set_active(&self, user_id: &str, active: bool) -> StoreResult<bool> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .map(|u| u.is_active = active)
            .is_some())
    }

    async fn set_role(&self, user_id: &str, role: Role) -> StoreResult<bool> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .map(|u| u.role = role)
            .is_some())
    }
}

/// Feedback store that can be switched into a failing mode.
#[derive(Default)]
pub struct MemoryFeedbackRepository {
    records: Mutex<Vec<FeedbackRecord>>,
    failing: AtomicBool,
}

impl MemoryFeedbackRepository {
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn insert(&self, record: FeedbackRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl FeedbackRepository for MemoryFeedbackRepository {
    async fn append(&self, record: &FeedbackRecord) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_by_guest(&self, guest_id: &str) -> StoreResult<Vec<FeedbackRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.guest_id == guest_id)
            .cloned()
            .collect())
    }

    async fn list_recent(&self, days: u32) -> StoreResult<Vec<FeedbackRecord>> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.submitted_at >= cutoff)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: Mutex<Vec<GuestProfile>>,
}

impl MemoryProfileRepository {
    pub fn insert(&self, profile: GuestProfile) {
        self.profiles.lock().unwrap().push(profile);
    }
}

#[async_trait]
impl GuestProfileRepository for MemoryProfileRepository {
    async fn get(&self, guest_id: &str) -> StoreResult<Option<GuestProfile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.guest_id == guest_id).cloned())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<String>>,
}

impl AlertNotifier for RecordingNotifier {
    fn notify(&self, alert: &Alert) {
        self.notified.lock().unwrap().push(alert.alert_id.clone());
    }
}
