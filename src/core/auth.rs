//! Session-based authentication.
//!
//! Sessions are kept in memory, keyed by an opaque token, and expire lazily:
//! an expired entry is only removed when it is looked up (or by an explicit
//! [`AuthService::purge_expired`] sweep). Memory held by expired sessions
//! that are never presented again is not reclaimed until such a sweep runs.

use crate::core::error::{CoreError, CoreResult};
use crate::core::traits::AuthService;
use crate::infrastructure::entities::{NewUser, Role, User, UserRecord};
use crate::infrastructure::traits::{StoreError, UserRepository};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use di::{Ref, inject, injectable};
use log::{debug, info, warn};
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub const SESSION_TTL_HOURS: i64 = 24;
const TOKEN_BYTES: usize = 32;
const DEFAULT_LOYALTY_TIER: &str = "Standard";

/// Verified against when the username is unknown, so both failure paths
/// cost one Argon2 verification.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("correct horse battery staple").unwrap_or_default());

#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Usable on `[created_at, expires_at)`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.created_at && now < self.expires_at
    }

    /// Short prefix for log lines.
    pub fn token_hint(&self) -> &str {
        token_hint(&self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn token_hint(token: &str) -> &str {
    token.get(..6).unwrap_or("")
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Runs `hash` on the blocking pool. Hashing failures and a lost task are
/// server faults, never the caller's.
async fn hash_off_thread<F>(hash: F) -> CoreResult<String>
where
    F: FnOnce() -> Result<String, argon2::password_hash::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(hash)
        .await
        .map_err(|e| CoreError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| CoreError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_off_thread(password: &str, phc: String) -> bool {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .unwrap_or(false)
}

pub struct SessionAuthService {
    users: Ref<dyn UserRepository>,
    sessions: Mutex<HashMap<String, Session>>,
    /// Serializes id assignment and the uniqueness check with the insert.
    registration: Mutex<()>,
    ttl: Duration,
}

#[injectable(AuthService)]
impl SessionAuthService {
    #[inject]
    pub fn create(users: Ref<dyn UserRepository>) -> SessionAuthService {
        SessionAuthService::with_ttl(users, Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionAuthService {
    pub fn with_ttl(users: Ref<dyn UserRepository>, ttl: Duration) -> SessionAuthService {
        SessionAuthService {
            users,
            sessions: Mutex::new(HashMap::new()),
            registration: Mutex::new(()),
            ttl,
        }
    }

    async fn next_user_id(&self, role: Role) -> CoreResult<String> {
        let mut n = self.users.count_by_role(role).await? + 1;
        loop {
            let candidate = format!("{role}_{n:03}");
            if self.users.find_by_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[async_trait]
impl AuthService for SessionAuthService {
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<User> {
        match self.users.find_by_username(username).await? {
            Some(record) => {
                let verified = verify_off_thread(password, record.password_hash.clone()).await;
                if verified && record.is_active {
                    Ok(record.into())
                } else {
                    debug!("login rejected for user {}", record.user_id);
                    Err(CoreError::InvalidCredentials)
                }
            }
            None => {
                verify_off_thread(password, DUMMY_HASH.clone()).await;
                debug!("login rejected for unknown username");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    async fn create_session(&self, user: &User) -> Session {
        let created_at = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id: user.user_id.clone(),
            role: user.role,
            created_at,
            expires_at: created_at + self.ttl,
        };

        self.sessions
            .lock()
            .await
            .insert(session.token.clone(), session.clone());

        info!(
            "session {}... created for {} ({})",
            session.token_hint(),
            user.user_id,
            user.role
        );
        session
    }

    async fn resolve_session(&self, token: &str) -> CoreResult<Option<User>> {
        let session = {
            let mut sessions = self.sessions.lock().await;
            let session = match sessions.get(token) {
                Some(session) => session.clone(),
                None => {
                    debug!("unknown session {}...", token_hint(token));
                    return Ok(None);
                }
            };

            if Utc::now() >= session.expires_at {
                sessions.remove(token);
                info!(
                    "session {}... for {} expired",
                    session.token_hint(),
                    session.user_id
                );
                return Ok(None);
            }
            session
        };

        match self.users.find_by_id(&session.user_id).await? {
            Some(record) if record.is_active => Ok(Some(record.into())),
            Some(record) => {
                debug!("session user {} is deactivated", record.user_id);
                Ok(None)
            }
            None => {
                warn!(
                    "session {}... references missing user {}",
                    session.token_hint(),
                    session.user_id
                );
                Ok(None)
            }
        }
    }

    async fn end_session(&self, token: &str) -> bool {
        self.sessions.lock().await.remove(token).is_some()
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| now < session.expires_at);
        before - sessions.len()
    }

    async fn create_user(&self, new_user: NewUser) -> CoreResult<User> {
        let username = new_user.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(CoreError::validation("username", "must not be empty"));
        }
        if new_user.password.is_empty() {
            return Err(CoreError::validation("password", "must not be empty"));
        }

        let password = new_user.password;
        let password_hash = hash_off_thread(move || hash_password(&password)).await?;

        let _registration = self.registration.lock().await;

        if self.users.username_exists(&username).await? {
            warn!("username '{username}' is already taken");
            return Err(CoreError::UsernameTaken(username));
        }

        let record = UserRecord {
            user_id: self.next_user_id(new_user.role).await?,
            username: username.clone(),
            password_hash,
            role: new_user.role,
            first_name: new_user.first_name.trim().to_owned(),
            last_name: new_user.last_name.trim().to_owned(),
            email: new_user.email.trim().to_owned(),
            loyalty_tier: new_user
                .loyalty_tier
                .filter(|tier| !tier.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOYALTY_TIER.to_owned()),
            is_active: true,
            created_at: Utc::now(),
        };

        self.users
            .append_user(record.clone())
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => CoreError::UsernameTaken(username.clone()),
                other => other.into(),
            })?;

        info!("user {} created ({})", record.user_id, record.role);
        Ok(record.into())
    }

    async fn set_user_active(&self, user_id: &str, active: bool) -> CoreResult<()> {
        if !self.users.set_active(user_id, active).await? {
            return Err(CoreError::NotFound(format!("user {user_id}")));
        }

        if !active {
            self.sessions
                .lock()
                .await
                .retain(|_, session| session.user_id != user_id);
        }
        info!("user {user_id} active={active}");
        Ok(())
    }

    async fn set_user_role(&self, user_id: &str, role: Role) -> CoreResult<()> {
        if !self.users.set_role(user_id, role).await? {
            return Err(CoreError::NotFound(format!("user {user_id}")));
        }
        info!("user {user_id} role={role}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MemoryUserRepository;

    fn new_user(username: &str, password: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_owned(),
            password: password.to_owned(),
            role,
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            email: "grace@example.com".to_owned(),
            loyalty_tier: None,
        }
    }

    fn service() -> SessionAuthService {
        SessionAuthService::create(Ref::new(MemoryUserRepository::default()))
    }

    #[test]
    fn test_session_live_interval() {
        let created_at = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id: "guest_001".to_owned(),
            role: Role::Guest,
            created_at,
            expires_at: created_at + Duration::hours(SESSION_TTL_HOURS),
        };

        assert!(session.is_live_at(created_at));
        assert!(session.is_live_at(session.expires_at - Duration::milliseconds(1)));
        assert!(!session.is_live_at(session.expires_at));
        assert!(!session.is_live_at(created_at - Duration::seconds(1)));
    }

    #[test]
    fn test_tokens_are_long_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes, unpadded base64
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let now = Utc::now();
        let session = Session {
            token: "super-secret-token".to_owned(),
            user_id: "admin_001".to_owned(),
            role: Role::Admin,
            created_at: now,
            expires_at: now,
        };
        assert!(!format!("{session:?}").contains("super-secret"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("S3cret", &hash));
        assert!(!verify_password("s3cret", "not a phc string"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let auth = service();
        let created = auth
            .create_user(new_user("Grace", "hunter2", Role::Staff))
            .await
            .unwrap();
        assert_eq!(created.username, "grace");
        assert_eq!(created.user_id, "staff_001");

        let user = auth.authenticate("grace", "hunter2").await.unwrap();
        assert_eq!(user, created);

        assert!(matches!(
            auth.authenticate("grace", "hunter3").await,
            Err(CoreError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("Grace", "hunter2").await,
            Err(CoreError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("nobody", "hunter2").await,
            Err(CoreError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_login_or_resolve() {
        let auth = service();
        let user = auth
            .create_user(new_user("ada", "pw", Role::Guest))
            .await
            .unwrap();
        let session = auth.create_session(&user).await;

        auth.set_user_active(&user.user_id, false).await.unwrap();

        assert!(auth.resolve_session(&session.token).await.unwrap().is_none());
        assert!(matches!(
            auth.authenticate("ada", "pw").await,
            Err(CoreError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.set_user_active("guest_999", false).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_username_uniqueness_is_case_insensitive() {
        let auth = service();
        auth.create_user(new_user("alice", "pw", Role::Guest))
            .await
            .unwrap();

        let result = auth.create_user(new_user("ALICE", "pw", Role::Guest)).await;
        assert!(matches!(result, Err(CoreError::UsernameTaken(name)) if name == "alice"));
    }

    #[tokio::test]
    async fn test_guest_ids_are_sequential() {
        let auth = service();
        let first = auth
            .create_guest_user(new_user("g1", "pw", Role::Admin))
            .await
            .unwrap();
        let second = auth
            .create_guest_user(new_user("g2", "pw", Role::Admin))
            .await
            .unwrap();

        assert_eq!(first.role, Role::Guest);
        assert_eq!(first.user_id, "guest_001");
        assert_eq!(second.user_id, "guest_002");
        assert_eq!(first.loyalty_tier, "Standard");
    }

    #[tokio::test]
    async fn test_next_id_skips_ids_taken_after_role_change() {
        let auth = service();
        auth.create_guest_user(new_user("g1", "pw", Role::Guest))
            .await
            .unwrap();
        auth.create_guest_user(new_user("g2", "pw", Role::Guest))
            .await
            .unwrap();
        auth.set_user_role("guest_001", Role::Staff).await.unwrap();

        let third = auth
            .create_guest_user(new_user("g3", "pw", Role::Guest))
            .await
            .unwrap();
        assert_eq!(third.user_id, "guest_003");
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected() {
        let auth = service();
        let result = auth.create_user(new_user("   ", "pw", Role::Guest)).await;
        assert!(matches!(
            result,
            Err(CoreError::Validation { field: "username", .. })
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let auth = service();
        let user = auth
            .create_user(new_user("bob", "pw", Role::Guest))
            .await
            .unwrap();
        let (_, session) = auth.login("bob", "pw").await.unwrap();

        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));
        assert_eq!(
            auth.resolve_session(&session.token).await.unwrap(),
            Some(user)
        );

        assert!(auth.end_session(&session.token).await);
        assert!(!auth.end_session(&session.token).await);
        assert!(auth.resolve_session(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_lookup() {
        let users = Ref::new(MemoryUserRepository::default());
        let auth = SessionAuthService::with_ttl(users, Duration::zero());
        let user = auth
            .create_user(new_user("carol", "pw", Role::Guest))
            .await
            .unwrap();
        let session = auth.create_session(&user).await;

        assert!(auth.resolve_session(&session.token).await.unwrap().is_none());
        // already removed by the lookup
        assert!(!auth.end_session(&session.token).await);
        assert!(auth.resolve_session(&session.token).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_of_expired_session() {
        let users = Ref::new(MemoryUserRepository::default());
        let auth = std::sync::Arc::new(SessionAuthService::with_ttl(users, Duration::zero()));
        let user = auth
            .create_user(new_user("erin", "pw", Role::Guest))
            .await
            .unwrap();
        let token = auth.create_session(&user).await.token;

        let mut lookups = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let auth = auth.clone();
            let token = token.clone();
            lookups.spawn(async move { auth.resolve_session(&token).await });
        }
        while let Some(joined) = lookups.join_next().await {
            assert!(joined.unwrap().unwrap().is_none());
        }

        assert!(!auth.end_session(&token).await);
        assert_eq!(auth.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_hashing_failures_are_internal() {
        let failed = hash_off_thread(|| Err(argon2::password_hash::Error::Password)).await;
        assert!(matches!(failed, Err(CoreError::Internal(_))));

        let panicked = hash_off_thread(|| panic!("hasher crashed")).await;
        assert!(matches!(panicked, Err(CoreError::Internal(_))));

        assert!(hash_off_thread(|| hash_password("pw")).await.is_ok());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let users = Ref::new(MemoryUserRepository::default());
        let auth = SessionAuthService::with_ttl(users, Duration::zero());
        let user = auth
            .create_user(new_user("dave", "pw", Role::Guest))
            .await
            .unwrap();
        auth.create_session(&user).await;
        auth.create_session(&user).await;

        assert_eq!(auth.purge_expired().await, 2);
        assert_eq!(auth.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_role_requirements() {
        let auth = service();
        let guest = auth
            .create_user(new_user("guest", "pw", Role::Guest))
            .await
            .unwrap();
        let staff = auth
            .create_user(new_user("staff", "pw", Role::Staff))
            .await
            .unwrap();
        let admin = auth
            .create_user(new_user("admin", "pw", Role::Admin))
            .await
            .unwrap();

        let guest_token = auth.create_session(&guest).await.token;
        let staff_token = auth.create_session(&staff).await.token;
        let admin_token = auth.create_session(&admin).await.token;

        assert!(matches!(
            auth.require_authenticated("bogus").await,
            Err(CoreError::Unauthenticated)
        ));
        assert!(matches!(
            auth.require_staff(&guest_token).await,
            Err(CoreError::Forbidden("staff"))
        ));
        assert!(auth.require_staff(&staff_token).await.is_ok());
        assert!(auth.require_staff(&admin_token).await.is_ok());
        assert!(matches!(
            auth.require_admin(&staff_token).await,
            Err(CoreError::Forbidden("admin"))
        ));
        assert!(auth.require_admin(&admin_token).await.is_ok());
    }
}
