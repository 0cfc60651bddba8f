//! Pooled SQLite connection

use crate::infrastructure::config::AppConfig;
use di::{Ref, inject, injectable};
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

/// Pool handed to every `DatabaseConnection` created while set. Lets tests
/// point DI-built components at an in-memory database.
static TEST_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> DatabaseConnection {
        if let Some(pool) = TEST_POOL
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return DatabaseConnection::from_pool(pool);
        }

        // main() validates the URL before the provider is built
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy(&config.database_url)
            .expect("Cannot connect to database");

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    pub fn from_pool(pool: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection: pool }
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await
    }

    pub fn set_test_pool(pool: SqlitePool) {
        *TEST_POOL.lock().unwrap_or_else(PoisonError::into_inner) = Some(pool);
    }

    pub fn clear_test_pool() {
        *TEST_POOL.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
