//! Environment-driven configuration

use di::{inject, injectable};
use log::warn;
use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:guest_insights.db?mode=rwc";
const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_address: String,
    pub alert_webhook_url: Option<String>,
    pub cors_origins: Vec<String>,
    /// Periodic sweep of expired sessions. Lookups expire lazily regardless.
    pub session_sweep_interval: Option<Duration>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_owned(),
            alert_webhook_url: None,
            cors_origins: parse_list(DEFAULT_CORS_ORIGINS),
            session_sweep_interval: None,
            bootstrap_admin: None,
        }
    }
}

#[injectable]
impl AppConfig {
    #[inject]
    pub fn from_env() -> AppConfig {
        dotenvy::dotenv().ok();
        let defaults = AppConfig::default();

        let session_sweep_interval = env::var("SESSION_SWEEP_SECS").ok().and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    warn!("ignoring SESSION_SWEEP_SECS={raw:?}: not a number of seconds");
                    None
                }
            }
        });

        let bootstrap_admin = match (
            non_empty_var("BOOTSTRAP_ADMIN_USERNAME"),
            non_empty_var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("bootstrap admin needs both BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD");
                None
            }
            (None, None) => None,
        };

        AppConfig {
            database_url: non_empty_var("DATABASE_URL").unwrap_or(defaults.database_url),
            listen_address: non_empty_var("LISTEN_ADDRESS").unwrap_or(defaults.listen_address),
            alert_webhook_url: non_empty_var("ALERT_WEBHOOK_URL"),
            cors_origins: non_empty_var("CORS_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.cors_origins),
            session_sweep_interval,
            bootstrap_admin,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
