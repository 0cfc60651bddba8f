//! Guest feedback, alerting and recommendation service
//!

use guest_insights::core::error::CoreError;
use guest_insights::core::traits::AuthService;
use guest_insights::infrastructure::config::{AppConfig, BootstrapAdmin};
use guest_insights::infrastructure::database::DatabaseConnection;
use guest_insights::infrastructure::entities::{NewUser, Role};

use anyhow::{Context, anyhow};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use di::{Ref, ServiceProvider};
use di_axum::RouterServiceProviderExtensions;
use log::{debug, info, warn};
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{AllowOrigin, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider: ServiceProvider = guest_insights::service_collection()
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    let config = provider.get_required::<AppConfig>();
    SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL '{}'", config.database_url))?;

    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await
        .context("database migration failed")?;

    let auth_service = provider.get_required::<dyn AuthService>();
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(auth_service.as_ref(), admin).await?;
    }
    if let Some(interval) = config.session_sweep_interval {
        tokio::spawn(sweep_sessions(auth_service.clone(), interval));
    }

    let app = guest_insights::router()
        .layer(cors_layer(&config))
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("cannot listen on {}", config.listen_address))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down...");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .inspect_err(|_| warn!("ignoring invalid CORS origin {origin:?}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(origins))
}

async fn bootstrap_admin(auth_service: &dyn AuthService, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let new_user = NewUser {
        username: admin.username.clone(),
        password: admin.password.clone(),
        role: Role::Admin,
        first_name: "System".to_owned(),
        last_name: "Administrator".to_owned(),
        email: String::new(),
        loyalty_tier: None,
    };

    match auth_service.create_user(new_user).await {
        Ok(user) => info!("bootstrap admin {} created", user.user_id),
        Err(CoreError::UsernameTaken(username)) => {
            debug!("bootstrap admin '{username}' already exists")
        }
        Err(e) => return Err(e).context("cannot create bootstrap admin"),
    }
    Ok(())
}

async fn sweep_sessions(auth_service: Ref<dyn AuthService>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let purged = auth_service.purge_expired().await;
        if purged > 0 {
            info!("purged {purged} expired sessions");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
