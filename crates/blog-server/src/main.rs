//! Blog Management API server

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use blog_api::{AppState, create_router};
use blog_auth::{Argon2Hasher, AuthService, SessionConfig, SessionManager};
use blog_db::{Database, NewUser, UserRole, UserStore};
use config::Config;

/// Blog Management API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "BLOG_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "BLOG_PORT")]
    port: Option<u16>,

    /// Secret for signing access tokens
    #[arg(long, env = "BLOG_ACCESS_SECRET", hide_env_values = true)]
    access_secret: Option<String>,

    /// Secret for signing refresh tokens
    #[arg(long, env = "BLOG_REFRESH_SECRET", hide_env_values = true)]
    refresh_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.access_secret {
        config.auth.access_secret = secret;
    }
    if let Some(secret) = args.refresh_secret {
        config.auth.refresh_secret = secret;
    }

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Blog Management API v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    // Create data directory
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = blog_auth::hash_password("admin")?;
        db.create(NewUser {
            email: "admin@localhost".to_string(),
            username: "admin".to_string(),
            password_hash,
            role: UserRole::Admin,
            is_active: true,
        })
        .await?;
        info!("Default admin user created (email: admin@localhost, password: admin)");
    }

    // Initialize session manager
    let session_config = SessionConfig::new(
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    )?
    .with_refresh_as_bearer(config.auth.accept_refresh_as_bearer);
    let sessions = Arc::new(SessionManager::new(
        &config.auth.access_secret,
        &config.auth.refresh_secret,
        session_config,
    ));

    // Create application state
    let users = Arc::new(db);
    let auth = Arc::new(AuthService::new(
        users.clone(),
        Arc::new(Argon2Hasher),
        sessions,
    ));
    let state = AppState::new(users, auth);

    // Create router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (pretty, json) = if format == "json" {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
