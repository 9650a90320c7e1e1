use std::sync::Arc;

use config::ServerConfig;
use sqlx::migrate::Migrator;
use state::AppState;
use tokio::{net::TcpListener, sync::RwLock};

mod api;
mod audit;
mod codes;
mod config;
mod db;
mod error;
mod install;
mod kek;
mod opaque_engine;
mod otp;
mod principal;
mod queries;
mod ratelimit;
mod rbac;
mod session;
mod signing;
mod state;
mod zk;

// Embed all sql migrations in binary
static MIGRATOR: Migrator = sqlx::migrate!();

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logger - reads RUST_LOG environment variable
    // Examples: RUST_LOG=info, RUST_LOG=debug, RUST_LOG=darkauth_server=debug
    // Defaults to info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    let db_pool = Arc::new(db::get_pool(&config).await?);

    MIGRATOR.run(db_pool.as_ref()).await?;
    log::info!("Migrations are up to date.");

    // Secrets derived from the install passphrase never touch disk, so an
    // already-installed server needs the passphrase re-supplied on every
    // boot. An uninstalled server starts with `crypto` empty and gets it
    // populated by `/install/bootstrap` instead.
    let crypto = if install::is_installed(&db_pool).await? {
        let passphrase = std::env::var("KEK_PASSPHRASE").map_err(|_| {
            error::ApiError::Internal(
                "server is installed but KEK_PASSPHRASE is not set; cannot unwrap stored secrets"
                    .into(),
            )
        })?;
        let loaded = install::load_crypto(&db_pool, &passphrase).await?;
        log::info!("Unwrapped stored secrets with the supplied boot passphrase.");
        Some(loaded)
    } else {
        log::info!("Server is not yet installed; waiting for /install/start.");
        None
    };

    let app_state = AppState {
        config: Arc::new(config.clone()),
        db_pool,
        crypto: Arc::new(RwLock::new(crypto)),
        rate_limiter: Arc::new(ratelimit::RateLimiter::new(
            config.rate_limit_max_attempts,
            config.rate_limit_window_seconds,
        )),
        install_token: Arc::new(RwLock::new(None)),
    };

    let app = api::router().with_state(app_state);

    let ip_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&ip_addr).await?;

    log::info!("Starting server on {ip_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
