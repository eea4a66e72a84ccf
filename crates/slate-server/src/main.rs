use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use slate_api::state::{AppState, AppStateInner};
use slate_api::{media, meta, placements, platforms, users};
use slate_engine::LifecycleEngine;
use slate_engine::dispatch::{self, DispatchConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slate=debug,tower_http=debug".into()),
        )
        .init();

    // Config — the connection string is the one hard requirement.
    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();
    if database_url.is_empty() {
        eprintln!("FATAL: DATABASE_URL is not set.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }
    let db_path = database_url
        .strip_prefix("sqlite://")
        .unwrap_or(&database_url);

    let host = std::env::var("SLATE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SLATE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let dispatch_config = DispatchConfig {
        interval: Duration::from_secs(env_u64("SLATE_DISPATCH_INTERVAL_SECS", 30)),
        submit_timeout: Duration::from_secs(env_u64("SLATE_SUBMIT_TIMEOUT_SECS", 300)),
        max_attempts: env_u64("SLATE_MAX_ATTEMPTS", 3) as i64,
    };

    // Init database
    let db = Arc::new(slate_db::Database::open(&PathBuf::from(db_path))?);

    // Shared state
    let state: AppState = Arc::new(AppStateInner::new(db.clone()));

    // Background lifecycle dispatch (submits due placements, times out stuck
    // submissions, retries failures within the attempt budget)
    let engine = LifecycleEngine::new(db);
    tokio::spawn(dispatch::run_dispatch_loop(engine, dispatch_config.clone()));
    info!(
        "Dispatch loop: every {:?}, submit timeout {:?}, max {} attempts",
        dispatch_config.interval, dispatch_config.submit_timeout, dispatch_config.max_attempts
    );

    // Routes
    let app = Router::new()
        .route("/", get(meta::root))
        .route("/health", get(meta::health))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", put(users::update_user))
        .route("/media", post(media::create_media))
        .route("/media", get(media::list_media))
        .route("/formats", get(media::list_formats))
        .route("/interaction-types", get(media::list_interaction_types))
        .route("/platforms", post(platforms::create_platform))
        .route("/platforms", get(platforms::list_platforms))
        .route("/placements", post(placements::schedule_placement))
        .route("/placements", get(placements::list_placements))
        .route("/placements/{id}", get(placements::get_placement))
        .route("/placements/{id}/advance", post(placements::advance_placement))
        .route("/placements/{id}/interactions", post(placements::record_interaction))
        .route("/placements/{id}/interactions", get(placements::list_interactions))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Slate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
