//! MemberHub Server — notification fan-out and conversational messaging
//! backbone for the franchise member portal.
//!
//! Entry point that wires configuration, the persistence gateway, and the
//! realtime engine together, then serves the WebSocket endpoint.

mod auth;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use memberhub_core::AppError;
use memberhub_core::config::AppConfig;
use memberhub_realtime::RealtimeEngine;
use memberhub_realtime::ws::{self, WsState};
use memberhub_service::ParticipantRoomPolicy;
use memberhub_store::Store;

use crate::auth::JwtChannelAuthenticator;

#[tokio::main]
async fn main() {
    let env = std::env::var("MEMBERHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).unwrap_or_else(|e| {
        eprintln!("memberhub: {e}");
        std::process::exit(1)
    });

    init_tracing(&config);

    if let Err(e) = serve(config).await {
        tracing::error!("Fatal: {e}");
        std::process::exit(1);
    }
}

/// Install the global tracing subscriber described by the logging section.
///
/// `RUST_LOG` overrides the configured level filter when set.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if config.logging.is_json() {
        builder.json().with_thread_ids(true).init();
    } else {
        builder.pretty().init();
    }
}

/// Bring up the persistence gateway, the realtime engine, and the listener.
async fn serve(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting MemberHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Persistence gateway ──────────────────────────────
    let store = Store::connect(&config.store).await?;

    // ── Step 2: Realtime engine ──────────────────────────────────
    let policy = Arc::new(ParticipantRoomPolicy::new(Arc::clone(&store.conversations)));
    let engine = RealtimeEngine::new(config.realtime.clone(), policy);
    tracing::info!("Realtime engine ready");

    // ── Step 3: Channel authenticator ────────────────────────────
    let authenticator = Arc::new(JwtChannelAuthenticator::new(&config.auth));

    // ── Step 4: WebSocket router ─────────────────────────────────
    let app = ws::router(WsState {
        engine: engine.clone(),
        authenticator,
    });

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::configuration(format!("Cannot bind {addr}: {e}")))?;
    tracing::info!("MemberHub server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let drain_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_requested().await;
            tracing::info!("Shutdown signal received; draining realtime sessions");
            drain_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Serve loop failed: {e}")))?;

    tracing::info!("MemberHub server shut down cleanly");
    Ok(())
}

/// Resolves once the process receives Ctrl+C or, on unix, SIGTERM.
async fn shutdown_requested() {
    let interrupt = async {
        tokio::signal::ctrl_c().await.expect("Ctrl+C signal handler failed");
    };

    #[cfg(unix)]
    let sigterm = async {
        let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM signal handler failed");
        stream.recv().await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = sigterm => {},
    }
}
