//! Backend for a drug/food interaction history service.
//!
//! A user submits drugs and foods, every pair is checked against the
//! interaction checker, and the combined verdicts are saved as one history
//! record for that user.
//!
//!
//!
//! # General Infrastructure
//! - Clients talk to this server only, never to the checker directly
//! - One checker call per drug/food pair, all in flight at once
//! - A request either saves a record with every pair or saves nothing
//! - History lives in Redis, shared by every request through one connection manager
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET | `/` | Liveness |
//! | POST | `/getInteractions` | Check all pairs, save and return the record |
//! | GET | `/history?uid=` | Records for a user, newest first |
//! | DELETE | `/deleteSingleHistory/{id}` | Remove one record |
//! | DELETE | `/clearHistory?uid=` | Remove all records for a user |
//!
//!
//!
//! # Environment
//!
//! - `PORT`: listening port, default `4000`
//! - `REDIS_URL`: Redis connection string, or `/run/secrets/REDIS_URL`.
//!   Without it history stays in memory
//! - `CHECKER_URL`: base URL of the checker service
//! - `RUST_LOG`: tracing filter
//!
//!
//!
//! # Setup
//!
//! Run locally.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p history
//! ```
//!
//! Try it.
//! ```sh
//! curl -X POST localhost:4000/getInteractions \
//!   -H 'content-type: application/json' \
//!   -d '{"uid": "u1", "drug": ["warfarin"], "food": ["spinach", "grapefruit"]}'
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod aggregate;
pub mod checker;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use routes::{
    clear_history_handler, delete_single_handler, health_handler, history_handler,
    interactions_handler,
};
use state::State;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("Server shut down");
    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(health_handler))
        .route("/getInteractions", post(interactions_handler))
        .route("/history", get(history_handler))
        .route("/deleteSingleHistory/{id}", delete(delete_single_handler))
        .route("/clearHistory", delete(clear_history_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
