//! Kurikulum · Teacher's Curriculum Generator Backend
//!
//! - Axum HTTP API for setup, document generation, question bank and admin documents
//! - Optional OpenAI integration (via environment variables)
//! - Slots persisted as JSON files under STORAGE_DIR
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_MODEL        : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS : per-request timeout (default 120)
//!   AGENT_CONFIG_PATH   : path to TOML config (prompt templates, toast lifetime)
//!   STORAGE_DIR         : directory for persisted slots (default "./data")
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod catalog;
mod phase;
mod config;
mod storage;
mod openai;
mod content;
mod state;
mod export;
mod protocol;
mod workflow;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Rehydrate persisted slots and set up the content service.
  let state = Arc::new(AppState::from_env());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "kurikulum_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "kurikulum_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "kurikulum_backend", error = %e, "Cannot listen for Ctrl-C; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "kurikulum_backend", "Shutdown signal received");
}
