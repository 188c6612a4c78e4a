//! Post-editing trainer backend
//!
//! - Axum HTTP + WebSocket API for translation and MT post-editing practice
//! - Word-level edit alignment, BLEU / chrF / TER / similarity scoring, points
//! - Optional embedding similarity (BERT_F1) via an OpenAI-compatible API
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   TRAINER_CONFIG_PATH : path to TOML config (weights, metric toggles, exercise bank)
//!   EMBEDDING_API_KEY   : enables BERT_F1 (falls back to OPENAI_API_KEY)
//!   EMBEDDING_BASE_URL  : default "https://api.openai.com/v1"
//!   EMBEDDING_MODEL     : default "text-embedding-3-small"
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default), "compact" or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod state;
mod store;
mod session;
mod practice;
mod protocol;
mod logic;
mod embedding;
mod engine;
mod error;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: in-memory store (seeded) and the scoring engine.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "postedit", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "postedit", error = %e, "Failed to listen for shutdown signal");
  }
  info!(target: "postedit", "Shutdown signal received");
}
