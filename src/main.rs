//! Lesson Blocks · Authoring Service
//!
//! - Axum HTTP API for building lessons out of validated content blocks
//! - In-memory lesson store holding serialized block records
//! - Optional lesson bank loaded from TOML at startup
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   LESSONS_CONFIG_PATH  : path to TOML config (limits + optional lesson bank)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use lesson_blocks::routes::build_router;
use lesson_blocks::state::AppState;
use lesson_blocks::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lesson_blocks", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "lesson_blocks", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lesson_blocks", error = %e, "Failed to listen for shutdown signal");
  }
}
