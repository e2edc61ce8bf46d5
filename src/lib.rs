//! A waitlist service: collects email addresses through `POST /api/subscribe`
//! and upserts them into Postgres, one row per address.

pub mod app;
pub mod config;
pub mod database;
mod error;
pub mod web;

// re-export
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use web::serve::serve;

use tracing_subscriber::EnvFilter;

/// Compact console logging for development. Filter comes from `RUST_LOG`, `debug` otherwise.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .init();
}

/// Full-format logging for release builds. Filter comes from `RUST_LOG`, `info` otherwise.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
