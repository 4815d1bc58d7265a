// SPDX-License-Identifier: MPL-2.0

mod error;
mod handlers;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::records::Database;
pub use error::ApiError;
pub use handlers::{AddEntryRequest, StartTimerRequest};

pub fn router(database: Database) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/start_timer", post(handlers::start_timer))
        .route("/api/stop_timer", post(handlers::stop_timer))
        .route("/api/add_entry", post(handlers::add_entry))
        .route("/api/timeline", get(handlers::timeline))
        .route("/api/analytics", get(handlers::analytics))
        .fallback(handlers::not_found)
        .with_state(database)
}

/// Serves the API on `listener` until the process receives ctrl-c.
pub async fn serve(listener: TcpListener, database: Database) -> Result<()> {
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(database))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Could not listen for ctrl-c, shutting down {err}");
    }
    log::info!("Shutting down");
}
