//! HTTP surface: `/feed` and `/health` on axum.
//!
//! [`router`] wires the handlers to an [`AppState`]; [`serve`] runs the
//! router on a bound listener until the shutdown future resolves.

mod error;
mod handlers;
mod state;

pub use error::{AppError, MISSING_PARAMS_MESSAGE};
pub use handlers::{effective_limit, FeedQuery, HealthResponse, RSS_CONTENT_TYPE};
pub use state::AppState;

use axum::{routing::get, Router};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::cache::FeedCache;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/feed", get(handlers::feed))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve requests on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Periodically drops expired feeds so memory tracks live entries only.
pub fn spawn_cache_sweeper(cache: Arc<FeedCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired(Utc::now());
            if evicted > 0 {
                tracing::debug!(evicted, remaining = cache.len(), "Evicted expired feeds");
            }
        }
    })
}
