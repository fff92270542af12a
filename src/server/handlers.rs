use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

use super::error::AppError;
use super::state::AppState;
use crate::cache::CacheKey;
use crate::feed::{extract_items, Feed};
use crate::util::http_date;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Query string of `GET /feed`. Everything is optional here so that
/// missing parameters produce our own 400 rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub url: Option<String>,
    pub selector: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ts: String,
}

/// Resolves the requested item count.
///
/// An absent or non-integer `limit` falls back to `default`. The result is
/// clamped to `[1, max]`; integers too large to represent clamp like any
/// other out-of-range value.
pub fn effective_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    let requested = match raw.map(|r| r.trim().parse::<i64>()) {
        None => return default.clamp(1, max),
        Some(Ok(n)) => n,
        Some(Err(e)) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return default.clamp(1, max),
        },
    };

    if requested < 1 {
        1
    } else {
        usize::try_from(requested).map_or(max, |n| n.min(max))
    }
}

/// `GET /feed?url=&selector=&limit=`
///
/// Serves a cached rendering when one is fresh; otherwise fetches the page,
/// extracts items, renders RSS and caches the result.
pub async fn feed(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    match build_feed(&state, query).await {
        Ok(body) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body).into_response(),
        Err(e) => e.to_response(state.config.expose_error_details),
    }
}

async fn build_feed(state: &AppState, query: FeedQuery) -> Result<String, AppError> {
    let url = query.url.filter(|u| !u.is_empty());
    let selector = query.selector.filter(|s| !s.is_empty());
    let (Some(url), Some(selector)) = (url, selector) else {
        return Err(AppError::MissingParams);
    };

    let limit = effective_limit(
        query.limit.as_deref(),
        state.config.default_limit,
        state.config.max_limit,
    );
    let key = CacheKey::new(url, selector, limit);

    if let Some(body) = state.cache.lookup(&key, Utc::now()) {
        tracing::debug!(url = %key.url, selector = %key.selector, limit, "Feed cache hit");
        return Ok(body);
    }
    tracing::debug!(url = %key.url, selector = %key.selector, limit, "Feed cache miss");

    let html = state.source.fetch(&key.url).await?;
    let items = extract_items(&html, &key.url, &key.selector, limit)?;
    let item_count = items.len();
    let body = Feed::for_page(&key.url, items).to_rss()?;

    tracing::info!(url = %key.url, selector = %key.selector, items = item_count, "Generated feed");

    state
        .cache
        .store(key, body.clone(), Utc::now(), state.config.cache_ttl());

    Ok(body)
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: http_date(None),
    })
}
