//! rssify: turn any web page into an RSS feed with a CSS selector.
//!
//! `GET /feed?url=<page>&selector=<css>&limit=<n>` fetches the page, takes
//! the first `n` nodes matching the selector and renders them as RSS 2.0
//! items. Rendered feeds are cached in memory for a few minutes per
//! `(url, selector, limit)`.
//!
//! - [`feed`] - fetching, extraction and RSS rendering
//! - [`cache`] - the TTL cache of rendered feeds
//! - [`server`] - axum routes and error mapping
//! - [`config`] - defaults, TOML file and environment overrides
//! - [`util`] - dates and URL checks

pub mod cache;
pub mod config;
pub mod feed;
pub mod server;
pub mod util;
