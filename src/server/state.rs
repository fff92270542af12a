use std::sync::Arc;
use std::time::Duration;

use crate::cache::FeedCache;
use crate::config::Config;
use crate::feed::{HttpFetcher, PageSource};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<FeedCache>,
    pub source: Arc<dyn PageSource>,
}

impl AppState {
    /// Builds state around an explicit page source.
    pub fn new(config: Config, source: Arc<dyn PageSource>) -> Self {
        let cache = Arc::new(FeedCache::new());
        Self {
            config: Arc::new(config),
            cache,
            source,
        }
    }

    /// Builds state that fetches pages over HTTP with settings from `config`.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let fetcher = HttpFetcher::new(client)
            .with_user_agent(config.user_agent.clone())
            .with_timeout(config.fetch_timeout())
            .with_policy(config.target_policy());

        Ok(Self::new(config, Arc::new(fetcher)))
    }
}
