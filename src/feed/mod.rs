//! The page-to-feed pipeline.
//!
//! - [`fetcher`] - one HTTP GET per page, behind the [`PageSource`] trait
//! - [`extract`] - CSS selector driven item extraction with `scraper`
//! - [`rss`] - RSS 2.0 rendering with `quick-xml`
//!
//! # Example
//!
//! ```ignore
//! use rssify::feed::{extract_items, render_rss, HttpFetcher, PageSource};
//!
//! let html = fetcher.fetch(url).await?;
//! let items = extract_items(&html, url, ".entry", 30)?;
//! let xml = render_rss(&format!("Feed for {url}"), url, &items)?;
//! ```

mod extract;
mod fetcher;
mod rss;

pub use extract::{extract_items, ExtractError};
pub use fetcher::{FetchError, HttpFetcher, PageSource, DEFAULT_USER_AGENT};
pub use rss::{render_rss, RssError, UNTITLED_ITEM};

/// One extracted entry, ready to be rendered as an RSS `<item>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Absolute link, when the matched node contained an anchor.
    pub link: Option<String>,
    /// Outer HTML of the matched node, passed through unescaped.
    pub description: String,
}

/// A channel built for a single cache miss and rendered immediately.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub items: Vec<FeedItem>,
}

impl Feed {
    /// Builds the channel for a scraped page: titled `Feed for <url>`.
    pub fn for_page(url: &str, items: Vec<FeedItem>) -> Self {
        Self {
            title: format!("Feed for {url}"),
            link: url.to_string(),
            items,
        }
    }

    pub fn to_rss(&self) -> Result<String, RssError> {
        render_rss(&self.title, &self.link, &self.items)
    }
}
