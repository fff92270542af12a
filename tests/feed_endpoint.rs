//! Integration tests for the `/feed` and `/health` routes.
//!
//! Each test starts the real axum router on an ephemeral port with a
//! scripted [`PageSource`], so cache behavior can be observed through the
//! number of page fetches.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use rssify::config::Config;
use rssify::feed::{FetchError, PageSource};
use rssify::server::{self, AppState, RSS_CONTENT_TYPE};

const THREE_ENTRIES: &str = r#"<html><body>
<div class="entry"><h2><a href="/posts/1">First</a></h2><p>one</p></div>
<div class="entry"><h2><a href="/posts/2">Second</a></h2><p>two</p></div>
<div class="entry"><h2><a href="/posts/3">Third</a></h2><p>three</p></div>
</body></html>"#;

/// Serves one canned page (or one canned error) and counts fetches.
struct ScriptedSource {
    response: Result<String, u16>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn page(html: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(html.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(html) => Ok(html.clone()),
            Err(status) => Err(FetchError::HttpStatus(*status)),
        }
    }
}

/// Starts the router and returns its base URL.
async fn spawn_app(config: Config, source: Arc<ScriptedSource>) -> String {
    let state = AppState::new(config, source);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, state, std::future::pending()));
    format!("http://{addr}")
}

fn feed_url(base: &str, params: &[(&str, &str)]) -> Url {
    Url::parse_with_params(&format!("{base}/feed"), params).unwrap()
}

async fn get(url: Url) -> (u16, Option<String>, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap();
    (status, content_type, body)
}

fn item_count(xml: &str) -> usize {
    xml.matches("<item>").count()
}

fn entries_page(n: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..n {
        html.push_str(&format!(r#"<div class="entry"><a href="/p/{i}">Post {i}</a></div>"#));
    }
    html.push_str("</body></html>");
    html
}

// ============================================================================
// Parameter validation
// ============================================================================

#[tokio::test]
async fn test_missing_url_is_400() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, _, body) = get(feed_url(&base, &[("selector", ".entry")])).await;
    assert_eq!(status, 400);
    assert_eq!(body, "required params: url and selector");
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_missing_selector_is_400() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, _, body) = get(feed_url(&base, &[("url", "http://example.test/page")])).await;
    assert_eq!(status, 400);
    assert_eq!(body, "required params: url and selector");
}

#[tokio::test]
async fn test_empty_params_are_400() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, _, body) = get(feed_url(&base, &[("url", ""), ("selector", "")])).await;
    assert_eq!(status, 400);
    assert_eq!(body, "required params: url and selector");
    assert_eq!(source.calls(), 0);
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_limit_two_of_three_entries() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, content_type, body) = get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "2"),
        ],
    ))
    .await;

    assert_eq!(status, 200);
    assert_eq!(content_type.as_deref(), Some(RSS_CONTENT_TYPE));
    assert_eq!(item_count(&body), 2);
    assert!(body.contains("<title>Feed for http://example.test/page</title>"));
    assert!(body.contains("<link>http://example.test/posts/1</link>"));
    assert!(body.contains("<link>http://example.test/posts/2</link>"));
    assert!(!body.contains("Third"));
    assert!(body.find("First").unwrap() < body.find("Second").unwrap());

    let feed = feed_rs::parser::parse(body.as_bytes()).expect("Response should be valid RSS");
    assert_eq!(feed.entries.len(), 2);
}

#[tokio::test]
async fn test_zero_matches_is_valid_empty_feed() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, content_type, body) = get(feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".nope")],
    ))
    .await;

    assert_eq!(status, 200);
    assert_eq!(content_type.as_deref(), Some(RSS_CONTENT_TYPE));
    assert_eq!(item_count(&body), 0);
    let feed = feed_rs::parser::parse(body.as_bytes()).expect("Empty feed should be valid RSS");
    assert!(feed.entries.is_empty());
}

#[tokio::test]
async fn test_default_limit_is_30() {
    let source = ScriptedSource::page(entries_page(40));
    let base = spawn_app(Config::default(), source.clone()).await;

    let (_, _, body) = get(feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".entry")],
    ))
    .await;
    assert_eq!(item_count(&body), 30);
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let source = ScriptedSource::page(entries_page(120));
    let base = spawn_app(Config::default(), source.clone()).await;

    let (_, _, body) = get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "500"),
        ],
    ))
    .await;
    assert_eq!(item_count(&body), 100);

    let (_, _, body) = get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "-3"),
        ],
    ))
    .await;
    assert_eq!(item_count(&body), 1);

    let (_, _, body) = get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "lots"),
        ],
    ))
    .await;
    assert_eq!(item_count(&body), 30);
}

#[tokio::test]
async fn test_anchorless_node_has_no_link_or_guid() {
    let source = ScriptedSource::page(r#"<ul><li class="note">Just a <b>note</b></li></ul>"#);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, _, body) = get(feed_url(
        &base,
        &[("url", "http://example.test/notes"), ("selector", "li.note")],
    ))
    .await;

    assert_eq!(status, 200);
    let item = &body[body.find("<item>").unwrap()..];
    assert!(item.contains("<title>Just a note</title>"));
    assert!(!item.contains("<link>"));
    assert!(!item.contains("<guid"));
    assert!(item.contains(r#"<![CDATA[<li class="note">Just a <b>note</b></li>]]>"#));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;
    let url = feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".entry")],
    );

    let (_, _, first) = get(url.clone()).await;
    let (status, content_type, second) = get(url).await;

    assert_eq!(status, 200);
    assert_eq!(content_type.as_deref(), Some(RSS_CONTENT_TYPE));
    assert_eq!(first, second);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_expired_entry_refetches() {
    let config = Config {
        cache_ttl_secs: 0,
        ..Config::default()
    };
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(config, source.clone()).await;
    let url = feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".entry")],
    );

    get(url.clone()).await;
    get(url).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_each_parameter_is_part_of_the_key() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    get(feed_url(&base, &[("url", "http://example.test/page"), ("selector", ".entry")])).await;
    get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "2"),
        ],
    ))
    .await;
    get(feed_url(&base, &[("url", "http://example.test/page"), ("selector", "div")])).await;
    get(feed_url(&base, &[("url", "http://example.test/other"), ("selector", ".entry")])).await;
    assert_eq!(source.calls(), 4);

    // Explicit default limit shares the entry with the omitted one
    get(feed_url(
        &base,
        &[
            ("url", "http://example.test/page"),
            ("selector", ".entry"),
            ("limit", "30"),
        ],
    ))
    .await;
    assert_eq!(source.calls(), 4);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_fetch_failure_is_500_and_not_cached() {
    let source = ScriptedSource::failing(503);
    let base = spawn_app(Config::default(), source.clone()).await;
    let url = feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".entry")],
    );

    let (status, _, body) = get(url.clone()).await;
    assert_eq!(status, 500);
    assert_eq!(body, "Error: HTTP error: status 503");

    get(url).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_invalid_selector_is_500() {
    let source = ScriptedSource::page(THREE_ENTRIES);
    let base = spawn_app(Config::default(), source.clone()).await;

    let (status, _, body) = get(feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", "div[")],
    ))
    .await;
    assert_eq!(status, 500);
    assert!(body.starts_with("Error: Invalid selector 'div['"), "got {body}");
}

#[tokio::test]
async fn test_error_details_can_be_hidden() {
    let config = Config {
        expose_error_details: false,
        ..Config::default()
    };
    let source = ScriptedSource::failing(404);
    let base = spawn_app(config, source.clone()).await;

    let (status, _, body) = get(feed_url(
        &base,
        &[("url", "http://example.test/page"), ("selector", ".entry")],
    ))
    .await;
    assert_eq!(status, 500);
    assert_eq!(body, "Error: fetch failed");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let source = ScriptedSource::page("");
    let base = spawn_app(Config::default(), source).await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let json: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(json["ok"], serde_json::Value::Bool(true));
    let ts = json["ts"].as_str().unwrap();
    assert!(ts.ends_with(" +0000"), "unexpected ts {ts}");
}
