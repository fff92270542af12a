use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use super::FeedItem;

/// Errors raised while turning page HTML into feed items.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The caller-supplied selector could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// Extracts up to `limit` feed items from `html`.
///
/// Each node matched by `selector` (in document order) becomes one item.
/// When the node contains an `a[href]` descendant, the first such anchor
/// supplies the title and the link, with the link resolved against
/// `base_url`. Otherwise the node's own text is the title and the item has
/// no link. The description is always the node's outer HTML.
///
/// Malformed HTML is parsed best-effort and never fails. A selector that
/// matches nothing yields an empty list.
///
/// # Errors
///
/// Returns [`ExtractError::Selector`] when `selector` is not valid CSS.
pub fn extract_items(
    html: &str,
    base_url: &str,
    selector: &str,
    limit: usize,
) -> Result<Vec<FeedItem>, ExtractError> {
    let node_selector = parse_selector(selector)?;
    let anchor_selector = parse_selector("a[href]")?;
    let base = Url::parse(base_url).ok();

    let document = Html::parse_document(html);

    let items = document
        .select(&node_selector)
        .take(limit)
        .map(|node| build_item(node, &anchor_selector, base.as_ref()))
        .collect();

    Ok(items)
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn build_item(node: ElementRef<'_>, anchor_selector: &Selector, base: Option<&Url>) -> FeedItem {
    let anchor = node
        .select(anchor_selector)
        .find_map(|a| a.value().attr("href").map(|href| (a, href)));

    let (title, link) = match anchor {
        Some((a, href)) => (visible_text(a), Some(resolve_link(base, href))),
        None => (visible_text(node), None),
    };

    FeedItem {
        title,
        link,
        description: node.html(),
    }
}

/// Text content with each whitespace run collapsed to one space.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins `href` onto the page URL. Falls back to the raw value when the
/// page URL is unusable or the join fails.
fn resolve_link(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    match base.map(|b| b.join(href)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => href.to_string(),
    }
}
