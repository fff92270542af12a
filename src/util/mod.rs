//! Utility functions shared by the feed pipeline and the HTTP layer.
//!
//! - **Dates**: RFC 822 formatting for `lastBuildDate` and `/health`
//! - **URL validation**: scheme and address checks applied before fetching
//!
//! # Examples
//!
//! ```
//! use rssify::util::{http_date, validate_url, TargetPolicy};
//!
//! let url = validate_url("https://example.com/news", TargetPolicy::Open).unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! let stamp = http_date(None);
//! assert!(stamp.ends_with("+0000"));
//! ```

mod date;
mod url_validator;

pub use date::http_date;
pub use url_validator::{validate_url, TargetPolicy, UrlValidationError};
