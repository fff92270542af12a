use std::net::IpAddr;
use thiserror::Error;
use url::{Host, Url};

/// Reasons a fetch target is refused before any request is made.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("Private address not allowed: {0}")]
    PrivateAddress(String),
    #[error("Localhost not allowed")]
    Localhost,
}

/// Which targets the fetcher may contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Any http(s) URL, including loopback and private networks.
    #[default]
    Open,
    /// Public hosts only; rejects localhost, loopback, private and link-local ranges.
    PublicOnly,
}

impl TargetPolicy {
    pub fn from_block_private(block_private_hosts: bool) -> Self {
        if block_private_hosts {
            TargetPolicy::PublicOnly
        } else {
            TargetPolicy::Open
        }
    }
}

/// Parses a page URL and applies `policy` to it.
///
/// The scheme must be `http` or `https` under every policy. With
/// [`TargetPolicy::PublicOnly`] the host must not resolve syntactically to
/// localhost or a private address. Hostnames are not looked up in DNS.
///
/// # Examples
///
/// ```
/// use rssify::util::{validate_url, TargetPolicy};
///
/// assert!(validate_url("https://example.com/news", TargetPolicy::PublicOnly).is_ok());
/// assert!(validate_url("http://127.0.0.1:8080/", TargetPolicy::Open).is_ok());
/// assert!(validate_url("http://127.0.0.1:8080/", TargetPolicy::PublicOnly).is_err());
/// assert!(validate_url("file:///etc/passwd", TargetPolicy::Open).is_err());
/// ```
pub fn validate_url(url_str: &str, policy: TargetPolicy) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host().ok_or(UrlValidationError::MissingHost)?;

    if policy == TargetPolicy::PublicOnly {
        let ip = match host {
            Host::Domain(domain) => {
                let domain = domain.trim_end_matches('.');
                if domain.eq_ignore_ascii_case("localhost")
                    || domain.to_ascii_lowercase().ends_with(".localhost")
                {
                    return Err(UrlValidationError::Localhost);
                }
                None
            }
            Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
            Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
        };

        if let Some(ip) = ip {
            if ip.is_loopback() {
                return Err(UrlValidationError::Localhost);
            }
            if is_private_ip(&ip) {
                return Err(UrlValidationError::PrivateAddress(ip.to_string()));
            }
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_unspecified() {
                return true;
            }
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped)) || mapped.is_loopback();
            }
            let segments = ipv6.segments();
            // fc00::/7
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // fe80::/10
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
