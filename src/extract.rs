//! Candidate-domain extraction from a web page.
//!
//! Two independent passes over the fetched document:
//!   1. Hyperlink pass: the host component of every `a[href]` target.
//!      Relative links are skipped, scheme-less links are read as `http://`,
//!      and hosts equal to the page's own host are dropped.
//!   2. Text pass: a domain-shape regex over the document's text nodes,
//!      filtered against common false positives (IPv4 literals, `N.N`
//!      version tokens, and any bare two-label token).
//!
//! The two-label rejection knowingly discards legitimate domains that appear
//! as plain text ("example.com" in prose); consumers depend on the reduced
//! set, so the rule must not be loosened here.
//!
//! The page's own host is always part of the result.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::NetworkConfig;
use crate::errors::{Error, Result};

/// Domain-shaped token: dot-separated labels (alnum + inner hyphens, max 63
/// chars per label) ending in an alphabetic TLD of at least two characters.
static DOMAIN_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}")
        .expect("domain shape regex is valid")
});

/// Dotted-quad IPv4 literal at the start of a token.
static IPV4_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+").expect("ipv4 regex is valid"));

/// Bare `N.N` version-number-shaped token.
static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("version regex is valid"));

/// Any two-label token. Intentionally over-broad (precision over recall).
static TWO_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+\.\w+$").expect("two-label regex is valid"));

/// Extracts candidate domains from the document behind a URL.
pub struct DomainExtractor {
    client: reqwest::Client,
}

impl DomainExtractor {
    /// Build an extractor with its own HTTP client (fetch timeout and
    /// browser user-agent from config).
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(network.fetch_timeout)
            .user_agent(network.user_agent.clone())
            .build()
            .map_err(|e| Error::Configuration {
                field: "network".into(),
                value: network.user_agent.clone(),
                reason: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Fetch `source_url` and extract the candidate-domain set from it.
    ///
    /// Fails with a fetch error on network failure or a non-2xx status;
    /// an `Ok` result always contains at least the page's own host.
    pub async fn extract(&self, source_url: &str) -> Result<HashSet<String>> {
        let base = base_domain(source_url)?;

        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                url: source_url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: source_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| Error::Fetch {
            url: source_url.to_string(),
            source: e,
        })?;

        Ok(extract_candidates(&body, &base))
    }
}

/// Host component of a URL, without port. Errors when the URL does not
/// parse or carries no host (e.g. `mailto:`).
pub fn base_domain(source_url: &str) -> Result<String> {
    let parsed = Url::parse(source_url)
        .map_err(|e| Error::invalid_url(source_url, e.to_string()))?;
    parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| Error::invalid_url(source_url, "URL has no host component"))
}

/// Pure extraction core: both passes over an already-fetched document.
/// Exposed separately so extraction semantics are testable offline.
pub fn extract_candidates(html: &str, base_domain: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut domains = HashSet::new();

    // Pass 1: hyperlink targets.
    let anchors = Selector::parse("a[href]").expect("anchor selector is valid");
    for element in document.select(&anchors) {
        if let Some(href) = element.value().attr("href") {
            if let Some(host) = link_host(href) {
                if host != base_domain {
                    domains.insert(host);
                }
            }
        }
    }

    // Pass 2: domain-shaped tokens in the visible text.
    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    for token in DOMAIN_SHAPE.find_iter(&text) {
        let token = token.as_str();
        if is_plausible_domain(token) {
            domains.insert(token.to_ascii_lowercase());
        }
    }

    domains.insert(base_domain.to_string());
    domains
}

/// Host of a hyperlink target, or `None` for relative / host-less links.
/// Scheme-less targets ("example.org/path") are read as `http://` URLs.
fn link_host(href: &str) -> Option<String> {
    // Relative links (including protocol-relative and fragments) carry no
    // host of their own.
    if href.starts_with('/') || href.starts_with('#') || href.starts_with('?') {
        return None;
    }

    let parsed = match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{href}")).ok()
        }
        Err(_) => None,
    }?;

    let host = parsed.host_str()?;
    if !host.contains('.') {
        return None;
    }
    // An IP literal names an endpoint, not a domain.
    if host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// False-positive filter applied to text-derived tokens.
fn is_plausible_domain(token: &str) -> bool {
    if IPV4_LITERAL.is_match(token)
        || VERSION_TOKEN.is_match(token)
        || TWO_LABEL.is_match(token)
    {
        return false;
    }

    // TLD sanity: at least two characters, not purely numeric.
    let tld = token.rsplit('.').next().unwrap_or("");
    if tld.len() < 2 || tld.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    true
}
