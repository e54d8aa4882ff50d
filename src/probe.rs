//! Layered HTTP(S) service probing.
//!
//! A domain is probed across an ordered list of scheme/host variants:
//! `https://domain`, `http://domain`, and (only when the domain does not
//! already start with `www.`) the same pair with a `www.` prefix. The
//! first variant answering with a status below 400 wins and the rest are
//! skipped.
//!
//! Per variant: a header-only request establishes reachability and
//! captures response headers, then a full request fetches the body for the
//! `<title>` element. The title fetch failing never invalidates
//! reachability already established. Any network-level failure just moves
//! on to the next variant; `probe` itself never errors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::errors::{Error, Result};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));

/// Probe outcome for one domain. The degraded state is the explicit
/// `Unreachable` variant, not an absent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServiceProbe {
    /// No candidate URL answered below status 400.
    Unreachable,
    /// A candidate answered; headers come from the header-only request,
    /// the title (when present) from the follow-up full request.
    Reachable {
        url: String,
        headers: HashMap<String, String>,
        title: Option<String>,
    },
}

impl ServiceProbe {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ServiceProbe::Reachable { .. })
    }

    /// Page title, when the probe captured one.
    pub fn title(&self) -> Option<&str> {
        match self {
            ServiceProbe::Reachable { title, .. } => title.as_deref(),
            ServiceProbe::Unreachable => None,
        }
    }

    /// Captured response headers (empty for unreachable domains).
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        match self {
            ServiceProbe::Reachable { headers, .. } => Some(headers),
            ServiceProbe::Unreachable => None,
        }
    }
}

/// Ordered candidate URLs for a domain. A domain already carrying the
/// `www.` prefix never gets a second one.
pub fn candidate_urls(domain: &str) -> Vec<String> {
    let mut urls = vec![format!("https://{domain}"), format!("http://{domain}")];
    if !domain.starts_with("www.") {
        urls.push(format!("https://www.{domain}"));
        urls.push(format!("http://www.{domain}"));
    }
    urls
}

/// HTTP service prober with a shared client (timeout + browser
/// user-agent; redirects followed).
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(network.probe_timeout)
            .user_agent(network.user_agent.clone())
            .build()
            .map_err(|e| Error::Configuration {
                field: "network".into(),
                value: network.user_agent.clone(),
                reason: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Probe a domain across its scheme/host variants. Never errors.
    pub async fn probe(&self, domain: &str) -> ServiceProbe {
        self.probe_candidates(&candidate_urls(domain)).await
    }

    /// Probe an explicit ordered candidate list, first reachable wins.
    pub async fn probe_candidates(&self, candidates: &[String]) -> ServiceProbe {
        for url in candidates {
            if let Some(found) = self.probe_one(url).await {
                return found;
            }
        }
        ServiceProbe::Unreachable
    }

    /// One candidate: HEAD for reachability + headers, GET for the title.
    async fn probe_one(&self, url: &str) -> Option<ServiceProbe> {
        let head = self.client.head(url).send().await.ok()?;
        if head.status().as_u16() >= 400 {
            return None;
        }

        let headers = collect_headers(head.headers());
        let title = self.fetch_title(url).await;

        Some(ServiceProbe::Reachable {
            url: url.to_string(),
            headers,
            title,
        })
    }

    async fn fetch_title(&self, url: &str) -> Option<String> {
        let response = self.client.get(url).send().await.ok()?;
        if response.status().as_u16() >= 400 {
            return None;
        }
        let body = response.text().await.ok()?;
        parse_title(&body)
    }
}

/// Collapse a response header map to one representative value per
/// (already lowercase) key; non-UTF-8 values are dropped.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    out
}

/// Trimmed text content of the first `<title>` element, if any.
fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(&TITLE_SELECTOR).next()?;
    let title = element.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
