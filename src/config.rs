//! Configuration for domainscope.
//!
//! Centralizes timeouts, the outbound identity (user-agent), rank-list
//! locations and batch pacing. Values come from defaults, then environment
//! variables (`DOMAINSCOPE_*`), then CLI flags; later layers win.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{Error, Result};

/// Browser-like user agent sent on every outbound HTTP request. Several
/// hosts return 403 to anything that does not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Default remote rank list (Tranco full list, two-column CSV).
pub const DEFAULT_RANK_LIST_URL: &str = "https://tranco-list.eu/download/QMNKW/full";

/// Main configuration structure.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Network operation settings (timeouts, user-agent).
    pub network: NetworkConfig,

    /// Popularity-rank list settings.
    pub rank: RankConfig,

    /// Batch analysis pacing.
    pub batch: BatchConfig,
}

/// Network-related options.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Timeout for fetching the source document.
    pub fetch_timeout: Duration,

    /// Timeout for each HTTP probe request (HEAD and GET separately).
    pub probe_timeout: Duration,

    /// Timeout for each DNS query.
    pub dns_timeout: Duration,

    /// User-agent header for all outbound HTTP requests.
    pub user_agent: String,
}

/// Rank-list loading options.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Remote list URL, fetched when the cache file is absent.
    pub list_url: String,

    /// Local cache artifact (two-column `rank,domain` CSV, no header).
    pub cache_path: PathBuf,
}

/// Batch analysis pacing options.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Upper bound on concurrently analyzed domains.
    pub max_in_flight: usize,

    /// Global token-bucket rate for outbound analysis starts, per second.
    pub permits_per_sec: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            dns_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_RANK_LIST_URL.to_string(),
            cache_path: std::env::temp_dir().join("domainscope_rank_list.csv"),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            permits_per_sec: 5,
        }
    }
}

impl Config {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, starting from defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("DOMAINSCOPE_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.network.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("DOMAINSCOPE_PROBE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.network.probe_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("DOMAINSCOPE_DNS_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.network.dns_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(agent) = std::env::var("DOMAINSCOPE_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.network.user_agent = agent;
            }
        }

        if let Ok(url) = std::env::var("DOMAINSCOPE_RANK_LIST_URL") {
            if !url.trim().is_empty() {
                config.rank.list_url = url;
            }
        }

        if let Ok(path) = std::env::var("DOMAINSCOPE_RANK_CACHE") {
            if !path.trim().is_empty() {
                config.rank.cache_path = PathBuf::from(path);
            }
        }

        if let Ok(n) = std::env::var("DOMAINSCOPE_MAX_IN_FLIGHT") {
            if let Ok(n) = n.parse::<usize>() {
                config.batch.max_in_flight = n;
            }
        }

        if let Ok(n) = std::env::var("DOMAINSCOPE_PERMITS_PER_SEC") {
            if let Ok(n) = n.parse::<u32>() {
                config.batch.permits_per_sec = n;
            }
        }

        config
    }

    /// Merge CLI arguments over this configuration, giving the CLI precedence.
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(secs) = cli.fetch_timeout {
            self.network.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.probe_timeout {
            self.network.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.dns_timeout {
            self.network.dns_timeout = Duration::from_secs(secs);
        }
        if let Some(ref url) = cli.rank_url {
            self.rank.list_url = url.clone();
        }
        if let Some(ref path) = cli.rank_cache {
            self.rank.cache_path = path.clone();
        }
        if let Some(n) = cli.max_in_flight {
            self.batch.max_in_flight = n;
        }
        if let Some(n) = cli.permits_per_sec {
            self.batch.permits_per_sec = n;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.network.fetch_timeout.is_zero() {
            return Err(invalid("network.fetch_timeout", "0", "timeout must be greater than 0"));
        }
        if self.network.probe_timeout.is_zero() {
            return Err(invalid("network.probe_timeout", "0", "timeout must be greater than 0"));
        }
        if self.network.dns_timeout.is_zero() {
            return Err(invalid("network.dns_timeout", "0", "timeout must be greater than 0"));
        }
        if self.batch.max_in_flight == 0 {
            return Err(invalid("batch.max_in_flight", "0", "at least one worker is required"));
        }
        if self.batch.permits_per_sec == 0 {
            return Err(invalid("batch.permits_per_sec", "0", "rate must be at least 1/s"));
        }
        if self.rank.list_url.trim().is_empty() {
            return Err(invalid("rank.list_url", "", "rank list URL must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> Error {
    Error::Configuration {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
