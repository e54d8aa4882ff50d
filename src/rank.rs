//! Popularity-rank lookup.
//!
//! A rank table maps domain names to their position in an external
//! popularity list (Tranco-style: `rank,domain` CSV, no header, rank
//! ascending by convention, not enforced here).
//!
//! Loading is a three-tier strategy chain, each tier's failure triggering
//! the next and the last tier never failing:
//!   1. local cache artifact,
//!   2. remote fetch (cached on success),
//!   3. built-in map of ten well-known domains.
//!
//! The table is immutable after load and safe for concurrent reads.
//! Lookups normalize around the `www.` prefix because popularity lists key
//! by bare registrable names while probed domains carry the prefix
//! inconsistently.

use std::collections::HashMap;
use std::fs;

use tracing::{info, warn};

use crate::config::RankConfig;
use crate::errors::{Error, Result};

/// Last-resort entries when neither the cache nor the remote list loads.
const BUILTIN_RANKS: [(&str, u32); 10] = [
    ("google.com", 1),
    ("youtube.com", 2),
    ("facebook.com", 3),
    ("twitter.com", 4),
    ("instagram.com", 5),
    ("linkedin.com", 6),
    ("microsoft.com", 7),
    ("apple.com", 8),
    ("amazon.com", 9),
    ("netflix.com", 10),
];

/// Which tier of the load chain produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSource {
    Cache,
    Remote,
    Builtin,
}

/// Immutable domain → rank mapping.
pub struct RankTable {
    entries: HashMap<String, u32>,
    source: RankSource,
}

impl RankTable {
    /// Load the table through the tier chain. Never fails: the built-in
    /// map is the terminal tier.
    pub async fn load(config: &RankConfig) -> Self {
        match Self::load_from_cache(config) {
            Ok(table) => return table,
            Err(e) => warn!("rank cache tier unavailable: {e}"),
        }
        match Self::load_from_remote(config).await {
            Ok(table) => return table,
            Err(e) => warn!("rank remote tier unavailable: {e}"),
        }
        info!("using built-in rank fallback ({} entries)", BUILTIN_RANKS.len());
        Self::builtin()
    }

    /// Build a table from explicit entries (tests, embedding callers).
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        Self {
            entries: entries.into_iter().collect(),
            source: RankSource::Builtin,
        }
    }

    /// The built-in fallback table.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_RANKS
                .iter()
                .map(|&(d, r)| (d.to_string(), r))
                .collect(),
            source: RankSource::Builtin,
        }
    }

    fn load_from_cache(config: &RankConfig) -> Result<Self> {
        if !config.cache_path.exists() {
            return Err(Error::rank_list(format!(
                "no cache file at {}",
                config.cache_path.display()
            )));
        }
        let text = fs::read_to_string(&config.cache_path)?;
        let entries = parse_table(&text)?;
        info!(
            "loaded {} rank entries from cache {}",
            entries.len(),
            config.cache_path.display()
        );
        Ok(Self {
            entries,
            source: RankSource::Cache,
        })
    }

    async fn load_from_remote(config: &RankConfig) -> Result<Self> {
        info!("downloading rank list from {}", config.list_url);
        // No total timeout: the full list is large and download time varies.
        let response = reqwest::get(&config.list_url)
            .await
            .map_err(|e| Error::rank_list(format!("download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::rank_list(format!(
                "download of {} returned HTTP {}",
                config.list_url,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::rank_list(format!("download body failed: {e}")))?;
        let entries = parse_table(&body)?;

        // Best-effort cache write; a failure here only costs the next run
        // a re-download.
        if let Err(e) = fs::write(&config.cache_path, &body) {
            warn!(
                "could not write rank cache {}: {e}",
                config.cache_path.display()
            );
        }

        info!("loaded {} rank entries from remote list", entries.len());
        Ok(Self {
            entries,
            source: RankSource::Remote,
        })
    }

    /// Rank for a domain, trying exact match, then with a leading `www.`
    /// stripped, then with `www.` prepended. First hit wins.
    pub fn rank(&self, domain: &str) -> Option<u32> {
        if let Some(&rank) = self.entries.get(domain) {
            return Some(rank);
        }
        if let Some(bare) = domain.strip_prefix("www.") {
            if let Some(&rank) = self.entries.get(bare) {
                return Some(rank);
            }
        }
        self.entries.get(&format!("www.{domain}")).copied()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Which tier produced this table.
    pub fn source(&self) -> RankSource {
        self.source
    }
}

/// Parse a `rank,domain` two-column table. Malformed lines are skipped;
/// a table with zero usable lines is an error (triggers the next tier).
fn parse_table(text: &str) -> Result<HashMap<String, u32>> {
    let mut entries = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((rank, domain)) = line.split_once(',') else {
            continue;
        };
        let Ok(rank) = rank.trim().parse::<u32>() else {
            continue;
        };
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            continue;
        }
        entries.entry(domain).or_insert(rank);
    }

    if entries.is_empty() {
        return Err(Error::rank_list("list contained no usable entries"));
    }
    Ok(entries)
}
