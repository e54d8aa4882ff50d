//! Domain enrichment orchestration.
//!
//! `DomainAnalyzer` composes the extractor, resolver, rank table and HTTP
//! prober behind small component traits so callers (and tests) can swap
//! any of them. There is no global analyzer instance; construct one
//! explicitly, or use [`DomainAnalyzer::from_config`] for the production
//! wiring.
//!
//! Batch analysis runs domains through a bounded worker pool paced by a
//! global token bucket. Each domain's work happens in its own task:
//! a panic there is caught at the join boundary, logged and skipped, so
//! one misbehaving domain never poisons the batch.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{BatchConfig, Config};
use crate::errors::Result;
use crate::extract::DomainExtractor;
use crate::probe::{HttpProber, ServiceProbe};
use crate::rank::RankTable;
use crate::resolve::{IpResolver, ResolutionResult};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Everything the pipeline learned about one domain. A value type; handed
/// off whole to whatever persists or renders it. The single timestamp is
/// "when this snapshot was taken"; created/updated bookkeeping belongs to
/// the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub domain: String,
    pub addresses: ResolutionResult,
    pub rank: Option<u32>,
    pub service: ServiceProbe,
    pub analyzed_at: DateTime<Utc>,
}

/// Produces candidate domains from a source URL.
#[async_trait]
pub trait DomainDiscovery: Send + Sync {
    /// Fails with a fetch error when the source cannot be retrieved.
    async fn extract(&self, source_url: &str) -> Result<HashSet<String>>;
}

/// Resolves a domain to its address lists. Infallible by contract.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> ResolutionResult;
}

/// Point lookups into an immutable popularity table.
pub trait RankProvider: Send + Sync {
    fn rank(&self, domain: &str) -> Option<u32>;
}

/// Probes a domain for a reachable HTTP(S) service. Infallible by contract.
#[async_trait]
pub trait ServiceProber: Send + Sync {
    async fn probe(&self, domain: &str) -> ServiceProbe;
}

#[async_trait]
impl DomainDiscovery for DomainExtractor {
    async fn extract(&self, source_url: &str) -> Result<HashSet<String>> {
        DomainExtractor::extract(self, source_url).await
    }
}

#[async_trait]
impl AddressResolver for IpResolver {
    async fn resolve(&self, domain: &str) -> ResolutionResult {
        IpResolver::resolve(self, domain).await
    }
}

impl RankProvider for RankTable {
    fn rank(&self, domain: &str) -> Option<u32> {
        RankTable::rank(self, domain)
    }
}

#[async_trait]
impl ServiceProber for HttpProber {
    async fn probe(&self, domain: &str) -> ServiceProbe {
        HttpProber::probe(self, domain).await
    }
}

/// Dependency-injected enrichment orchestrator.
pub struct DomainAnalyzer {
    discovery: Arc<dyn DomainDiscovery>,
    resolver: Arc<dyn AddressResolver>,
    ranks: Arc<dyn RankProvider>,
    prober: Arc<dyn ServiceProber>,
    max_in_flight: usize,
    limiter: Arc<DirectRateLimiter>,
}

impl DomainAnalyzer {
    /// Assemble an analyzer from explicit components.
    pub fn new(
        discovery: Arc<dyn DomainDiscovery>,
        resolver: Arc<dyn AddressResolver>,
        ranks: Arc<dyn RankProvider>,
        prober: Arc<dyn ServiceProber>,
        batch: &BatchConfig,
    ) -> Self {
        let permits =
            NonZeroU32::new(batch.permits_per_sec).unwrap_or(NonZeroU32::MIN);
        Self {
            discovery,
            resolver,
            ranks,
            prober,
            max_in_flight: batch.max_in_flight.max(1),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(permits))),
        }
    }

    /// Production wiring: real extractor, resolver, prober, and the rank
    /// table loaded through its tier chain.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let extractor = DomainExtractor::new(&config.network)?;
        let resolver = IpResolver::new(&config.network);
        let ranks = RankTable::load(&config.rank).await;
        let prober = HttpProber::new(&config.network)?;

        Ok(Self::new(
            Arc::new(extractor),
            Arc::new(resolver),
            Arc::new(ranks),
            Arc::new(prober),
            &config.batch,
        ))
    }

    /// Extract candidate domains from a page. This is the direct
    /// extraction path: fetch failures surface as errors here.
    pub async fn extract(&self, source_url: &str) -> Result<HashSet<String>> {
        self.discovery.extract(source_url).await
    }

    /// Enrich a single domain. Component failures have already degraded to
    /// empty values inside each component, so this always yields a
    /// structurally complete record.
    pub async fn analyze_domain(&self, domain: &str) -> EnrichmentRecord {
        Self::enrich(
            Arc::clone(&self.resolver),
            Arc::clone(&self.ranks),
            Arc::clone(&self.prober),
            domain.to_string(),
        )
        .await
    }

    /// Enrich a set of domains with bounded concurrency and global rate
    /// limiting. A panic inside one domain's analysis is logged and that
    /// domain skipped; all other records are still returned.
    pub async fn analyze_domains<I>(&self, domains: I) -> Vec<EnrichmentRecord>
    where
        I: IntoIterator<Item = String>,
    {
        self.analyze_domains_with_cancel(domains, &CancellationToken::new())
            .await
    }

    /// Like [`analyze_domains`](Self::analyze_domains), stopping early when
    /// `cancel` fires: queued domains are not started, in-flight ones are
    /// aborted, and records already computed are returned.
    pub async fn analyze_domains_with_cancel<I>(
        &self,
        domains: I,
        cancel: &CancellationToken,
    ) -> Vec<EnrichmentRecord>
    where
        I: IntoIterator<Item = String>,
    {
        let units = domains.into_iter().map(|domain| {
            let resolver = Arc::clone(&self.resolver);
            let ranks = Arc::clone(&self.ranks);
            let prober = Arc::clone(&self.prober);
            let limiter = Arc::clone(&self.limiter);
            let cancel = cancel.clone();
            Self::analyze_unit(resolver, ranks, prober, limiter, cancel, domain)
        });

        let results: Vec<Option<EnrichmentRecord>> = stream::iter(units)
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    /// Extract from a page, then batch-analyze whatever was found.
    ///
    /// A fetch failure on this path is logged and yields an empty batch:
    /// callers here cannot tell "fetch failed" from "page referenced no
    /// domains". Only the direct [`extract`](Self::extract) path surfaces
    /// the error. Long-standing behavior; callers depend on it.
    pub async fn analyze_url(&self, source_url: &str) -> Vec<EnrichmentRecord> {
        let domains = match self.discovery.extract(source_url).await {
            Ok(domains) => domains,
            Err(e) => {
                warn!("extraction from {source_url} failed: {e}");
                return Vec::new();
            }
        };

        info!(
            "extracted {} candidate domain(s) from {source_url}",
            domains.len()
        );
        self.analyze_domains(domains).await
    }

    /// One batch unit: wait for a rate permit, run the enrichment in its
    /// own task, survive panics, honor cancellation in both phases.
    async fn analyze_unit(
        resolver: Arc<dyn AddressResolver>,
        ranks: Arc<dyn RankProvider>,
        prober: Arc<dyn ServiceProber>,
        limiter: Arc<DirectRateLimiter>,
        cancel: CancellationToken,
        domain: String,
    ) -> Option<EnrichmentRecord> {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = limiter.until_ready() => {}
        }

        let name = domain.clone();
        let mut handle = tokio::spawn(Self::enrich(resolver, ranks, prober, domain));

        tokio::select! {
            _ = cancel.cancelled() => {
                handle.abort();
                None
            }
            joined = &mut handle => match joined {
                Ok(record) => Some(record),
                Err(e) if e.is_panic() => {
                    warn!("analysis of {name} failed unexpectedly, skipping: {e}");
                    None
                }
                Err(_) => None,
            },
        }
    }

    /// The per-domain fan-out: resolver and prober run concurrently, the
    /// rank lookup is an in-memory read.
    async fn enrich(
        resolver: Arc<dyn AddressResolver>,
        ranks: Arc<dyn RankProvider>,
        prober: Arc<dyn ServiceProber>,
        domain: String,
    ) -> EnrichmentRecord {
        let (addresses, service) =
            tokio::join!(resolver.resolve(&domain), prober.probe(&domain));
        let rank = ranks.rank(&domain);

        EnrichmentRecord {
            domain,
            addresses,
            rank,
            service,
            analyzed_at: Utc::now(),
        }
    }
}
