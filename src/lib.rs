//! domainscope
//!
//! Discovers domain names referenced by a web page and enriches each one
//! with network-observable facts: resolved IPv4/IPv6 addresses, a
//! popularity rank, and evidence of a reachable HTTP(S) service (response
//! headers and page title).
//!
//! Enrichment is best-effort by design: the only fatal failure in the
//! pipeline is the initial document fetch. DNS, rank and HTTP probe
//! problems degrade into empty values inside a structurally complete
//! [`EnrichmentRecord`].
//!
//! # Example
//!
//! ```rust,no_run
//! use domainscope::{Config, DomainAnalyzer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), domainscope::Error> {
//! let analyzer = DomainAnalyzer::from_config(&Config::default()).await?;
//! let records = analyzer.analyze_url("https://example.org").await;
//! for record in &records {
//!     println!("{}: reachable={}", record.domain, record.service.is_reachable());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extract;
pub mod output;
pub mod probe;
pub mod rank;
pub mod resolve;

// Re-export the types most callers need.
pub use analyzer::{
    AddressResolver, DomainAnalyzer, DomainDiscovery, EnrichmentRecord, RankProvider,
    ServiceProber,
};
pub use config::Config;
pub use errors::{Error, Result};
pub use extract::{extract_candidates, DomainExtractor};
pub use probe::{candidate_urls, HttpProber, ServiceProbe};
pub use rank::{RankSource, RankTable};
pub use resolve::{IpResolver, ResolutionResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
