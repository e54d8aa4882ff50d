/*!
DNS resolution for discovered domains.

Two-tier strategy:
- A and AAAA records are queried independently against a fixed pair of
  public recursive resolvers; NXDOMAIN, empty answers, refusals and
  timeouts all degrade to an empty list for that record family.
- Only when BOTH families come back empty does resolution fall back to the
  operating system's stub resolver. The tiers fail in different ways for
  different networks (a public resolver may refuse patterns the stub
  accepts, and vice versa), so the fallback trigger is deliberately
  both-empty rather than per-family.

`resolve` never returns an error; "no records" and "resolution failed" are
the same empty value by design.
*/

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use trust_dns_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    proto::rr::{Name, RData, RecordType},
    TokioAsyncResolver,
};

use crate::config::NetworkConfig;

/// Public recursive resolvers queried before the OS stub resolver.
pub const RECURSIVE_RESOLVERS: [Ipv4Addr; 2] =
    [Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(8, 8, 4, 4)];

/// Addresses resolved for one domain, one ordered deduplicated list per
/// family. Both lists empty is the valid degraded state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

impl ResolutionResult {
    /// True when neither family produced an address ("no records" and
    /// "resolution failed" are not distinguished).
    pub fn is_unresolved(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

/// Resolver over fixed public recursive nameservers with OS fallback.
pub struct IpResolver {
    resolver: TokioAsyncResolver,
    query_timeout: Duration,
}

impl IpResolver {
    /// Build a resolver against [`RECURSIVE_RESOLVERS`] with the configured
    /// per-query timeout. One attempt per query; the core never retries.
    pub fn new(network: &NetworkConfig) -> Self {
        let ips: Vec<IpAddr> = RECURSIVE_RESOLVERS.iter().map(|&ip| IpAddr::V4(ip)).collect();
        let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);

        let mut opts = ResolverOpts::default();
        opts.timeout = network.dns_timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            query_timeout: network.dns_timeout,
        }
    }

    /// Resolve both address families for a domain. Never errors.
    pub async fn resolve(&self, domain: &str) -> ResolutionResult {
        let mut result = ResolutionResult {
            ipv4: self.lookup(domain, RecordType::A).await,
            ipv6: self.lookup(domain, RecordType::AAAA).await,
        };

        if result.is_unresolved() {
            self.os_fallback(domain, &mut result).await;
        }

        result
    }

    /// Single record-type query against the recursive resolvers.
    /// Every failure mode degrades to an empty list.
    async fn lookup(&self, domain: &str, record_type: RecordType) -> Vec<String> {
        let Ok(name) = Name::from_ascii(domain) else {
            return Vec::new();
        };

        let fut = self.resolver.lookup(name, record_type);
        match timeout(self.query_timeout, fut).await {
            Ok(Ok(answer)) => {
                let mut addresses = Vec::new();
                for rdata in answer.iter() {
                    let addr = match rdata {
                        RData::A(a) => a.0.to_string(),
                        RData::AAAA(aaaa) => aaaa.0.to_string(),
                        _ => continue,
                    };
                    push_unique(&mut addresses, addr);
                }
                addresses
            }
            // NXDOMAIN, no answer, refusals, timeout.
            _ => Vec::new(),
        }
    }

    /// OS stub-resolver fallback, bucketing every returned address by
    /// family. Runs only when both recursive lists came back empty.
    async fn os_fallback(&self, domain: &str, result: &mut ResolutionResult) {
        // lookup_host requires a port; it plays no role in the answers.
        let fut = tokio::net::lookup_host((domain, 0u16));
        if let Ok(Ok(addrs)) = timeout(self.query_timeout, fut).await {
            for addr in addrs {
                match addr.ip() {
                    IpAddr::V4(v4) => push_unique(&mut result.ipv4, v4.to_string()),
                    IpAddr::V6(v6) => push_unique(&mut result.ipv6, v6.to_string()),
                }
            }
        }
    }
}

/// Append preserving order, skipping duplicates.
fn push_unique(list: &mut Vec<String>, addr: String) {
    if !list.contains(&addr) {
        list.push(addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_timeout_config() -> NetworkConfig {
        NetworkConfig {
            dns_timeout: Duration::from_millis(300),
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_push_unique_deduplicates() {
        let mut list = vec!["192.0.2.1".to_string()];
        push_unique(&mut list, "192.0.2.1".to_string());
        push_unique(&mut list, "192.0.2.2".to_string());
        assert_eq!(list, vec!["192.0.2.1", "192.0.2.2"]);
    }

    #[test]
    fn test_unresolved_marker() {
        let empty = ResolutionResult::default();
        assert!(empty.is_unresolved());

        let v6_only = ResolutionResult {
            ipv4: vec![],
            ipv6: vec!["2001:db8::1".to_string()],
        };
        assert!(!v6_only.is_unresolved());
    }

    #[tokio::test]
    async fn test_unresolvable_domain_degrades_to_empty() {
        // `.invalid` is reserved (RFC 2606); neither tier can resolve it.
        let resolver = IpResolver::new(&short_timeout_config());
        let result = resolver.resolve("definitely-not-real.invalid").await;
        assert!(result.is_unresolved());
    }

    #[tokio::test]
    async fn test_unparseable_name_degrades_to_empty() {
        let resolver = IpResolver::new(&short_timeout_config());
        let result = resolver.resolve("bad name with spaces").await;
        assert!(result.is_unresolved());
    }
}
