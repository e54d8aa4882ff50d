//! Integration tests for domainscope.
//!
//! These tests verify end-to-end behavior without relying on external
//! network services: extraction runs against in-memory fixtures, the rank
//! tier chain against temp files and dead loopback endpoints, and the HTTP
//! prober against raw loopback listeners speaking just enough HTTP/1.1.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use domainscope::analyzer::{
    AddressResolver, DomainAnalyzer, DomainDiscovery, RankProvider, ServiceProber,
};
use domainscope::config::{BatchConfig, NetworkConfig, RankConfig};
use domainscope::errors::{Error, Result};
use domainscope::{
    extract_candidates, HttpProber, RankSource, RankTable, ResolutionResult, ServiceProbe,
};

/* ----------------------------- extraction ------------------------------ */

#[test]
fn extraction_end_to_end_fixture() {
    // Three outbound links: two real domains and an IP literal.
    let html = r#"
        <html><body>
          <a href="https://a.com/page">A</a>
          <a href="http://b.org">B</a>
          <a href="192.168.1.1/path">router</a>
          <a href="/local">local</a>
        </body></html>"#;

    let domains = extract_candidates(html, "base.com");
    let expected: HashSet<String> = ["a.com", "b.org", "base.com"]
        .iter()
        .map(|d| d.to_string())
        .collect();
    assert_eq!(domains, expected);
}

#[test]
fn extraction_covers_all_absolute_link_hosts() {
    let hosts = ["one.example.net", "two.example.org", "three.example.io"];
    let html: String = hosts
        .iter()
        .map(|h| format!(r#"<a href="https://{h}/x">{h}</a>"#))
        .collect();

    let domains = extract_candidates(&html, "base.com");
    for host in hosts {
        assert!(domains.contains(host), "missing {host}");
    }
    assert!(domains.contains("base.com"));
    assert!(domains.len() >= hosts.len() + 1);
}

#[test]
fn extraction_rejects_ip_and_version_tokens() {
    let html = r#"
        <html><body>
          <p>Contact 10.1.2.3 or read the v2.5 notes at docs.example.com.</p>
        </body></html>"#;
    let domains = extract_candidates(html, "base.com");
    assert!(domains.contains("docs.example.com"));
    assert!(!domains.iter().any(|d| d.contains("10.1.2.3")));
    assert!(!domains.contains("2.5"));
}

/* ----------------------------- rank tiers ------------------------------ */

#[tokio::test]
async fn rank_cache_tier_wins_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("rank_list.csv");
    std::fs::write(&cache, "1,google.com\n5,example.com\n").unwrap();

    let config = RankConfig {
        // Dead endpoint: the remote tier must never be consulted.
        list_url: "http://127.0.0.1:1/list".to_string(),
        cache_path: cache,
    };
    let table = RankTable::load(&config).await;
    assert_eq!(table.source(), RankSource::Cache);
    assert_eq!(table.rank("example.com"), Some(5));
    assert_eq!(table.rank("www.example.com"), Some(5));
    assert_eq!(table.rank("missing.test"), None);
}

#[tokio::test]
async fn rank_chain_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let config = RankConfig {
        list_url: "http://127.0.0.1:1/list".to_string(),
        cache_path: dir.path().join("absent.csv"),
    };
    let table = RankTable::load(&config).await;
    assert_eq!(table.source(), RankSource::Builtin);
    assert_eq!(table.rank("google.com"), Some(1));
}

#[tokio::test]
async fn rank_unparseable_cache_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("garbage.csv");
    std::fs::write(&cache, "this is not a rank list\n").unwrap();

    let config = RankConfig {
        list_url: "http://127.0.0.1:1/list".to_string(),
        cache_path: cache,
    };
    let table = RankTable::load(&config).await;
    assert_eq!(table.source(), RankSource::Builtin);
}

/* ----------------------------- HTTP probe ------------------------------ */

/// Minimal loopback HTTP/1.1 endpoint: answers every connection with the
/// given status/extra headers/body, omitting the body for HEAD requests.
async fn spawn_http_server(
    status: &'static str,
    extra_headers: &'static str,
    body: &'static str,
) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let is_head = request.starts_with("HEAD");

                let mut response = format!(
                    "HTTP/1.1 {status}\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                if !is_head {
                    response.push_str(body);
                }
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn probe_falls_back_past_server_error() {
    let erroring = spawn_http_server("500 Internal Server Error", "", "boom").await;
    let healthy = spawn_http_server(
        "200 OK",
        "Content-Type: text/html\r\nX-Probe: ok\r\n",
        "<html><head><title> It Works </title></head><body>hi</body></html>",
    )
    .await;

    let prober = HttpProber::new(&NetworkConfig::default()).unwrap();
    let probe = prober
        .probe_candidates(&[erroring.clone(), healthy.clone()])
        .await;

    match probe {
        ServiceProbe::Reachable { url, headers, title } => {
            assert_eq!(url, healthy);
            assert_eq!(title.as_deref(), Some("It Works"));
            assert_eq!(headers.get("x-probe").map(String::as_str), Some("ok"));
        }
        ServiceProbe::Unreachable => panic!("expected fallback candidate to be reachable"),
    }
}

#[tokio::test]
async fn probe_reachability_survives_title_miss() {
    // Reachable endpoint whose body has no title element.
    let bare = spawn_http_server("204 No Content", "", "").await;

    let prober = HttpProber::new(&NetworkConfig::default()).unwrap();
    let probe = prober.probe_candidates(&[bare]).await;
    assert!(probe.is_reachable());
    assert_eq!(probe.title(), None);
}

#[tokio::test]
async fn probe_all_candidates_dead_is_unreachable() {
    // Bind then drop to get a (very likely) refused port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let prober = HttpProber::new(&NetworkConfig::default()).unwrap();
    let probe = prober.probe_candidates(&[format!("http://{addr}")]).await;
    assert_eq!(probe, ServiceProbe::Unreachable);
}

/* ------------------------- batch orchestration ------------------------- */

struct NoDiscovery;
#[async_trait]
impl DomainDiscovery for NoDiscovery {
    async fn extract(&self, _source_url: &str) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }
}

struct FailingDiscovery;
#[async_trait]
impl DomainDiscovery for FailingDiscovery {
    async fn extract(&self, source_url: &str) -> Result<HashSet<String>> {
        Err(Error::FetchStatus {
            url: source_url.to_string(),
            status: 503,
        })
    }
}

/// Resolver that panics for one specific domain, the "unexpected internal
/// fault" a batch has to survive.
struct PanickyResolver;
#[async_trait]
impl AddressResolver for PanickyResolver {
    async fn resolve(&self, domain: &str) -> ResolutionResult {
        if domain == "boom.test" {
            panic!("internal fault while resolving {domain}");
        }
        ResolutionResult {
            ipv4: vec!["192.0.2.77".to_string()],
            ipv6: vec![],
        }
    }
}

struct NoRanks;
impl RankProvider for NoRanks {
    fn rank(&self, _domain: &str) -> Option<u32> {
        None
    }
}

struct InstantProber;
#[async_trait]
impl ServiceProber for InstantProber {
    async fn probe(&self, _domain: &str) -> ServiceProbe {
        ServiceProbe::Unreachable
    }
}

struct SlowProber;
#[async_trait]
impl ServiceProber for SlowProber {
    async fn probe(&self, _domain: &str) -> ServiceProbe {
        tokio::time::sleep(Duration::from_secs(30)).await;
        ServiceProbe::Unreachable
    }
}

fn analyzer_with(
    discovery: Arc<dyn DomainDiscovery>,
    prober: Arc<dyn ServiceProber>,
) -> DomainAnalyzer {
    DomainAnalyzer::new(
        discovery,
        Arc::new(PanickyResolver),
        Arc::new(NoRanks),
        prober,
        &BatchConfig {
            max_in_flight: 4,
            permits_per_sec: 1000,
        },
    )
}

#[tokio::test]
async fn batch_survives_panicking_domain() {
    let analyzer = analyzer_with(Arc::new(NoDiscovery), Arc::new(InstantProber));

    let domains = vec![
        "ok-one.test".to_string(),
        "boom.test".to_string(),
        "ok-two.test".to_string(),
    ];
    let mut records = analyzer.analyze_domains(domains).await;
    records.sort_by(|a, b| a.domain.cmp(&b.domain));

    let names: Vec<&str> = records.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(names, vec!["ok-one.test", "ok-two.test"]);
    assert!(records.iter().all(|r| r.addresses.ipv4 == ["192.0.2.77"]));
}

#[tokio::test]
async fn cancellation_abandons_in_flight_work() {
    let analyzer = analyzer_with(Arc::new(NoDiscovery), Arc::new(SlowProber));
    let token = CancellationToken::new();

    let domains: Vec<String> = (0..6).map(|i| format!("slow-{i}.test")).collect();

    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let start = Instant::now();
    let records = analyzer.analyze_domains_with_cancel(domains, &token).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_secs(5),
        "cancelled batch blocked for {elapsed:?}"
    );
    // Nothing can have finished: every probe needs 30s.
    assert!(records.is_empty());
}

#[tokio::test]
async fn analyze_url_swallows_fetch_failure_into_empty_batch() {
    let analyzer = analyzer_with(Arc::new(FailingDiscovery), Arc::new(InstantProber));
    let records = analyzer.analyze_url("https://down.example").await;
    assert!(records.is_empty());
}
