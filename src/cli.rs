use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output rendering for analysis results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-oriented listing.
    Text,
    /// Pretty-printed JSON records.
    Json,
}

/// Command-line interface definition.
///
/// Either a page URL (discover + analyze every referenced domain) or one
/// or more `--domain` flags (analyze those domains directly).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Discover domains referenced by a web page and enrich them with DNS, rank and HTTP service facts"
)]
pub struct Cli {
    /// Page URL to extract candidate domains from. Required unless --domain is given.
    #[arg(required_unless_present = "domains", conflicts_with = "domains")]
    pub url: Option<String>,

    /// Analyze this domain directly (repeatable), skipping extraction.
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Source-document fetch timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Per-request HTTP probe timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub probe_timeout: Option<u64>,

    /// Per-query DNS timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub dns_timeout: Option<u64>,

    /// Maximum domains analyzed concurrently.
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Global outbound pacing in analysis starts per second.
    #[arg(long, value_name = "N")]
    pub permits_per_sec: Option<u32>,

    /// Remote rank list URL.
    #[arg(long, value_name = "URL")]
    pub rank_url: Option<String>,

    /// Rank list cache file.
    #[arg(long, value_name = "FILE")]
    pub rank_cache: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// tracing filter directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "domainscope=info",
            1 => "domainscope=debug",
            _ => "trace",
        }
    }
}
