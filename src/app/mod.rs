//! CLI-facing application façade.
//!
//! `App::run` wires configuration (defaults → environment → CLI), builds
//! the production analyzer and executes one of two flows:
//!   * URL mode: extract candidate domains from the page, then batch
//!     analysis;
//!   * domain mode: batch analysis of the domains given on the command
//!     line, no extraction.
//!
//! Returns the intended process exit code: 0 on success, 1 when URL mode
//! produced no records (fetch failed or the page referenced nothing;
//! indistinguishable at this boundary).

use std::collections::HashSet;

use tracing::{debug, info};

use crate::analyzer::DomainAnalyzer;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::output;

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end discovery + enrichment workflow.
    pub async fn run(cli: &Cli) -> Result<i32> {
        let mut config = Config::from_env();
        config.merge_with_cli(cli);
        config.validate()?;
        debug!("effective configuration: {config:?}");

        let analyzer = DomainAnalyzer::from_config(&config).await?;

        let records = if let Some(ref url) = cli.url {
            info!("analyzing page {url}");
            analyzer.analyze_url(url).await
        } else {
            let domains: HashSet<String> = cli
                .domains
                .iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
            info!("analyzing {} domain(s)", domains.len());
            analyzer.analyze_domains(domains).await
        };

        let rendered = match cli.format {
            OutputFormat::Json => output::render_json(&records).map_err(|e| {
                Error::Configuration {
                    field: "format".into(),
                    value: "json".into(),
                    reason: format!("could not serialize records: {e}"),
                }
            })?,
            OutputFormat::Text => output::render_text(&records),
        };
        println!("{rendered}");

        if cli.url.is_some() && records.is_empty() {
            return Ok(1);
        }
        Ok(0)
    }
}
