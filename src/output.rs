//! Rendering of enrichment record batches.
//!
//! Two shapes: a human-oriented text listing and a JSON document whose
//! fields mirror the record structure (address lists per family, optional
//! rank, tagged service probe, snapshot timestamp).

use crate::analyzer::EnrichmentRecord;
use crate::probe::ServiceProbe;

/// Pretty JSON for a record batch.
pub fn render_json(records: &[EnrichmentRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Human-oriented text listing for a record batch.
pub fn render_text(records: &[EnrichmentRecord]) -> String {
    let mut out = String::new();

    for record in records {
        out.push_str(&record.domain);
        out.push('\n');

        match record.rank {
            Some(rank) => out.push_str(&format!("  rank: {rank}\n")),
            None => out.push_str("  rank: not ranked\n"),
        }

        out.push_str(&format!("  ipv4: {}\n", join_or_none(&record.addresses.ipv4)));
        out.push_str(&format!("  ipv6: {}\n", join_or_none(&record.addresses.ipv6)));

        match &record.service {
            ServiceProbe::Reachable { url, title, headers } => {
                out.push_str(&format!("  http: reachable via {url}"));
                if let Some(title) = title {
                    out.push_str(&format!(" ({title})"));
                }
                out.push('\n');
                if let Some(server) = headers.get("server") {
                    out.push_str(&format!("  server: {server}\n"));
                }
            }
            ServiceProbe::Unreachable => out.push_str("  http: unreachable\n"),
        }

        out.push('\n');
    }

    out.push_str(&format!("{} domain(s) analyzed\n", records.len()));
    out
}

fn join_or_none(addresses: &[String]) -> String {
    if addresses.is_empty() {
        "none".to_string()
    } else {
        addresses.join(", ")
    }
}
