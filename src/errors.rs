//! Error model for domainscope.
//!
//! The enrichment pipeline is deliberately lopsided about failure:
//!   * Document fetch problems are real errors and surface to the caller
//!     of extraction (`Error::Fetch*`).
//!   * DNS, rank and HTTP probe failures never surface as `Err`; they
//!     degrade into empty/absent values inside the result structures
//!     (`ResolutionResult`, `ServiceProbe::Unreachable`, `None` rank).
//!   * A panic while analyzing one domain of a batch is caught at the task
//!     boundary, logged and skipped.
//!
//! Variants here therefore cover only the paths that are allowed to fail:
//! fetching, input validation, configuration and the internal rank-list
//! tiers (whose failures are consumed by the fallback chain, never
//! propagated past it).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Primary application error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure while retrieving a document.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The document was retrieved but with a non-success status.
    #[error("fetch of {url} returned HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    /// The source URL could not be parsed or has no host component.
    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A rank-list tier failed (consumed by the fallback chain).
    #[error("rank list unavailable: {reason}")]
    RankList { reason: String },

    /// Invalid configuration value.
    #[error("invalid value '{value}' for '{field}': {reason}")]
    Configuration {
        field: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Helper for host-less or unparseable source URLs.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Helper for rank-list tier failures.
    pub fn rank_list(reason: impl Into<String>) -> Self {
        Error::RankList {
            reason: reason.into(),
        }
    }

    /// True when this error came out of the document-fetch path
    /// (transport failure or non-success status).
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::FetchStatus { .. })
    }
}
