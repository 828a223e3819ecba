//! Error types for the relay pipeline.
//!
//! Fetch failures are usually collapsed into an empty page before they reach
//! the orchestrator (see [`CollapseErrors`](crate::fetchers::CollapseErrors)),
//! so [`FetchError`] mostly shows up in logs. [`CategoryNotFound`] and
//! [`SendError`] are what the router and the transport see.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a rendered listing page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid source url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page load of {url} timed out after {after:?}")]
    PageLoadTimeout { url: String, after: Duration },

    #[error("listing marker `{selector}` did not appear within {after:?}")]
    MarkerTimeout { selector: String, after: Duration },

    #[error("listing marker `{selector}` missing from {url}")]
    MarkerMissing { selector: String, url: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("browser session already shut down")]
    SessionClosed,
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser(e.to_string())
    }
}

/// A category key that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("category `{0}` not found")]
pub struct CategoryNotFound(pub String);

/// Invalid category table passed to
/// [`CategoryRegistry::new`](crate::categories::CategoryRegistry::new).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate category key `{0}`")]
    DuplicateKey(String),
    #[error("category key must not be empty")]
    EmptyKey,
    #[error("category `{0}` has no label")]
    MissingLabel(String),
    #[error("category `{key}` has an invalid url `{url}`")]
    InvalidUrl { key: String, url: String },
}

/// The chat transport refused an outbound message.
#[derive(Debug, Error)]
#[error("failed to deliver message: {0}")]
pub struct SendError(pub String);
