#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Fogos.PT incident feed access.
//!
//! [`FeedClient`] fetches the active-incident list over HTTPS with
//! transient-error retry; [`IncidentFeed`] is the seam the engine consumes,
//! so tests substitute a scripted feed.

pub mod parse;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use fogo_watch_incident_models::Incident;

/// Default endpoint listing every currently active incident.
pub const DEFAULT_FEED_URL: &str = "https://api.fogos.pt/v2/incidents/active?all=1";

/// How long one feed request may take before it is abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching or decoding the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response decoded but did not have the expected shape.
    #[error("Malformed feed response: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Source of the current active-incident list.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Fetches every currently active incident.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the feed is unreachable or the response
    /// cannot be decoded. Individually malformed records are skipped, not
    /// errors.
    async fn fetch_active(&self) -> Result<Vec<Incident>, FeedError>;
}

/// HTTP client for the Fogos.PT feed.
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Creates a client for `url` with a pooled connection, a user agent,
    /// and a request timeout so one fetch can never stall a cycle
    /// indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying client cannot be built.
    pub fn new(url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent("fogo-watch/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl IncidentFeed for FeedClient {
    async fn fetch_active(&self) -> Result<Vec<Incident>, FeedError> {
        let body = retry::send_json(|| self.client.get(&self.url)).await?;
        let incidents = parse::parse_incidents(&body)?;
        log::debug!("Feed returned {} active incident(s)", incidents.len());
        Ok(incidents)
    }
}
