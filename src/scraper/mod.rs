//! Status page fetching.
//!
//! The scraper owns a reusable HTTP client built once from an explicit
//! [`ScrapeConfig`] and performs one synchronous fetch → parse sequence
//! per call. There is no retry, backoff, or timeout logic beyond what the
//! HTTP client itself enforces; callers serialize concurrent scrapes.

mod config;

pub use config::{ConfigError, FileConfig, ScrapeConfig};

use crate::parse::{parse_status, ParseError};
use crate::snapshot::StatusSnapshot;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while scraping the status page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The scrape configuration failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An extra header name or value is not valid HTTP.
    #[error("invalid extra header {name:?}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The fetch could not complete (connection, TLS, or body read).
    #[error("error scraping apache: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-200 status.
    #[error("unexpected response status {status}: {body}")]
    Status {
        /// The HTTP status code received.
        status: StatusCode,
        /// The response body, for diagnostics.
        body: String,
    },

    /// A recognized field in the response body failed to decode.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ScrapeError {
    /// Whether the origin served a 200 response before the failure.
    ///
    /// Decode failures happen after a successful exchange, so the server
    /// counts as reachable; transport and protocol failures do not.
    pub fn reachable(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Fetches and decodes the status page.
#[derive(Debug)]
pub struct StatusScraper {
    config: ScrapeConfig,
    client: reqwest::Client,
}

impl StatusScraper {
    /// Builds a scraper and its HTTP client from the given configuration.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.extra_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ScrapeError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ScrapeError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }
        if let Some(host) = &config.host_override {
            let header_value = HeaderValue::from_str(host)
                .map_err(|_| ScrapeError::InvalidHeader { name: "Host".to_string() })?;
            headers.insert(header::HOST, header_value);
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .default_headers(headers)
            .build()?;

        Ok(Self { config, client })
    }

    /// The URI this scraper collects from.
    pub fn uri(&self) -> &str {
        &self.config.scrape_uri
    }

    /// Performs one scrape: a single GET, then a full decode of the body.
    pub async fn scrape(&self) -> Result<StatusSnapshot, ScrapeError> {
        tracing::debug!(uri = %self.config.scrape_uri, "scraping status page");

        let response = self.client.get(&self.config.scrape_uri).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(ScrapeError::Status {
                status,
                body: body.trim().to_string(),
            });
        }

        Ok(parse_status(&body)?)
    }
}
