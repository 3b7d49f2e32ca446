//! Remote fetching of extinction-map pages
//!
//! The [`Fetcher`] trait is the only point where a lookup touches the outside
//! world. [`HttpFetcher`] performs a single blocking GET; tests substitute a
//! fetcher that returns canned pages.

use crate::galaxy::Galaxy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Host could not be reached
    #[error("Connection error: {0}")]
    Connection(String),
    /// Server answered with a non-success status
    #[error("Server error (status {status}): {message}")]
    Status { status: u16, message: String },
    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
    /// Any other transport failure
    #[error("HTTP error: {0}")]
    Http(String),
}

/// A fully-built request for one galaxy's extinction page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Galaxy whose endpoint the URL points at
    pub galaxy: Galaxy,
    /// Endpoint URL including the encoded query parameters
    pub url: Url,
}

/// Source of raw extinction-map pages
///
/// Implementations perform at most one request per call and never retry.
pub trait Fetcher {
    /// Fetch the raw response body for a request
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        (**self).fetch(request)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        (**self).fetch(request)
    }
}

/// Blocking HTTP fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with a bounded request timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - Total time allowed for connect, request and body read
    /// * `user_agent` - Value of the `User-Agent` header
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        log::debug!("GET {} ({})", request.url, request.galaxy);

        let response = self
            .client
            .get(request.url.clone())
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: response
                    .text()
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            });
        }

        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        log::debug!("Received {} bytes from {}", body.len(), request.galaxy);
        Ok(body)
    }
}
