//! Lookup configuration
//!
//! Endpoints, timeouts and validation switches are passed explicitly into an
//! [`crate::ExtinctionClient`]; nothing is read from process-wide state.
//! Configurations can be stored as pretty-printed JSON.

use crate::galaxy::Galaxy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default LMC extinction-map endpoint
pub const DEFAULT_LMC_ENDPOINT: &str = "https://www.as.arizona.edu/~dennis/cgi-bin/lmcext.cgi";

/// Default SMC extinction-map endpoint
pub const DEFAULT_SMC_ENDPOINT: &str = "https://www.as.arizona.edu/~dennis/cgi-bin/smcext.cgi";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading or using a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid endpoint URL for {galaxy}: {url} ({reason})")]
    InvalidEndpoint {
        galaxy: Galaxy,
        url: String,
        reason: String,
    },

    #[error("Timeout must be at least one second")]
    InvalidTimeout,

    #[error("Failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for extinction lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// LMC extinction-map CGI endpoint
    pub lmc_endpoint: String,
    /// SMC extinction-map CGI endpoint
    pub smc_endpoint: String,
    /// Upper bound on a single request, in seconds
    pub timeout_secs: u64,
    /// `User-Agent` header sent with each request
    pub user_agent: String,
    /// Reject coordinates outside the galaxy's map before any request is made
    pub enforce_footprint: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            lmc_endpoint: DEFAULT_LMC_ENDPOINT.to_string(),
            smc_endpoint: DEFAULT_SMC_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            enforce_footprint: true,
        }
    }
}

impl LookupConfig {
    /// Parsed endpoint URL for a galaxy
    pub fn endpoint(&self, galaxy: Galaxy) -> Result<Url, ConfigError> {
        let raw = match galaxy {
            Galaxy::Lmc => &self.lmc_endpoint,
            Galaxy::Smc => &self.smc_endpoint,
        };

        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
            galaxy,
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                galaxy,
                url: raw.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(Duration::from_secs(self.timeout_secs))
    }

    /// Check every field that can be invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout()?;
        for galaxy in Galaxy::ALL {
            self.endpoint(galaxy)?;
        }
        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
