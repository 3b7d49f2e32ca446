//! The extinction lookup pipeline
//!
//! [`ExtinctionClient`] runs validate -> build request -> fetch -> parse ->
//! select -> aggregate, once per call. Every stage error is propagated unchanged
//! inside an [`ExtinctionError`]; nothing is retried.

use crate::config::{ConfigError, LookupConfig};
use crate::fetch::{FetchError, Fetcher, HttpFetcher};
use crate::galaxy::Galaxy;
use crate::parse::{parse_response, ParseError, ReportedSummary};
use crate::query::{Query, QueryError, TemperatureFilter};
use crate::stats::{select_records, ExtinctionStats, StatsError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Local and page-reported statistics further apart than this are logged
const REPORTED_MISMATCH_MAG: f64 = 0.01;

/// Failure category of a lookup, for callers that branch on the kind of error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Network,
    Parse,
    NoDataFound,
}

/// Errors returned by an extinction lookup
#[derive(Error, Debug)]
pub enum ExtinctionError {
    #[error("Input error: {0}")]
    InvalidInput(#[from] QueryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request error: {0}")]
    Network(#[from] FetchError),

    #[error("Response error: {0}")]
    Parse(#[from] ParseError),

    #[error("No {filter} stars found within {radius_arcmin} arcminutes. Try increasing the radius.")]
    NoDataFound {
        radius_arcmin: f64,
        filter: TemperatureFilter,
    },
}

impl ExtinctionError {
    /// Failure category; configuration problems count as invalid input
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtinctionError::InvalidInput(_) | ExtinctionError::Config(_) => {
                ErrorKind::InvalidInput
            }
            ExtinctionError::Network(_) => ErrorKind::Network,
            ExtinctionError::Parse(_) => ErrorKind::Parse,
            ExtinctionError::NoDataFound { .. } => ErrorKind::NoDataFound,
        }
    }
}

/// Extinction statistics for one lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookupResult {
    /// Mean Av in magnitudes
    pub mean_extinction: f64,
    /// Sample standard deviation of Av in magnitudes
    pub stdev_extinction: f64,
    /// Stars aggregated; `None` when the page's own summary was used
    pub star_count: Option<usize>,
}

impl LookupResult {
    fn from_stats(stats: ExtinctionStats) -> Self {
        Self {
            mean_extinction: stats.mean,
            stdev_extinction: stats.stdev,
            star_count: Some(stats.count),
        }
    }

    fn from_reported(reported: ReportedSummary) -> Self {
        Self {
            mean_extinction: reported.mean_extinction,
            stdev_extinction: reported.stdev_extinction,
            star_count: None,
        }
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Mean Av: {} mag, Standard deviation: {} mag",
            self.mean_extinction, self.stdev_extinction
        )
    }
}

/// Runs extinction lookups against the configured endpoints
///
/// Holds only immutable state, so one client can serve concurrent lookups
/// from several threads when its fetcher allows it.
#[derive(Debug, Clone)]
pub struct ExtinctionClient<F = HttpFetcher> {
    config: LookupConfig,
    lmc_endpoint: Url,
    smc_endpoint: Url,
    fetcher: F,
}

impl ExtinctionClient<HttpFetcher> {
    /// Create a client that fetches over HTTP
    pub fn from_config(config: LookupConfig) -> Result<Self, ExtinctionError> {
        let fetcher = HttpFetcher::new(config.timeout()?, &config.user_agent)?;
        Ok(Self::with_fetcher(config, fetcher)?)
    }
}

impl<F: Fetcher> ExtinctionClient<F> {
    /// Create a client with an explicit page source
    ///
    /// Endpoints are parsed here so a running lookup cannot fail on
    /// configuration.
    pub fn with_fetcher(config: LookupConfig, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lmc_endpoint: config.endpoint(Galaxy::Lmc)?,
            smc_endpoint: config.endpoint(Galaxy::Smc)?,
            config,
            fetcher,
        })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn endpoint(&self, galaxy: Galaxy) -> &Url {
        match galaxy {
            Galaxy::Lmc => &self.lmc_endpoint,
            Galaxy::Smc => &self.smc_endpoint,
        }
    }

    /// Validate raw arguments and run a lookup
    ///
    /// # Arguments
    ///
    /// * `galaxy` - "LMC" or "SMC" (case-insensitive)
    /// * `ra_hours` - Right ascension in hours
    /// * `dec_degrees` - Declination in degrees
    /// * `radius_arcmin` - Search radius, at most 12 arcminutes
    /// * `teff` - "all", "cool" or "hot"
    pub fn get_extinction(
        &self,
        galaxy: &str,
        ra_hours: f64,
        dec_degrees: f64,
        radius_arcmin: f64,
        teff: &str,
    ) -> Result<LookupResult, ExtinctionError> {
        let query = Query::new(galaxy, ra_hours, dec_degrees, radius_arcmin, teff)?;
        self.lookup(&query)
    }

    /// Run one lookup for a validated query
    pub fn lookup(&self, query: &Query) -> Result<LookupResult, ExtinctionError> {
        if self.config.enforce_footprint {
            query.check_footprint()?;
        }

        let request = query.request(self.endpoint(query.galaxy()));
        let body = self.fetcher.fetch(&request)?;
        let parsed = parse_response(&body)?;

        if parsed.records.is_empty() {
            if let Some(reported) = parsed.reported {
                log::info!(
                    "No star rows in {} response, using the page's reported summary",
                    query.galaxy()
                );
                return Ok(LookupResult::from_reported(reported));
            }
        }

        let selected = select_records(&parsed.records, query);
        log::debug!(
            "{} of {} stars within {} arcmin match teff={}",
            selected.len(),
            parsed.records.len(),
            query.radius_arcmin(),
            query.temperature_filter()
        );

        let stats = ExtinctionStats::from_records(selected.iter().copied()).map_err(|e| match e {
            StatsError::NoData => ExtinctionError::NoDataFound {
                radius_arcmin: query.radius_arcmin(),
                filter: query.temperature_filter(),
            },
            StatsError::NonFinite(index) => ParseError::NonFiniteValue { index }.into(),
        })?;

        if let Some(reported) = parsed.reported {
            let mean_diff = (reported.mean_extinction - stats.mean).abs();
            let stdev_diff = (reported.stdev_extinction - stats.stdev).abs();
            if mean_diff > REPORTED_MISMATCH_MAG || stdev_diff > REPORTED_MISMATCH_MAG {
                log::warn!(
                    "Computed Av {:.3} +/- {:.3} differs from page-reported {:.3} +/- {:.3}",
                    stats.mean,
                    stats.stdev,
                    reported.mean_extinction,
                    reported.stdev_extinction
                );
            }
        }

        Ok(LookupResult::from_stats(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchRequest;
    use std::time::Duration;

    struct Canned(&'static str);

    impl Fetcher for Canned {
        fn fetch(&self, _request: &FetchRequest) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    struct Offline;

    impl Fetcher for Offline {
        fn fetch(&self, _request: &FetchRequest) -> Result<String, FetchError> {
            Err(FetchError::Timeout(Duration::from_secs(1)))
        }
    }

    #[test]
    fn test_error_kinds() {
        let invalid: ExtinctionError = QueryError::RadiusOutOfRange(20.0).into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidInput);

        let config: ExtinctionError = ConfigError::InvalidTimeout.into();
        assert_eq!(config.kind(), ErrorKind::InvalidInput);

        let network: ExtinctionError = FetchError::Connection("refused".to_string()).into();
        assert_eq!(network.kind(), ErrorKind::Network);

        let parse: ExtinctionError = ParseError::MissingTable.into();
        assert_eq!(parse.kind(), ErrorKind::Parse);

        let empty = ExtinctionError::NoDataFound {
            radius_arcmin: 2.0,
            filter: TemperatureFilter::Hot,
        };
        assert_eq!(empty.kind(), ErrorKind::NoDataFound);
        assert_eq!(
            empty.to_string(),
            "No hot stars found within 2 arcminutes. Try increasing the radius."
        );
    }

    #[test]
    fn test_result_display() {
        let result = LookupResult {
            mean_extinction: 0.43,
            stdev_extinction: 0.12,
            star_count: Some(7),
        };
        assert_eq!(
            result.to_string(),
            "Mean Av: 0.43 mag, Standard deviation: 0.12 mag"
        );
    }

    #[test]
    fn test_network_error_propagates() {
        let client = ExtinctionClient::with_fetcher(LookupConfig::default(), Offline).unwrap();
        let err = client
            .get_extinction("LMC", 5.27, -69.5, 5.0, "all")
            .unwrap_err();
        assert!(matches!(
            err,
            ExtinctionError::Network(FetchError::Timeout(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = LookupConfig {
            smc_endpoint: "nope".to_string(),
            ..Default::default()
        };
        assert!(ExtinctionClient::with_fetcher(config, Offline).is_err());
    }

    #[test]
    fn test_single_star_lookup() {
        let page = "<pre>\nRA Dec Teff Av\n5.27 -69.5 6000 0.4\n</pre>";
        let client = ExtinctionClient::with_fetcher(LookupConfig::default(), Canned(page)).unwrap();
        let result = client.get_extinction("lmc", 5.27, -69.5, 1.0, "cool").unwrap();
        assert_eq!(result.mean_extinction, 0.4);
        assert_eq!(result.stdev_extinction, 0.0);
        assert_eq!(result.star_count, Some(1));
    }
}
