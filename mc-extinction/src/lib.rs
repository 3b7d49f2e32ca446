//! Dust extinction lookups for the Magellanic Clouds
//!
//! Queries the Zaritsky & Harris extinction maps of the Large and Small
//! Magellanic Clouds and returns the mean and standard deviation of the visual
//! extinction (Av) of the stars around a sky position.
//!
//! Please cite Zaritsky, Harris, Thompson, Grebel & Massey 2002, AJ, 123, 855
//! and/or Zaritsky, Harris, Thompson & Grebel 2004, AJ, 128, 1606 when using
//! these maps.
//!
//! # Pipeline
//!
//! Each lookup is one synchronous pass through:
//!
//! 1. [`query`]: input validation and request parameters
//! 2. [`fetch`]: a single HTTP GET behind the [`Fetcher`] trait
//! 3. [`parse`]: HTML result page to [`StarRecord`]s
//! 4. [`stats`]: radius/temperature selection, mean and sample standard deviation
//!
//! # Usage
//!
//! ```no_run
//! use mc_extinction::get_extinction;
//!
//! # fn main() -> Result<(), mc_extinction::ExtinctionError> {
//! let result = get_extinction("LMC", 5.27, -69.5, 5.0, "all")?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```
//!
//! Tests and offline tools inject their own page source:
//!
//! ```
//! use mc_extinction::{ExtinctionClient, FetchError, FetchRequest, Fetcher, LookupConfig};
//!
//! struct Canned;
//!
//! impl Fetcher for Canned {
//!     fn fetch(&self, _request: &FetchRequest) -> Result<String, FetchError> {
//!         Ok("<pre>\nRA Dec Teff Av\n0.875 -72.8 6000 0.3\n</pre>".to_string())
//!     }
//! }
//!
//! let client = ExtinctionClient::with_fetcher(LookupConfig::default(), Canned).unwrap();
//! let result = client.get_extinction("smc", 0.875, -72.8, 1.0, "cool").unwrap();
//! assert_eq!(result.mean_extinction, 0.3);
//! ```

pub mod config;
pub mod fetch;
pub mod galaxy;
pub mod lookup;
pub mod parse;
pub mod query;
pub mod stats;

pub use config::{ConfigError, LookupConfig};
pub use fetch::{FetchError, FetchRequest, Fetcher, HttpFetcher};
pub use galaxy::Galaxy;
pub use lookup::{ErrorKind, ExtinctionClient, ExtinctionError, LookupResult};
pub use parse::{ParseError, StarRecord};
pub use query::{Query, QueryError, TemperatureClass, TemperatureFilter};

/// Look up extinction statistics with the default configuration over HTTP
///
/// # Arguments
///
/// * `galaxy` - "LMC" or "SMC" (case-insensitive)
/// * `ra_hours` - Right ascension in hours (e.g. 5.27, not 79.05 degrees)
/// * `dec_degrees` - Declination in degrees
/// * `radius_arcmin` - Search radius, greater than 0 and at most 12 arcminutes
/// * `teff` - "all", "cool" or "hot"
///
/// # Returns
///
/// Mean Av and its sample standard deviation, or an [`ExtinctionError`] whose
/// [`ExtinctionError::kind`] tells invalid input, network, parse and no-data
/// failures apart. Input is validated before the HTTP client is created.
pub fn get_extinction(
    galaxy: &str,
    ra_hours: f64,
    dec_degrees: f64,
    radius_arcmin: f64,
    teff: &str,
) -> Result<LookupResult, ExtinctionError> {
    let query = Query::new(galaxy, ra_hours, dec_degrees, radius_arcmin, teff)?;
    ExtinctionClient::from_config(LookupConfig::default())?.lookup(&query)
}
