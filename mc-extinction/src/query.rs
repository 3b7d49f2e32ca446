//! Lookup queries: input validation and request construction
//!
//! A [`Query`] can only be built through validation, so every value that reaches
//! the network layer is already known to be in range. Request construction is a
//! pure mapping from a query onto the CGI parameters of the galaxy's endpoint.
//!
//! # Units
//!
//! The extinction-map CGI takes right ascension in **hours** and declination in
//! **degrees**, the same units callers supply. Coordinates therefore pass through
//! to the wire unchanged. The only conversion in the pipeline is hours to degrees
//! (`degrees = hours * 15`) when angular separations are computed.

use crate::fetch::FetchRequest;
use crate::galaxy::{Footprint, Galaxy, UnknownGalaxy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Largest search radius the extinction-map pages accept, in arcminutes
pub const MAX_RADIUS_ARCMIN: f64 = 12.0;

/// Degrees of right ascension per hour
pub const DEGREES_PER_HOUR: f64 = 15.0;

/// Convert right ascension from hours to degrees
pub fn hours_to_degrees(hours: f64) -> f64 {
    hours * DEGREES_PER_HOUR
}

/// Convert right ascension from degrees to hours
pub fn degrees_to_hours(degrees: f64) -> f64 {
    degrees / DEGREES_PER_HOUR
}

fn as_hours(degrees: &f64) -> f64 {
    degrees_to_hours(*degrees)
}

/// Errors raised while validating lookup inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    UnknownGalaxy(#[from] UnknownGalaxy),

    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("RA must be in units of hours with 0 <= RA < 24, got {0}")]
    RaOutOfRange(f64),

    #[error("RA must be in units of hours, not degrees (got {0}, i.e. {hours:.4} hours)", hours = as_hours(.0))]
    RaLooksLikeDegrees(f64),

    #[error("Dec must be in units of degrees with -90 <= Dec <= 90, got {0}")]
    DecOutOfRange(f64),

    #[error("Radius must be greater than 0 and no more than 12 arcminutes, got {0}")]
    RadiusOutOfRange(f64),

    #[error("teff must be 'all', 'cool', or 'hot', got '{0}'")]
    UnknownTemperatureFilter(String),

    #[error("For {galaxy}, {footprint} (got RA {ra_hours}, Dec {dec_degrees})")]
    OutsideFootprint {
        galaxy: Galaxy,
        footprint: Footprint,
        ra_hours: f64,
        dec_degrees: f64,
    },
}

/// Temperature class of a single star in the extinction catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureClass {
    /// Cool stars (5500 K < Teff < 6500 K)
    Cool,
    /// Hot stars (12000 K < Teff < 45000 K)
    Hot,
}

/// Which temperature classes a lookup aggregates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureFilter {
    #[default]
    All,
    Cool,
    Hot,
}

impl TemperatureFilter {
    /// Value sent as the `teff` request parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureFilter::All => "all",
            TemperatureFilter::Cool => "cool",
            TemperatureFilter::Hot => "hot",
        }
    }

    /// Check whether a star of the given class passes this filter
    pub fn matches(&self, class: TemperatureClass) -> bool {
        match self {
            TemperatureFilter::All => true,
            TemperatureFilter::Cool => class == TemperatureClass::Cool,
            TemperatureFilter::Hot => class == TemperatureClass::Hot,
        }
    }
}

impl FromStr for TemperatureFilter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TemperatureFilter::All),
            "cool" => Ok(TemperatureFilter::Cool),
            "hot" => Ok(TemperatureFilter::Hot),
            _ => Err(QueryError::UnknownTemperatureFilter(s.to_string())),
        }
    }
}

impl fmt::Display for TemperatureFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated extinction lookup
///
/// Fields are private so a `Query` always satisfies the range checks in
/// [`Query::from_parts`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    galaxy: Galaxy,
    ra_hours: f64,
    dec_degrees: f64,
    radius_arcmin: f64,
    temperature_filter: TemperatureFilter,
}

fn require_finite(name: &'static str, value: f64) -> Result<f64, QueryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QueryError::NonFinite { name, value })
    }
}

impl Query {
    /// Validate raw lookup arguments
    ///
    /// # Arguments
    ///
    /// * `galaxy` - "LMC" or "SMC" (case-insensitive)
    /// * `ra_hours` - Right ascension in hours, 0 <= ra < 24
    /// * `dec_degrees` - Declination in degrees, -90 <= dec <= 90
    /// * `radius_arcmin` - Search radius, 0 < radius <= 12 arcminutes
    /// * `temperature_filter` - "all", "cool" or "hot" (case-insensitive)
    pub fn new(
        galaxy: &str,
        ra_hours: f64,
        dec_degrees: f64,
        radius_arcmin: f64,
        temperature_filter: &str,
    ) -> Result<Self, QueryError> {
        let galaxy: Galaxy = galaxy.parse()?;
        let temperature_filter: TemperatureFilter = temperature_filter.parse()?;
        Self::from_parts(
            galaxy,
            ra_hours,
            dec_degrees,
            radius_arcmin,
            temperature_filter,
        )
    }

    /// Validate typed lookup arguments
    pub fn from_parts(
        galaxy: Galaxy,
        ra_hours: f64,
        dec_degrees: f64,
        radius_arcmin: f64,
        temperature_filter: TemperatureFilter,
    ) -> Result<Self, QueryError> {
        let ra_hours = require_finite("RA", ra_hours)?;
        let dec_degrees = require_finite("Dec", dec_degrees)?;
        let radius_arcmin = require_finite("Radius", radius_arcmin)?;

        if !(0.0..24.0).contains(&ra_hours) {
            if (24.0..360.0).contains(&ra_hours) {
                return Err(QueryError::RaLooksLikeDegrees(ra_hours));
            }
            return Err(QueryError::RaOutOfRange(ra_hours));
        }

        if !(-90.0..=90.0).contains(&dec_degrees) {
            return Err(QueryError::DecOutOfRange(dec_degrees));
        }

        if !(radius_arcmin > 0.0 && radius_arcmin <= MAX_RADIUS_ARCMIN) {
            return Err(QueryError::RadiusOutOfRange(radius_arcmin));
        }

        Ok(Self {
            galaxy,
            ra_hours,
            dec_degrees,
            radius_arcmin,
            temperature_filter,
        })
    }

    /// Reject coordinates outside the galaxy's extinction map
    ///
    /// An RA that is outside the footprint in hours but inside it once divided
    /// by 15 is reported as a degrees/hours mix-up.
    pub fn check_footprint(&self) -> Result<(), QueryError> {
        let footprint = self.galaxy.footprint();
        if footprint.contains(self.ra_hours, self.dec_degrees) {
            return Ok(());
        }

        if !footprint.contains_ra(self.ra_hours)
            && footprint.contains_ra(degrees_to_hours(self.ra_hours))
        {
            return Err(QueryError::RaLooksLikeDegrees(self.ra_hours));
        }

        Err(QueryError::OutsideFootprint {
            galaxy: self.galaxy,
            footprint,
            ra_hours: self.ra_hours,
            dec_degrees: self.dec_degrees,
        })
    }

    pub fn galaxy(&self) -> Galaxy {
        self.galaxy
    }

    pub fn ra_hours(&self) -> f64 {
        self.ra_hours
    }

    /// Right ascension converted to degrees
    pub fn ra_degrees(&self) -> f64 {
        hours_to_degrees(self.ra_hours)
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec_degrees
    }

    pub fn radius_arcmin(&self) -> f64 {
        self.radius_arcmin
    }

    pub fn temperature_filter(&self) -> TemperatureFilter {
        self.temperature_filter
    }

    /// CGI parameters in the order the extinction-map form submits them
    ///
    /// Floats use the shortest representation that round-trips, so nothing is
    /// lost between the validated query and the wire.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ra", self.ra_hours.to_string()),
            ("dec", self.dec_degrees.to_string()),
            ("searchrad", self.radius_arcmin.to_string()),
            ("teff", self.temperature_filter.as_str().to_string()),
        ]
    }

    /// Build the request for this query against a galaxy endpoint
    pub fn request(&self, endpoint: &Url) -> FetchRequest {
        let mut url = endpoint.clone();
        url.query_pairs_mut().extend_pairs(self.params());
        FetchRequest {
            galaxy: self.galaxy,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn endpoint() -> Url {
        Url::parse("https://example.org/cgi-bin/lmcext.cgi").unwrap()
    }

    #[test]
    fn test_galaxy_case_insensitive_queries_identical() {
        let lower = Query::new("smc", 0.9, -72.8, 5.0, "all").unwrap();
        let upper = Query::new("SMC", 0.9, -72.8, 5.0, "all").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.galaxy(), Galaxy::Smc);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<TemperatureFilter>().unwrap(), TemperatureFilter::All);
        assert_eq!("Cool".parse::<TemperatureFilter>().unwrap(), TemperatureFilter::Cool);
        assert_eq!(" HOT".parse::<TemperatureFilter>().unwrap(), TemperatureFilter::Hot);
        assert_eq!(TemperatureFilter::default(), TemperatureFilter::All);
        assert!(matches!(
            "warm".parse::<TemperatureFilter>(),
            Err(QueryError::UnknownTemperatureFilter(_))
        ));
    }

    #[test]
    fn test_filter_matches() {
        use TemperatureClass::*;
        assert!(TemperatureFilter::All.matches(Cool));
        assert!(TemperatureFilter::All.matches(Hot));
        assert!(TemperatureFilter::Cool.matches(Cool));
        assert!(!TemperatureFilter::Cool.matches(Hot));
        assert!(TemperatureFilter::Hot.matches(Hot));
        assert!(!TemperatureFilter::Hot.matches(Cool));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(12.0001)]
    #[case(60.0)]
    fn test_radius_out_of_range(#[case] radius: f64) {
        let result = Query::new("LMC", 5.3, -69.0, radius, "all");
        assert!(matches!(result, Err(QueryError::RadiusOutOfRange(_))));
    }

    #[rstest]
    #[case(0.0001)]
    #[case(1.0)]
    #[case(12.0)]
    fn test_radius_in_range(#[case] radius: f64) {
        let query = Query::new("LMC", 5.3, -69.0, radius, "all").unwrap();
        assert_eq!(query.radius_arcmin(), radius);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(24.0 * 15.0)]
    #[case(1000.0)]
    fn test_ra_out_of_range(#[case] ra: f64) {
        let result = Query::new("LMC", ra, -69.0, 5.0, "all");
        assert!(matches!(result, Err(QueryError::RaOutOfRange(_))));
    }

    #[test]
    fn test_ra_in_degrees_is_flagged() {
        let err = Query::new("LMC", 78.0, -69.0, 5.0, "all").unwrap_err();
        assert_eq!(err, QueryError::RaLooksLikeDegrees(78.0));
        assert!(err.to_string().contains("not degrees"));
    }

    #[test]
    fn test_ra_wrap_boundary() {
        assert!(Query::new("LMC", 0.0, -69.0, 5.0, "all").is_ok());
        assert!(Query::new("LMC", 23.999, -69.0, 5.0, "all").is_ok());
        assert!(matches!(
            Query::new("LMC", 24.0, -69.0, 5.0, "all"),
            Err(QueryError::RaLooksLikeDegrees(_))
        ));
    }

    #[rstest]
    #[case(-90.5)]
    #[case(91.0)]
    fn test_dec_out_of_range(#[case] dec: f64) {
        let result = Query::new("LMC", 5.3, dec, 5.0, "all");
        assert!(matches!(result, Err(QueryError::DecOutOfRange(_))));
    }

    #[rstest]
    #[case(f64::NAN, -69.0, 5.0)]
    #[case(5.3, f64::INFINITY, 5.0)]
    #[case(5.3, -69.0, f64::NAN)]
    fn test_non_finite_rejected(#[case] ra: f64, #[case] dec: f64, #[case] radius: f64) {
        let result = Query::new("LMC", ra, dec, radius, "all");
        assert!(matches!(result, Err(QueryError::NonFinite { .. })));
    }

    #[test]
    fn test_unknown_galaxy() {
        let err = Query::new("M33", 1.5, 30.6, 5.0, "all").unwrap_err();
        assert!(matches!(err, QueryError::UnknownGalaxy(_)));
        assert!(err.to_string().contains("'LMC' or 'SMC'"));
    }

    #[test]
    fn test_footprint_check() {
        let inside = Query::new("LMC", 5.3, -69.0, 5.0, "all").unwrap();
        assert!(inside.check_footprint().is_ok());

        let outside = Query::new("SMC", 5.3, -69.0, 5.0, "all").unwrap();
        assert!(matches!(
            outside.check_footprint(),
            Err(QueryError::OutsideFootprint {
                galaxy: Galaxy::Smc,
                ..
            })
        ));

        // 13.5 degrees is 0.9 hours, inside the SMC map
        let degrees = Query::new("SMC", 13.5, -72.8, 5.0, "all").unwrap();
        assert_eq!(
            degrees.check_footprint(),
            Err(QueryError::RaLooksLikeDegrees(13.5))
        );
    }

    #[test]
    fn test_hours_degrees_conversion() {
        assert_eq!(hours_to_degrees(0.0), 0.0);
        let near_wrap = hours_to_degrees(23.999);
        assert!(near_wrap < 360.0);
        assert_relative_eq!(near_wrap, 359.985, epsilon = 1e-9);
        for hours in [0.0, 0.375, 5.27, 12.0, 23.999] {
            assert_relative_eq!(degrees_to_hours(hours_to_degrees(hours)), hours, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_params_order_and_values() {
        let query = Query::new("lmc", 5.27, -69.5, 3.5, "cool").unwrap();
        assert_eq!(
            query.params(),
            vec![
                ("ra", "5.27".to_string()),
                ("dec", "-69.5".to_string()),
                ("searchrad", "3.5".to_string()),
                ("teff", "cool".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url() {
        let query = Query::new("LMC", 5.0, -69.25, 12.0, "all").unwrap();
        let request = query.request(&endpoint());
        assert_eq!(request.galaxy, Galaxy::Lmc);
        assert_eq!(
            request.url.as_str(),
            "https://example.org/cgi-bin/lmcext.cgi?ra=5&dec=-69.25&searchrad=12&teff=all"
        );
    }

    #[test]
    fn test_request_keeps_zero_ra() {
        let query = Query::new("LMC", 0.0, -69.0, 1.0, "all").unwrap();
        let request = query.request(&endpoint());
        let ra: Vec<_> = request
            .url
            .query_pairs()
            .filter(|(k, _)| k == "ra")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(ra, vec!["0".to_string()]);
    }
}
