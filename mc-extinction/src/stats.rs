//! Spatial and temperature-class selection, and extinction statistics
//!
//! # Conventions
//!
//! * Angular distance is the haversine great-circle separation. RA is converted
//!   from hours to degrees before the formula is applied, so the shrinking of RA
//!   offsets by cos(Dec) is handled exactly. This matters for the Magellanic
//!   Clouds, which sit near Dec -70°.
//! * The standard deviation is the **sample** standard deviation (n - 1
//!   denominator). A single star has a standard deviation of 0.

use crate::parse::StarRecord;
use crate::query::{hours_to_degrees, Query};
use thiserror::Error;

const ARCMIN_PER_DEGREE: f64 = 60.0;

/// Error types for extinction statistics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Non-finite value encountered at index {0}")]
    NonFinite(usize),
    #[error("No data provided (empty slice)")]
    NoData,
}

/// Great-circle separation between two sky positions in arcminutes
///
/// # Arguments
///
/// * `ra1_hours`, `dec1_degrees` - First position (RA in hours, Dec in degrees)
/// * `ra2_hours`, `dec2_degrees` - Second position (RA in hours, Dec in degrees)
pub fn angular_separation_arcmin(
    ra1_hours: f64,
    dec1_degrees: f64,
    ra2_hours: f64,
    dec2_degrees: f64,
) -> f64 {
    let ra1 = hours_to_degrees(ra1_hours).to_radians();
    let ra2 = hours_to_degrees(ra2_hours).to_radians();
    let dec1 = dec1_degrees.to_radians();
    let dec2 = dec2_degrees.to_radians();

    let d_ra = ra2 - ra1;
    let d_dec = dec2 - dec1;

    let a = (d_dec / 2.0).sin().powi(2) + dec1.cos() * dec2.cos() * (d_ra / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let angular_distance = 2.0 * a.min(1.0).sqrt().asin();

    angular_distance.to_degrees() * ARCMIN_PER_DEGREE
}

/// Keep the records inside the query radius that pass its temperature filter
pub fn select_records<'a>(records: &'a [StarRecord], query: &Query) -> Vec<&'a StarRecord> {
    let filter = query.temperature_filter();
    records
        .iter()
        .filter(|star| filter.matches(star.temperature_class))
        .filter(|star| {
            angular_separation_arcmin(
                query.ra_hours(),
                query.dec_degrees(),
                star.ra_hours,
                star.dec_degrees,
            ) <= query.radius_arcmin()
        })
        .collect()
}

/// Mean and sample standard deviation of a set of extinction values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtinctionStats {
    /// Arithmetic mean in magnitudes
    pub mean: f64,
    /// Sample standard deviation (n - 1) in magnitudes
    pub stdev: f64,
    /// Number of values
    pub count: usize,
}

impl ExtinctionStats {
    /// Compute statistics over extinction values
    ///
    /// # Returns
    /// * `Ok(ExtinctionStats)` - Mean and sample standard deviation
    /// * `Err(StatsError::NoData)` - If `values` is empty
    /// * `Err(StatsError::NonFinite(index))` - If a NaN or infinite value is present
    pub fn from_values(values: &[f64]) -> Result<Self, StatsError> {
        if values.is_empty() {
            return Err(StatsError::NoData);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(StatsError::NonFinite(index));
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;

        let stdev = if count < 2 {
            0.0
        } else {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        };

        Ok(Self { mean, stdev, count })
    }

    /// Compute statistics over the extinction of a set of stars
    pub fn from_records<'a, I>(records: I) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = &'a StarRecord>,
    {
        let values: Vec<f64> = records.into_iter().map(|star| star.extinction).collect();
        Self::from_values(&values)
    }
}
