//! Supported galaxies and the sky coverage of their extinction maps
//!
//! The Zaritsky & Harris extinction maps exist for the two Magellanic Clouds only.
//! Each map covers a fixed rectangle in (RA, Dec); queries outside it return
//! nothing useful from the remote pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a galaxy name is not one of the supported identifiers
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Galaxy must be 'LMC' or 'SMC', got '{0}'")]
pub struct UnknownGalaxy(pub String);

/// Galaxy with a published extinction map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Galaxy {
    /// Large Magellanic Cloud
    Lmc,
    /// Small Magellanic Cloud
    Smc,
}

/// Rectangular sky coverage of one extinction map (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Minimum right ascension in hours
    pub ra_min_hours: f64,
    /// Maximum right ascension in hours
    pub ra_max_hours: f64,
    /// Minimum declination in degrees
    pub dec_min_degrees: f64,
    /// Maximum declination in degrees
    pub dec_max_degrees: f64,
}

impl Footprint {
    /// Check whether a coordinate lies inside the footprint
    pub fn contains(&self, ra_hours: f64, dec_degrees: f64) -> bool {
        self.contains_ra(ra_hours)
            && (self.dec_min_degrees..=self.dec_max_degrees).contains(&dec_degrees)
    }

    /// Check the right ascension bound alone
    pub fn contains_ra(&self, ra_hours: f64) -> bool {
        (self.ra_min_hours..=self.ra_max_hours).contains(&ra_hours)
    }
}

impl fmt::Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "RA must be between {} and {} hours and Dec between {} and {} degrees",
            self.ra_min_hours, self.ra_max_hours, self.dec_min_degrees, self.dec_max_degrees
        )
    }
}

const LMC_FOOTPRINT: Footprint = Footprint {
    ra_min_hours: 4.48,
    ra_max_hours: 6.27,
    dec_min_degrees: -72.5,
    dec_max_degrees: -65.2,
};

const SMC_FOOTPRINT: Footprint = Footprint {
    ra_min_hours: 0.375,
    ra_max_hours: 1.375,
    dec_min_degrees: -74.9,
    dec_max_degrees: -70.4,
};

impl Galaxy {
    /// All supported galaxies
    pub const ALL: [Galaxy; 2] = [Galaxy::Lmc, Galaxy::Smc];

    /// Upper-case survey identifier ("LMC" or "SMC")
    pub fn name(&self) -> &'static str {
        match self {
            Galaxy::Lmc => "LMC",
            Galaxy::Smc => "SMC",
        }
    }

    /// Sky coverage of this galaxy's extinction map
    pub fn footprint(&self) -> Footprint {
        match self {
            Galaxy::Lmc => LMC_FOOTPRINT,
            Galaxy::Smc => SMC_FOOTPRINT,
        }
    }
}

impl FromStr for Galaxy {
    type Err = UnknownGalaxy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LMC" => Ok(Galaxy::Lmc),
            "SMC" => Ok(Galaxy::Smc),
            _ => Err(UnknownGalaxy(s.to_string())),
        }
    }
}

impl fmt::Display for Galaxy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
