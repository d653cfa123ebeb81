use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SupermarketId;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GeoError {
    #[error("latitude must be within [-90, 90], got {0}")]
    InvalidLatitude(f64),

    #[error("longitude must be within [-180, 180], got {0}")]
    InvalidLongitude(f64),

    #[error("supermarket name cannot be empty")]
    EmptyName,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// # Errors
    ///
    /// Returns `GeoError` for out-of-range or non-finite coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A shop marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supermarket {
    pub id: SupermarketId,
    pub name: String,
    /// Human-readable address shown under the marker title.
    #[serde(default)]
    pub location: String,
    pub geopoint: GeoPoint,
}

impl Supermarket {
    /// # Errors
    ///
    /// Returns `GeoError::EmptyName` for a blank name.
    pub fn new(
        id: SupermarketId,
        name: impl Into<String>,
        location: impl Into<String>,
        geopoint: GeoPoint,
    ) -> Result<Self, GeoError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(GeoError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            location: location.into(),
            geopoint,
        })
    }
}
