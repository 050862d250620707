//! Geographic primitives shared by the sampler and the fetchers.
//!
//! Distances use the haversine great-circle formula on a spherical earth,
//! which is accurate to well under a metre at the scales the location gate
//! cares about (tens of metres).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mean earth radius used by [`haversine_meters`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] when `lat` is outside
    /// `[-90, 90]`, `lng` is outside `[-180, 180]`, or either is NaN/infinite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(CoreError::InvalidCoordinates { lat, lng })
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self, other)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Great-circle distance between two points in metres.
#[must_use]
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// One raw reading from the platform geolocation provider.
///
/// `timestamp_ms` is a monotonic capture time in milliseconds; only
/// differences between samples are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    pub timestamp_ms: u64,
}

impl LocationSample {
    #[must_use]
    pub fn new(lat: f64, lng: f64, timestamp_ms: u64) -> Self {
        Self {
            lat,
            lng,
            timestamp_ms,
        }
    }

    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// The de-jittered location published by the sampler: the coordinates of
/// the last accepted sample and when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StableLocation {
    pub lat: f64,
    pub lng: f64,
    pub accepted_at_ms: u64,
}

impl StableLocation {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

impl From<LocationSample> for StableLocation {
    fn from(sample: LocationSample) -> Self {
        Self {
            lat: sample.lat,
            lng: sample.lng,
            accepted_at_ms: sample.timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let p = GeoPoint {
            lat: 21.028_5,
            lng: 105.854_2,
        };
        assert!(haversine_meters(&p, &p).abs() < f64::EPSILON);
    }

    #[test]
    fn gps_jitter_is_about_a_metre() {
        let a = GeoPoint {
            lat: 21.028_5,
            lng: 105.854_2,
        };
        let b = GeoPoint {
            lat: 21.028_51,
            lng: 105.854_21,
        };
        let d = a.distance_to(&b);
        assert!(d > 1.0 && d < 2.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint { lat: 0.0, lng: 0.0 };
        let b = GeoPoint { lat: 1.0, lng: 0.0 };
        let d = haversine_meters(&a, &b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let hanoi = GeoPoint {
            lat: 21.028_5,
            lng: 105.854_2,
        };
        let hue = GeoPoint {
            lat: 16.463_7,
            lng: 107.590_9,
        };
        let there = haversine_meters(&hanoi, &hue);
        let back = haversine_meters(&hue, &hanoi);
        assert!((there - back).abs() < 1e-6);
        assert!(there > 500_000.0 && there < 600_000.0, "got {there}");
    }

    #[test]
    fn new_rejects_out_of_range_and_nan() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(13.782, 109.219).is_ok());
    }

    #[test]
    fn display_uses_six_decimals() {
        let p = GeoPoint {
            lat: 13.782,
            lng: 109.219,
        };
        assert_eq!(p.to_string(), "13.782000, 109.219000");
    }
}
