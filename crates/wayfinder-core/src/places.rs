//! Place, suggestion, route and weather types exchanged with the backend.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::GeoPoint;

/// A point of interest returned by the places backend, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Backend id, or `"{lat}_{lng}"` when the record carried none.
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: u32,
    pub location: GeoPoint,
    pub categories: Vec<String>,
    /// Upstream provider that produced the record (e.g. `"geoapify"`).
    pub source: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Parameters of one nearby-places or smart-suggestions query.
///
/// Treated as a value: changing any field means building a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequestParams {
    pub center: GeoPoint,
    pub category: String,
    pub radius_m: u32,
    pub limit: u32,
}

impl FetchRequestParams {
    /// # Errors
    ///
    /// Returns a [`CoreError`] if any field fails [`FetchRequestParams::validate`].
    pub fn new(
        center: GeoPoint,
        category: impl Into<String>,
        radius_m: u32,
        limit: u32,
    ) -> Result<Self, CoreError> {
        let params = Self {
            center,
            category: category.into(),
            radius_m,
            limit,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks coordinates, radius, limit and category.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidCoordinates`] for an out-of-range centre.
    /// - [`CoreError::InvalidRadius`] for a zero radius.
    /// - [`CoreError::InvalidLimit`] for a zero limit.
    /// - [`CoreError::EmptyCategory`] for a blank category.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.center.is_valid() {
            return Err(CoreError::InvalidCoordinates {
                lat: self.center.lat,
                lng: self.center.lng,
            });
        }
        if self.radius_m == 0 {
            return Err(CoreError::InvalidRadius);
        }
        if self.limit == 0 {
            return Err(CoreError::InvalidLimit);
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::EmptyCategory);
        }
        Ok(())
    }

    /// Same query re-centred on `center`.
    #[must_use]
    pub fn with_center(&self, center: GeoPoint) -> Self {
        Self {
            center,
            ..self.clone()
        }
    }
}

/// Rating cut-offs used to bucket smart suggestions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingThresholds {
    pub high: f64,
    pub good: f64,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            high: 4.5,
            good: 4.0,
        }
    }
}

impl RatingThresholds {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidThresholds`] if either value is not
    /// finite or `good > high`.
    pub fn new(high: f64, good: f64) -> Result<Self, CoreError> {
        if !high.is_finite() || !good.is_finite() || good > high {
            return Err(CoreError::InvalidThresholds { good, high });
        }
        Ok(Self { high, good })
    }

    #[must_use]
    pub fn is_high(&self, rating: Option<f64>) -> bool {
        rating.is_some_and(|r| r >= self.high)
    }

    #[must_use]
    pub fn is_good(&self, rating: Option<f64>) -> bool {
        rating.is_some_and(|r| r >= self.good && r < self.high)
    }
}

/// Suggestions from a single backend response, split into rating buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartSuggestions {
    pub suggestions: Vec<Place>,
    pub high_rated: Vec<Place>,
    pub good_rated: Vec<Place>,
    pub total_found: usize,
    pub category: String,
    pub center: GeoPoint,
    pub radius_m: u32,
    pub fetched_at: DateTime<Utc>,
}

impl SmartSuggestions {
    /// Buckets `places` by rating. Pure post-processing; no I/O.
    #[must_use]
    pub fn partition(
        places: Vec<Place>,
        params: &FetchRequestParams,
        thresholds: RatingThresholds,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let high_rated = places
            .iter()
            .filter(|p| thresholds.is_high(p.rating))
            .cloned()
            .collect();
        let good_rated = places
            .iter()
            .filter(|p| thresholds.is_good(p.rating))
            .cloned()
            .collect();
        Self {
            total_found: places.len(),
            suggestions: places,
            high_rated,
            good_rated,
            category: params.category.clone(),
            center: params.center,
            radius_m: params.radius_m,
            fetched_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
}

impl TravelMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Drive => "drive",
            TravelMode::Walk => "walk",
            TravelMode::Bicycle => "bicycle",
            TravelMode::Transit => "transit",
        }
    }
}

impl FromStr for TravelMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drive" => Ok(TravelMode::Drive),
            "walk" => Ok(TravelMode::Walk),
            "bicycle" => Ok(TravelMode::Bicycle),
            "transit" => Ok(TravelMode::Transit),
            other => Err(CoreError::UnknownTravelMode(other.to_owned())),
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a route request: ordered waypoints plus travel mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub waypoints: Vec<GeoPoint>,
    pub mode: TravelMode,
}

impl RouteRequest {
    /// # Errors
    ///
    /// - [`CoreError::TooFewWaypoints`] with fewer than two waypoints.
    /// - [`CoreError::InvalidCoordinates`] for the first invalid waypoint.
    pub fn new(waypoints: Vec<GeoPoint>, mode: TravelMode) -> Result<Self, CoreError> {
        if waypoints.len() < 2 {
            return Err(CoreError::TooFewWaypoints(waypoints.len()));
        }
        if let Some(bad) = waypoints.iter().find(|p| !p.is_valid()) {
            return Err(CoreError::InvalidCoordinates {
                lat: bad.lat,
                lng: bad.lng,
            });
        }
        Ok(Self { waypoints, mode })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInstruction {
    pub instruction: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub time: f64,
}

/// Route overlay: polyline coordinates plus aggregate distance (m) and time (s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteData {
    #[serde(default)]
    pub waypoints: Vec<GeoPoint>,
    pub distance: Option<f64>,
    pub time: Option<f64>,
    #[serde(default)]
    pub instructions: Vec<RouteInstruction>,
}

impl RouteData {
    #[must_use]
    pub fn distance_km(&self) -> Option<f64> {
        self.distance.map(|m| m / 1000.0)
    }

    #[must_use]
    pub fn duration_minutes(&self) -> Option<f64> {
        self.time.map(|s| (s / 60.0).round())
    }
}

/// Current conditions at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: f64,
    pub description: String,
    pub icon: Option<String>,
    pub humidity: Option<f64>,
    #[serde(rename = "windSpeed")]
    pub wind_speed: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Shortest destination search text worth sending to the backend.
pub const MIN_GEOCODE_QUERY_CHARS: usize = 2;

/// Number of destination candidates requested per search.
pub const DEFAULT_GEOCODE_LIMIT: u32 = 5;

/// Free-text destination search (forward geocoding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    /// Trimmed search text.
    pub text: String,
    pub limit: u32,
}

impl GeocodeQuery {
    /// # Errors
    ///
    /// - [`CoreError::QueryTooShort`] if the trimmed text has fewer than
    ///   [`MIN_GEOCODE_QUERY_CHARS`] characters.
    /// - [`CoreError::InvalidLimit`] for a zero limit.
    pub fn new(text: &str, limit: u32) -> Result<Self, CoreError> {
        let query = Self {
            text: text.trim().to_owned(),
            limit,
        };
        query.validate()?;
        Ok(query)
    }

    /// Whether `text` is long enough to search for.
    #[must_use]
    pub fn is_searchable(text: &str) -> bool {
        text.trim().chars().count() >= MIN_GEOCODE_QUERY_CHARS
    }

    /// # Errors
    ///
    /// Same as [`GeocodeQuery::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if !Self::is_searchable(&self.text) {
            return Err(CoreError::QueryTooShort {
                min: MIN_GEOCODE_QUERY_CHARS,
            });
        }
        if self.limit == 0 {
            return Err(CoreError::InvalidLimit);
        }
        Ok(())
    }
}

/// One destination candidate from a forward-geocoding search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub country: Option<String>,
}

impl GeocodeResult {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Hotels around a point with a minimum rating.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelSearch {
    pub center: GeoPoint,
    pub min_rating: f64,
    pub radius_m: u32,
    pub limit: u32,
}

impl HotelSearch {
    pub const DEFAULT_MIN_RATING: f64 = 4.0;
    pub const DEFAULT_RADIUS_M: u32 = 10_000;
    pub const DEFAULT_LIMIT: u32 = 20;

    /// # Errors
    ///
    /// Returns a [`CoreError`] if any field fails [`HotelSearch::validate`].
    pub fn new(
        center: GeoPoint,
        min_rating: f64,
        radius_m: u32,
        limit: u32,
    ) -> Result<Self, CoreError> {
        let search = Self {
            center,
            min_rating,
            radius_m,
            limit,
        };
        search.validate()?;
        Ok(search)
    }

    /// # Errors
    ///
    /// - [`CoreError::InvalidCoordinates`] for an out-of-range centre.
    /// - [`CoreError::InvalidMinRating`] unless `0 <= min_rating <= 5`.
    /// - [`CoreError::InvalidRadius`] / [`CoreError::InvalidLimit`] for zero values.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.center.is_valid() {
            return Err(CoreError::InvalidCoordinates {
                lat: self.center.lat,
                lng: self.center.lng,
            });
        }
        if !(0.0..=5.0).contains(&self.min_rating) {
            return Err(CoreError::InvalidMinRating(self.min_rating));
        }
        if self.radius_m == 0 {
            return Err(CoreError::InvalidRadius);
        }
        if self.limit == 0 {
            return Err(CoreError::InvalidLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, rating: Option<f64>) -> Place {
        Place {
            id: id.to_owned(),
            name: format!("Place {id}"),
            address: None,
            rating,
            reviews_count: 0,
            location: GeoPoint {
                lat: 21.03,
                lng: 105.85,
            },
            categories: Vec::new(),
            source: None,
            phone: None,
            website: None,
        }
    }

    fn params() -> FetchRequestParams {
        FetchRequestParams::new(
            GeoPoint {
                lat: 21.03,
                lng: 105.85,
            },
            "catering.restaurant",
            5000,
            10,
        )
        .unwrap()
    }

    #[test]
    fn partition_buckets_by_rating() {
        let places = vec![
            place("a", Some(4.8)),
            place("b", Some(4.5)),
            place("c", Some(4.2)),
            place("d", Some(4.0)),
            place("e", Some(3.9)),
            place("f", None),
        ];
        let s = SmartSuggestions::partition(
            places,
            &params(),
            RatingThresholds::default(),
            Utc::now(),
        );
        let ids = |v: &[Place]| v.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&s.high_rated), vec!["a", "b"]);
        assert_eq!(ids(&s.good_rated), vec!["c", "d"]);
        assert_eq!(s.total_found, 6);
        assert_eq!(s.suggestions.len(), 6);
        assert_eq!(s.category, "catering.restaurant");
    }

    #[test]
    fn partition_respects_custom_thresholds() {
        let thresholds = RatingThresholds::new(4.0, 3.0).unwrap();
        let s = SmartSuggestions::partition(
            vec![place("a", Some(4.2)), place("b", Some(3.5))],
            &params(),
            thresholds,
            Utc::now(),
        );
        assert_eq!(s.high_rated.len(), 1);
        assert_eq!(s.good_rated.len(), 1);
    }

    #[test]
    fn thresholds_reject_inverted_order() {
        assert_eq!(
            RatingThresholds::new(4.0, 4.5),
            Err(CoreError::InvalidThresholds {
                good: 4.5,
                high: 4.0
            })
        );
    }

    #[test]
    fn params_validation() {
        let center = GeoPoint {
            lat: 21.03,
            lng: 105.85,
        };
        assert_eq!(
            FetchRequestParams::new(center, "cafe", 0, 10),
            Err(CoreError::InvalidRadius)
        );
        assert_eq!(
            FetchRequestParams::new(center, "cafe", 100, 0),
            Err(CoreError::InvalidLimit)
        );
        assert_eq!(
            FetchRequestParams::new(center, "  ", 100, 10),
            Err(CoreError::EmptyCategory)
        );
        let bad = GeoPoint {
            lat: 120.0,
            lng: 0.0,
        };
        assert!(matches!(
            FetchRequestParams::new(bad, "cafe", 100, 10),
            Err(CoreError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn with_center_keeps_other_fields() {
        let p = params();
        let moved = p.with_center(GeoPoint {
            lat: 16.46,
            lng: 107.59,
        });
        assert_eq!(moved.category, p.category);
        assert_eq!(moved.radius_m, p.radius_m);
        assert!((moved.center.lat - 16.46).abs() < f64::EPSILON);
    }

    #[test]
    fn travel_mode_parses_and_serializes() {
        assert_eq!("Walk".parse::<TravelMode>().unwrap(), TravelMode::Walk);
        assert!("teleport".parse::<TravelMode>().is_err());
        assert_eq!(
            serde_json::to_value(TravelMode::default()).unwrap(),
            serde_json::json!("drive")
        );
    }

    #[test]
    fn route_request_needs_two_valid_waypoints() {
        let a = GeoPoint {
            lat: 21.0,
            lng: 105.8,
        };
        assert_eq!(
            RouteRequest::new(vec![a], TravelMode::Drive),
            Err(CoreError::TooFewWaypoints(1))
        );
        let bad = GeoPoint {
            lat: f64::INFINITY,
            lng: 0.0,
        };
        assert!(RouteRequest::new(vec![a, bad], TravelMode::Drive).is_err());
        let ok = RouteRequest::new(vec![a, a], TravelMode::Walk).unwrap();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({
                "waypoints": [{"lat": 21.0, "lng": 105.8}, {"lat": 21.0, "lng": 105.8}],
                "mode": "walk"
            })
        );
    }

    #[test]
    fn route_data_deserializes_backend_shape() {
        let route: RouteData = serde_json::from_value(serde_json::json!({
            "waypoints": [{"lat": 21.0, "lng": 105.8}, {"lat": 21.1, "lng": 105.9}],
            "distance": 15_400.0,
            "time": 1_290.0
        }))
        .unwrap();
        assert_eq!(route.waypoints.len(), 2);
        assert!(route.instructions.is_empty());
        assert!((route.distance_km().unwrap() - 15.4).abs() < 1e-9);
        assert!((route.duration_minutes().unwrap() - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weather_reads_camel_case_wind_speed() {
        let w: Weather = serde_json::from_value(serde_json::json!({
            "temperature": 31.5,
            "description": "scattered clouds",
            "icon": "03d",
            "humidity": 70,
            "windSpeed": 3.1,
            "city": "Hanoi",
            "country": "VN"
        }))
        .unwrap();
        assert_eq!(w.wind_speed, Some(3.1));
        assert_eq!(w.city.as_deref(), Some("Hanoi"));
    }

    #[test]
    fn geocode_query_needs_two_characters() {
        assert!(!GeocodeQuery::is_searchable(" h "));
        assert!(GeocodeQuery::is_searchable("Hu"));
        assert!(GeocodeQuery::is_searchable("Đà"));
        assert_eq!(
            GeocodeQuery::new("a", DEFAULT_GEOCODE_LIMIT).unwrap_err(),
            CoreError::QueryTooShort { min: 2 }
        );
        assert_eq!(
            GeocodeQuery::new("Hue", 0).unwrap_err(),
            CoreError::InvalidLimit
        );

        let query = GeocodeQuery::new("  Da Nang ", DEFAULT_GEOCODE_LIMIT).unwrap();
        assert_eq!(query.text, "Da Nang");
        assert_eq!(query.limit, 5);
    }

    #[test]
    fn hotel_search_validation() {
        let center = GeoPoint {
            lat: 21.0285,
            lng: 105.8542,
        };
        let ok = HotelSearch::new(
            center,
            HotelSearch::DEFAULT_MIN_RATING,
            HotelSearch::DEFAULT_RADIUS_M,
            HotelSearch::DEFAULT_LIMIT,
        )
        .unwrap();
        assert_eq!(ok.radius_m, 10_000);

        assert_eq!(
            HotelSearch::new(center, 5.5, 1_000, 5).unwrap_err(),
            CoreError::InvalidMinRating(5.5)
        );
        assert!(matches!(
            HotelSearch::new(center, f64::NAN, 1_000, 5),
            Err(CoreError::InvalidMinRating(_))
        ));
        assert_eq!(
            HotelSearch::new(center, 4.0, 0, 5).unwrap_err(),
            CoreError::InvalidRadius
        );
    }
}
