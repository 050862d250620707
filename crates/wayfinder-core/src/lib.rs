pub mod app_config;
pub mod config;
pub mod error;
pub mod geo;
pub mod places;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use geo::{haversine_meters, GeoPoint, LocationSample, StableLocation, EARTH_RADIUS_METERS};
pub use places::{
    FetchRequestParams, GeocodeQuery, GeocodeResult, HotelSearch, Place, RatingThresholds,
    RouteData, RouteInstruction, RouteRequest, SmartSuggestions, TravelMode, Weather,
    DEFAULT_GEOCODE_LIMIT, MIN_GEOCODE_QUERY_CHARS,
};
