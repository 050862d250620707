use thiserror::Error;

/// Errors raised while loading [`crate::AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Validation failures for domain values built by callers.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("search radius must be at least 1 m")]
    InvalidRadius,

    #[error("result limit must be at least 1")]
    InvalidLimit,

    #[error("category must not be empty")]
    EmptyCategory,

    #[error("rating thresholds out of order: good {good} > high {high}")]
    InvalidThresholds { good: f64, high: f64 },

    #[error("a route needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("unknown travel mode: {0}")]
    UnknownTravelMode(String),

    #[error("search text must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error("minimum rating must be within 0..=5, got {0}")]
    InvalidMinRating(f64),
}
