use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coded failures reported by the platform geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    /// The user refused location access. Terminal until permission changes.
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("positioning timed out")]
    Timeout,

    /// The platform has no geolocation capability at all.
    #[error("geolocation is not supported")]
    Unsupported,
}

impl PositionError {
    /// Maps the platform's numeric error codes (1 denied, 2 unavailable,
    /// 3 timeout). Unknown codes are reported as unavailable.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => PositionError::PermissionDenied,
            3 => PositionError::Timeout,
            _ => PositionError::PositionUnavailable,
        }
    }

    /// `true` when an explicit retry may succeed without user action.
    #[must_use]
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            PositionError::PositionUnavailable | PositionError::Timeout
        )
    }

    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            PositionError::PermissionDenied => {
                "Location access was denied. Enable location permission to see nearby places."
            }
            PositionError::PositionUnavailable => {
                "Your position could not be determined. Check Wi-Fi or GPS and try again."
            }
            PositionError::Timeout => "Locating took too long. Please try again.",
            PositionError::Unsupported => "This device does not support location services.",
        }
    }
}
