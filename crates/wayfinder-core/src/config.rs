use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_non_negative_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(var, format!("expected a finite non-negative number, got {value}")));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("WAYFINDER_ENV", "development"))?;
    let log_level = or_default("WAYFINDER_LOG_LEVEL", "info");

    let backend_url = or_default("WAYFINDER_BACKEND_URL", "http://localhost:8000");
    if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
        return Err(invalid(
            "WAYFINDER_BACKEND_URL",
            format!("expected an http(s) URL, got '{backend_url}'"),
        ));
    }
    let auth_token = lookup("WAYFINDER_AUTH_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let request_timeout_secs = parse_u64("WAYFINDER_REQUEST_TIMEOUT_SECS", "12")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "WAYFINDER_REQUEST_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }
    let user_agent = or_default("WAYFINDER_USER_AGENT", "wayfinder/0.1 (nearby-places)");
    let max_retries = parse_u32("WAYFINDER_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("WAYFINDER_RETRY_BACKOFF_BASE_MS", "500")?;

    let min_distance_meters = parse_non_negative_f64("WAYFINDER_MIN_DISTANCE_METERS", "10")?;
    let min_update_interval_ms = parse_u64("WAYFINDER_MIN_UPDATE_INTERVAL_MS", "2000")?;
    let debounce_ms = parse_u64("WAYFINDER_DEBOUNCE_MS", "300")?;

    let high_rated_threshold = parse_non_negative_f64("WAYFINDER_HIGH_RATED_THRESHOLD", "4.5")?;
    let good_rated_threshold = parse_non_negative_f64("WAYFINDER_GOOD_RATED_THRESHOLD", "4.0")?;
    if good_rated_threshold > high_rated_threshold {
        return Err(invalid(
            "WAYFINDER_GOOD_RATED_THRESHOLD",
            format!(
                "good threshold {good_rated_threshold} exceeds high threshold {high_rated_threshold}"
            ),
        ));
    }

    let default_category = or_default("WAYFINDER_DEFAULT_CATEGORY", "catering.restaurant");
    if default_category.trim().is_empty() {
        return Err(invalid(
            "WAYFINDER_DEFAULT_CATEGORY",
            "category must not be empty".to_string(),
        ));
    }
    let default_radius_meters = parse_u32("WAYFINDER_DEFAULT_RADIUS_METERS", "5000")?;
    if default_radius_meters == 0 {
        return Err(invalid(
            "WAYFINDER_DEFAULT_RADIUS_METERS",
            "radius must be at least 1 m".to_string(),
        ));
    }
    let default_limit = parse_u32("WAYFINDER_DEFAULT_LIMIT", "20")?;
    if default_limit == 0 {
        return Err(invalid(
            "WAYFINDER_DEFAULT_LIMIT",
            "limit must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        backend_url,
        auth_token,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        min_distance_meters,
        min_update_interval_ms,
        debounce_ms,
        high_rated_threshold,
        good_rated_threshold,
        default_category,
        default_radius_meters,
        default_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WAYFINDER_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
