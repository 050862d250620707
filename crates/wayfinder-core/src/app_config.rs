#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub backend_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub min_distance_meters: f64,
    pub min_update_interval_ms: u64,
    pub debounce_ms: u64,
    pub high_rated_threshold: f64,
    pub good_rated_threshold: f64,
    pub default_category: String,
    pub default_radius_meters: u32,
    pub default_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("backend_url", &self.backend_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("min_distance_meters", &self.min_distance_meters)
            .field("min_update_interval_ms", &self.min_update_interval_ms)
            .field("debounce_ms", &self.debounce_ms)
            .field("high_rated_threshold", &self.high_rated_threshold)
            .field("good_rated_threshold", &self.good_rated_threshold)
            .field("default_category", &self.default_category)
            .field("default_radius_meters", &self.default_radius_meters)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}
