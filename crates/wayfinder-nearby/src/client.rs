//! HTTP client for the maps/weather backend.
//!
//! Wraps `reqwest` with base-URL handling, optional bearer auth, opt-in
//! transient retries and payload normalization. Non-2xx responses become
//! [`BackendError::UnexpectedStatus`] carrying the body's `error`/`detail`.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use wayfinder_core::{
    AppConfig, FetchRequestParams, GeoPoint, GeocodeQuery, GeocodeResult, HotelSearch, Place,
    RouteData, RouteRequest, Weather,
};

use crate::error::BackendError;
use crate::normalize::{
    address_from_payload, error_detail, geocode_results_from_payload, places_from_payload,
    route_from_payload, weather_from_payload,
};
use crate::retry::retry_with_backoff;

const NEARBY_PATH: &str = "api/maps/nearby";
const SUGGEST_PATH: &str = "api/maps/ai/suggest_places";
const ROUTE_PATH: &str = "api/maps/route";
const WEATHER_PATH: &str = "api/weather";
const REVERSE_PATH: &str = "api/maps/reverse";
const GEOCODE_PATH: &str = "api/maps/geocode";
const HOTELS_PATH: &str = "api/maps/hotels";

const DEFAULT_USER_AGENT: &str = "wayfinder/0.1 (nearby-places)";

/// Client for the places, route, weather and geocoding endpoints.
///
/// Use [`BackendClient::new`] with a loaded [`AppConfig`], or
/// [`BackendClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`BackendError::InvalidBaseUrl`] for an unusable backend URL.
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let client = Self::with_base_url(
            &config.backend_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retries(config.max_retries, config.retry_backoff_base_ms);
        Ok(match &config.auth_token {
            Some(token) => client.with_auth_token(token),
            None => client,
        })
    }

    /// Creates a client with a custom base URL and no auth or retries.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`BackendError::InvalidBaseUrl`] if `base_url` does not
    /// parse or is not http(s).
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, BackendError> {
        let user_agent = if user_agent.trim().is_empty() {
            DEFAULT_USER_AGENT
        } else {
            user_agent
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so joining "api/..." appends to any
        // path prefix instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| BackendError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            auth_token: None,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    /// Enables retries of transient failures (connect, timeout, 429, 5xx).
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Places of `params.category` around `params.center`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::InvalidRequest`] if `params` fail validation.
    /// - [`BackendError::Http`] / [`BackendError::UnexpectedStatus`] on
    ///   transport failure or a non-2xx status.
    /// - [`BackendError::Deserialize`] / [`BackendError::Malformed`] if the
    ///   body is not a recognisable place list.
    pub async fn places_nearby(
        &self,
        params: &FetchRequestParams,
    ) -> Result<Vec<Place>, BackendError> {
        params.validate()?;
        let url = self.endpoint_url(NEARBY_PATH, &Self::query_for(params, "categories"))?;
        let body = self.get_json(&url).await?;
        places_from_payload(&body, "places-nearby")
    }

    /// AI-ranked place suggestions around `params.center`.
    ///
    /// Returns the flat list; rating buckets are computed by the caller.
    ///
    /// # Errors
    ///
    /// Same as [`BackendClient::places_nearby`].
    pub async fn suggest_places(
        &self,
        params: &FetchRequestParams,
    ) -> Result<Vec<Place>, BackendError> {
        params.validate()?;
        let url = self.endpoint_url(SUGGEST_PATH, &Self::query_for(params, "category"))?;
        let body = self.get_json(&url).await?;
        places_from_payload(&body, "smart-suggestions")
    }

    /// Route through the ordered waypoints of `request`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Http`] / [`BackendError::UnexpectedStatus`] on
    ///   transport failure or a non-2xx status.
    /// - [`BackendError::Deserialize`] if the body does not match [`RouteData`].
    pub async fn route(&self, request: &RouteRequest) -> Result<RouteData, BackendError> {
        let url = self.endpoint_url(ROUTE_PATH, &[])?;
        let body = self.post_json(&url, request).await?;
        route_from_payload(body, "route")
    }

    /// Current weather at `point`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::InvalidRequest`] for an invalid point.
    /// - [`BackendError::Http`] / [`BackendError::UnexpectedStatus`] on
    ///   transport failure or a non-2xx status.
    /// - [`BackendError::Deserialize`] if the body does not match [`Weather`].
    pub async fn weather(&self, point: GeoPoint) -> Result<Weather, BackendError> {
        let point = GeoPoint::new(point.lat, point.lng)?;
        let url = self.endpoint_url(WEATHER_PATH, &Self::point_query(point))?;
        let body = self.get_json(&url).await?;
        weather_from_payload(body, "weather")
    }

    /// Human-readable address for `point`, or `None` when the backend has
    /// nothing usable.
    ///
    /// # Errors
    ///
    /// - [`BackendError::InvalidRequest`] for an invalid point.
    /// - [`BackendError::Http`] / [`BackendError::UnexpectedStatus`] on
    ///   transport failure or a non-2xx status.
    pub async fn reverse_geocode(&self, point: GeoPoint) -> Result<Option<String>, BackendError> {
        let point = GeoPoint::new(point.lat, point.lng)?;
        let url = self.endpoint_url(REVERSE_PATH, &Self::point_query(point))?;
        let body = self.get_json(&url).await?;
        Ok(address_from_payload(&body))
    }

    /// Destination candidates matching free-text `query`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::InvalidRequest`] if `query` is too short or has a
    ///   zero limit.
    /// - [`BackendError::Http`] / [`BackendError::UnexpectedStatus`] on
    ///   transport failure or a non-2xx status.
    /// - [`BackendError::Malformed`] if the body has no result list.
    pub async fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, BackendError> {
        query.validate()?;
        let url = self.endpoint_url(
            GEOCODE_PATH,
            &[("q", query.text.clone()), ("limit", query.limit.to_string())],
        )?;
        let body = self.get_json(&url).await?;
        geocode_results_from_payload(&body, "geocode")
    }

    /// Hotels rated at least `search.min_rating` around `search.center`.
    ///
    /// # Errors
    ///
    /// Same as [`BackendClient::places_nearby`].
    pub async fn hotels_nearby(&self, search: &HotelSearch) -> Result<Vec<Place>, BackendError> {
        search.validate()?;
        let mut query = Self::point_query(search.center);
        query.extend([
            ("min_rating", search.min_rating.to_string()),
            ("radius", search.radius_m.to_string()),
            ("limit", search.limit.to_string()),
        ]);
        let url = self.endpoint_url(HOTELS_PATH, &query)?;
        let body = self.get_json(&url).await?;
        places_from_payload(&body, "hotels")
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn query_for(
        params: &FetchRequestParams,
        category_key: &'static str,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("lat", params.center.lat.to_string()),
            ("lng", params.center.lng.to_string()),
            (category_key, params.category.clone()),
            ("radius", params.radius_m.to_string()),
            ("limit", params.limit.to_string()),
        ]
    }

    fn point_query(point: GeoPoint) -> Vec<(&'static str, String)> {
        vec![("lat", point.lat.to_string()), ("lng", point.lng.to_string())]
    }

    async fn get_json(&self, url: &Url) -> Result<Value, BackendError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.get(url.clone()), url)
        })
        .await
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<Value, BackendError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.post(url.clone()).json(body), url)
        })
        .await
    }

    /// Sends the request, maps non-2xx to [`BackendError::UnexpectedStatus`]
    /// and parses the body as JSON.
    async fn send_json(&self, request: RequestBuilder, url: &Url) -> Result<Value, BackendError> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.path().to_owned(),
                detail: error_detail(&body),
            });
        }
        tracing::debug!(path = url.path(), status = status.as_u16(), "backend response");
        serde_json::from_str(&body).map_err(|e| BackendError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
