//! The composite Nearby-Data Fetcher: places, suggestions, weather, route
//! and destination search.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use wayfinder_core::{
    AppConfig, FetchRequestParams, GeoPoint, GeocodeQuery, GeocodeResult, Place,
    RatingThresholds, RouteData, RouteRequest, SmartSuggestions, TravelMode, Weather,
    DEFAULT_GEOCODE_LIMIT,
};

use crate::error::BackendError;
use crate::fetcher::{DebounceConfig, DebouncedFetcher, FetchFn, FetchFuture};
use crate::source::PlaceSource;
use crate::state::FetchState;

pub const PLACES_LABEL: &str = "Could not load nearby places";
pub const SUGGESTIONS_LABEL: &str = "Could not load suggestions";
pub const WEATHER_LABEL: &str = "Could not load weather";
pub const ROUTE_LABEL: &str = "Could not load route";
pub const DESTINATIONS_LABEL: &str = "Could not search destinations";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetcherConfig {
    /// Quiet period for places, suggestions, weather and destination search.
    pub debounce: Duration,
    /// Quiet period for the route slot. Route requests follow explicit
    /// selection changes rather than bursts, so this defaults to zero.
    pub route_debounce: Duration,
    pub request_timeout: Duration,
    pub thresholds: RatingThresholds,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            route_debounce: Duration::ZERO,
            request_timeout: Duration::from_secs(12),
            thresholds: RatingThresholds::default(),
        }
    }
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            thresholds: RatingThresholds {
                high: config.high_rated_threshold,
                good: config.good_rated_threshold,
            },
            ..Self::default()
        }
    }

    fn slot(&self, debounce: Duration) -> DebounceConfig {
        DebounceConfig {
            debounce,
            timeout: self.request_timeout,
        }
    }
}

/// Independent fetch slots for everything shown around one location.
///
/// Each slot debounces, guards against stale responses and keeps its last
/// good data on failure. Dropping the fetcher (or calling
/// [`NearbyDataFetcher::shutdown`]) cancels every pending timer and
/// in-flight call.
pub struct NearbyDataFetcher {
    places: DebouncedFetcher<FetchRequestParams, Vec<Place>>,
    suggestions: DebouncedFetcher<FetchRequestParams, SmartSuggestions>,
    weather: DebouncedFetcher<GeoPoint, Weather>,
    route: DebouncedFetcher<RouteRequest, RouteData>,
    destinations: DebouncedFetcher<GeocodeQuery, Vec<GeocodeResult>>,
}

impl NearbyDataFetcher {
    pub fn new<S: PlaceSource>(source: Arc<S>, config: FetcherConfig) -> Self {
        let places: FetchFn<FetchRequestParams, Vec<Place>> = {
            let source = Arc::clone(&source);
            Arc::new(move |params: FetchRequestParams| -> FetchFuture<Vec<Place>> {
                let source = Arc::clone(&source);
                Box::pin(async move { source.fetch_places(&params).await })
            })
        };

        let thresholds = config.thresholds;
        let suggestions: FetchFn<FetchRequestParams, SmartSuggestions> = {
            let source = Arc::clone(&source);
            Arc::new(
                move |params: FetchRequestParams| -> FetchFuture<SmartSuggestions> {
                    let source = Arc::clone(&source);
                    Box::pin(async move {
                        let found = source.fetch_suggestions(&params).await?;
                        Ok(SmartSuggestions::partition(
                            found,
                            &params,
                            thresholds,
                            Utc::now(),
                        ))
                    })
                },
            )
        };

        let weather: FetchFn<GeoPoint, Weather> = {
            let source = Arc::clone(&source);
            Arc::new(move |point: GeoPoint| -> FetchFuture<Weather> {
                let source = Arc::clone(&source);
                Box::pin(async move { source.fetch_weather(point).await })
            })
        };

        let route: FetchFn<RouteRequest, RouteData> = {
            let source = Arc::clone(&source);
            Arc::new(move |request: RouteRequest| -> FetchFuture<RouteData> {
                let source = Arc::clone(&source);
                Box::pin(async move { source.fetch_route(&request).await })
            })
        };

        let destinations: FetchFn<GeocodeQuery, Vec<GeocodeResult>> =
            Arc::new(move |query: GeocodeQuery| -> FetchFuture<Vec<GeocodeResult>> {
                let source = Arc::clone(&source);
                Box::pin(async move { source.fetch_geocode(&query).await })
            });

        Self {
            places: DebouncedFetcher::new(PLACES_LABEL, config.slot(config.debounce), places),
            suggestions: DebouncedFetcher::new(
                SUGGESTIONS_LABEL,
                config.slot(config.debounce),
                suggestions,
            ),
            weather: DebouncedFetcher::new(WEATHER_LABEL, config.slot(config.debounce), weather),
            route: DebouncedFetcher::new(ROUTE_LABEL, config.slot(config.route_debounce), route),
            destinations: DebouncedFetcher::new(
                DESTINATIONS_LABEL,
                config.slot(config.debounce),
                destinations,
            ),
        }
    }

    /// Schedules a nearby-places fetch for `params`.
    pub fn request(&self, params: FetchRequestParams) {
        self.request_places(params);
    }

    /// Schedules a nearby-places fetch. Invalid parameters surface as an
    /// error state once the debounce fires, like any other failure.
    pub fn request_places(&self, params: FetchRequestParams) {
        self.places.request(params);
    }

    pub fn request_suggestions(&self, params: FetchRequestParams) {
        self.suggestions.request(params);
    }

    pub fn request_weather(&self, point: GeoPoint) {
        self.weather.request(point);
    }

    /// Updates the route overlay for the current selection.
    ///
    /// With fewer than two points no request is made and the previous route
    /// is cleared. Invalid coordinates surface as a route error.
    pub fn select_places(&self, selection: &[GeoPoint], mode: TravelMode) {
        if selection.len() < 2 {
            tracing::debug!(selected = selection.len(), "route cleared");
            self.route.clear();
            return;
        }
        match RouteRequest::new(selection.to_vec(), mode) {
            Ok(request) => self.route.request(request),
            Err(err) => {
                let err = BackendError::from(err);
                tracing::warn!(error = %err, "route selection rejected");
                self.route.fail_now(err);
            }
        }
    }

    /// Destination autocomplete for the text typed so far.
    ///
    /// Text shorter than two characters (after trimming) clears the results
    /// without a request; anything longer is debounced like the other slots.
    pub fn search_destinations(&self, text: &str) {
        if !GeocodeQuery::is_searchable(text) {
            tracing::debug!("destination search cleared");
            self.destinations.clear();
            return;
        }
        match GeocodeQuery::new(text, DEFAULT_GEOCODE_LIMIT) {
            Ok(query) => self.destinations.request(query),
            Err(err) => self.destinations.fail_now(BackendError::from(err)),
        }
    }

    #[must_use]
    pub fn places(&self) -> FetchState<Vec<Place>> {
        self.places.state()
    }

    #[must_use]
    pub fn suggestions(&self) -> FetchState<SmartSuggestions> {
        self.suggestions.state()
    }

    #[must_use]
    pub fn weather(&self) -> FetchState<Weather> {
        self.weather.state()
    }

    #[must_use]
    pub fn route(&self) -> FetchState<RouteData> {
        self.route.state()
    }

    #[must_use]
    pub fn destinations(&self) -> FetchState<Vec<GeocodeResult>> {
        self.destinations.state()
    }

    #[must_use]
    pub fn subscribe_places(&self) -> watch::Receiver<FetchState<Vec<Place>>> {
        self.places.subscribe()
    }

    #[must_use]
    pub fn subscribe_suggestions(&self) -> watch::Receiver<FetchState<SmartSuggestions>> {
        self.suggestions.subscribe()
    }

    #[must_use]
    pub fn subscribe_weather(&self) -> watch::Receiver<FetchState<Weather>> {
        self.weather.subscribe()
    }

    #[must_use]
    pub fn subscribe_route(&self) -> watch::Receiver<FetchState<RouteData>> {
        self.route.subscribe()
    }

    #[must_use]
    pub fn subscribe_destinations(&self) -> watch::Receiver<FetchState<Vec<GeocodeResult>>> {
        self.destinations.subscribe()
    }

    /// Calls that got past their debounce, across all slots.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.places.fired_count()
            + self.suggestions.fired_count()
            + self.weather.fired_count()
            + self.route.fired_count()
            + self.destinations.fired_count()
    }

    /// Cancels every pending timer and in-flight call; later requests are ignored.
    pub fn shutdown(&self) {
        self.places.shutdown();
        self.suggestions.shutdown();
        self.weather.shutdown();
        self.route.shutdown();
        self.destinations.shutdown();
    }
}
