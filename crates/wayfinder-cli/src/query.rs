//! One-shot command handlers: a single backend call, printed as JSON.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tokio::io::BufReader;
use wayfinder_core::{
    AppConfig, FetchRequestParams, GeoPoint, GeocodeQuery, GeocodeResult, HotelSearch,
    RatingThresholds, RouteRequest, SmartSuggestions, TravelMode,
};
use wayfinder_locate::{current_position, ChannelProvider};
use wayfinder_nearby::{display_address, BackendClient};

use crate::input::feed;
use crate::{PointArgs, QueryArgs};

/// Parses `"lat,lng"` into a validated point.
pub(crate) fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{raw}\""))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude \"{lat}\": {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude \"{lng}\": {e}"))?;
    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

/// Fills unset query fields from configuration.
pub(crate) fn build_params(
    config: &AppConfig,
    center: GeoPoint,
    query: &QueryArgs,
) -> anyhow::Result<FetchRequestParams> {
    let params = FetchRequestParams::new(
        center,
        query
            .category
            .clone()
            .unwrap_or_else(|| config.default_category.clone()),
        query.radius.unwrap_or(config.default_radius_meters),
        query.limit.unwrap_or(config.default_limit),
    )?;
    Ok(params)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_nearby(
    client: &BackendClient,
    config: &AppConfig,
    at: PointArgs,
    query: &QueryArgs,
) -> anyhow::Result<()> {
    let params = build_params(config, at.point(), query)?;
    let places = client
        .places_nearby(&params)
        .await
        .context("nearby places request failed")?;
    tracing::info!(count = places.len(), category = %params.category, "nearby places loaded");
    print_json(&places)
}

pub(crate) async fn run_suggest(
    client: &BackendClient,
    config: &AppConfig,
    at: PointArgs,
    query: &QueryArgs,
) -> anyhow::Result<()> {
    let params = build_params(config, at.point(), query)?;
    let thresholds = RatingThresholds::new(config.high_rated_threshold, config.good_rated_threshold)?;
    let found = client
        .suggest_places(&params)
        .await
        .context("smart suggestions request failed")?;
    let suggestions = SmartSuggestions::partition(found, &params, thresholds, Utc::now());
    tracing::info!(
        total = suggestions.total_found,
        high_rated = suggestions.high_rated.len(),
        good_rated = suggestions.good_rated.len(),
        "suggestions loaded"
    );
    print_json(&suggestions)
}

pub(crate) async fn run_route(
    client: &BackendClient,
    waypoints: Vec<GeoPoint>,
    mode: TravelMode,
) -> anyhow::Result<()> {
    let request = RouteRequest::new(waypoints, mode)?;
    let route = client
        .route(&request)
        .await
        .context("route request failed")?;
    if let (Some(km), Some(minutes)) = (route.distance_km(), route.duration_minutes()) {
        tracing::info!(km, minutes, mode = %mode, "route loaded");
    }
    print_json(&route)
}

pub(crate) async fn run_hotels(
    client: &BackendClient,
    at: PointArgs,
    min_rating: f64,
    radius: u32,
    limit: u32,
) -> anyhow::Result<()> {
    let search = HotelSearch::new(at.point(), min_rating, radius, limit)?;
    let hotels = client
        .hotels_nearby(&search)
        .await
        .context("hotels request failed")?;
    tracing::info!(count = hotels.len(), min_rating, "hotels loaded");
    print_json(&hotels)
}

pub(crate) async fn run_geocode(
    client: &BackendClient,
    text: &str,
    limit: u32,
) -> anyhow::Result<()> {
    if !GeocodeQuery::is_searchable(text) {
        tracing::info!("search text too short, nothing to look up");
        return print_json(&Vec::<GeocodeResult>::new());
    }
    let query = GeocodeQuery::new(text, limit)?;
    let results = client
        .geocode(&query)
        .await
        .context("destination search failed")?;
    print_json(&results)
}

pub(crate) async fn run_weather(client: &BackendClient, at: PointArgs) -> anyhow::Result<()> {
    let weather = client
        .weather(at.point())
        .await
        .context("weather request failed")?;
    print_json(&weather)
}

#[derive(Debug, Serialize)]
struct ResolvedPoint {
    lat: f64,
    lng: f64,
    address: String,
}

/// Looks up an address; a failed lookup falls back to the coordinates.
async fn resolve(client: &BackendClient, point: GeoPoint) -> ResolvedPoint {
    let resolved = match client.reverse_geocode(point).await {
        Ok(address) => address,
        Err(err) => {
            tracing::warn!(error = %err, "reverse geocoding failed, showing coordinates");
            None
        }
    };
    ResolvedPoint {
        lat: point.lat,
        lng: point.lng,
        address: display_address(point, resolved),
    }
}

pub(crate) async fn run_reverse(client: &BackendClient, at: PointArgs) -> anyhow::Result<()> {
    let point = GeoPoint::new(at.lat, at.lng)?;
    print_json(&resolve(client, point).await)
}

pub(crate) async fn run_whereami(client: &BackendClient, timeout_secs: u64) -> anyhow::Result<()> {
    let (mut provider, handle) = ChannelProvider::new(8);
    let feeder = tokio::spawn(feed(BufReader::new(tokio::io::stdin()), handle, None));

    let outcome = current_position(&mut provider, Duration::from_secs(timeout_secs)).await;
    feeder.abort();
    let sample = outcome.map_err(|err| anyhow::anyhow!("{err}: {}", err.user_message()))?;

    print_json(&resolve(client, sample.point()).await)
}
