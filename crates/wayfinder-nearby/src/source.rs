//! The seam between the fetchers and the network.

use std::future::Future;

use wayfinder_core::{
    FetchRequestParams, GeoPoint, GeocodeQuery, GeocodeResult, Place, RouteData, RouteRequest,
    Weather,
};

use crate::client::BackendClient;
use crate::error::BackendError;

/// Anything that can answer the nearby-data and destination-search queries.
///
/// [`BackendClient`] is the production implementation; tests plug in
/// scripted sources to control timing and ordering of responses.
pub trait PlaceSource: Send + Sync + 'static {
    fn fetch_places(
        &self,
        params: &FetchRequestParams,
    ) -> impl Future<Output = Result<Vec<Place>, BackendError>> + Send;

    fn fetch_suggestions(
        &self,
        params: &FetchRequestParams,
    ) -> impl Future<Output = Result<Vec<Place>, BackendError>> + Send;

    fn fetch_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<RouteData, BackendError>> + Send;

    fn fetch_weather(
        &self,
        point: GeoPoint,
    ) -> impl Future<Output = Result<Weather, BackendError>> + Send;

    fn fetch_geocode(
        &self,
        query: &GeocodeQuery,
    ) -> impl Future<Output = Result<Vec<GeocodeResult>, BackendError>> + Send;
}

impl PlaceSource for BackendClient {
    async fn fetch_places(&self, params: &FetchRequestParams) -> Result<Vec<Place>, BackendError> {
        self.places_nearby(params).await
    }

    async fn fetch_suggestions(
        &self,
        params: &FetchRequestParams,
    ) -> Result<Vec<Place>, BackendError> {
        self.suggest_places(params).await
    }

    async fn fetch_route(&self, request: &RouteRequest) -> Result<RouteData, BackendError> {
        self.route(request).await
    }

    async fn fetch_weather(&self, point: GeoPoint) -> Result<Weather, BackendError> {
        self.weather(point).await
    }

    async fn fetch_geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, BackendError> {
        self.geocode(query).await
    }
}
