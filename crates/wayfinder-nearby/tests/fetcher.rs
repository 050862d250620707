//! End-to-end tests for `NearbyDataFetcher` against a wiremock backend.

use std::sync::Arc;
use std::time::Duration;

use wayfinder_core::{FetchRequestParams, GeoPoint, TravelMode};
use wayfinder_nearby::{
    BackendClient, FetchState, FetchStatus, FetcherConfig, NearbyDataFetcher, PLACES_LABEL,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer, debounce_ms: u64) -> NearbyDataFetcher {
    let client = BackendClient::with_base_url(&server.uri(), 5, "wayfinder-test")
        .expect("client construction should not fail");
    NearbyDataFetcher::new(
        Arc::new(client),
        FetcherConfig {
            debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(2),
            ..FetcherConfig::default()
        },
    )
}

fn params_at(lat: f64) -> FetchRequestParams {
    FetchRequestParams::new(
        GeoPoint { lat, lng: 105.85 },
        "catering.restaurant",
        5000,
        10,
    )
    .unwrap()
}

fn one_place(name: &str) -> serde_json::Value {
    serde_json::json!([{ "name": name, "lat": 21.03, "lng": 105.85 }])
}

async fn wait_until<T: Clone>(
    rx: &mut tokio::sync::watch::Receiver<FetchState<T>>,
    done: impl Fn(&FetchState<T>) -> bool,
) -> FetchState<T> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if done(&*state) {
                    return (*state).clone();
                }
            }
            rx.changed().await.expect("fetcher dropped");
        }
    })
    .await
    .expect("state never reached")
}

#[tokio::test]
async fn burst_of_requests_hits_backend_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/maps/nearby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_place("Last")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, 150);
    let mut rx = fetcher.subscribe_places();
    for i in 0..5 {
        fetcher.request(params_at(21.0 + f64::from(i) * 0.01));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let state = wait_until(&mut rx, |s| s.status == FetchStatus::Success).await;
    assert_eq!(state.data.unwrap()[0].name, "Last");
    assert_eq!(fetcher.fired_count(), 1);
}

#[tokio::test]
async fn slow_stale_response_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/maps/nearby"))
        .and(query_param("lat", "21.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(one_place("Stale"))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/maps/nearby"))
        .and(query_param("lat", "21.2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(one_place("Fresh"))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, 0);
    let mut rx = fetcher.subscribe_places();

    fetcher.request(params_at(21.1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    fetcher.request(params_at(21.2));

    let state = wait_until(&mut rx, |s| s.status == FetchStatus::Success).await;
    assert_eq!(state.data.unwrap()[0].name, "Fresh");

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(fetcher.places().data.unwrap()[0].name, "Fresh");
}

#[tokio::test]
async fn backend_failure_keeps_previous_places() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/maps/nearby"))
        .and(query_param("lat", "21.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_place("Good")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/maps/nearby"))
        .and(query_param("lat", "21.2"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "detail": "db down" })),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, 0);
    let mut rx = fetcher.subscribe_places();

    fetcher.request(params_at(21.1));
    wait_until(&mut rx, |s| s.status == FetchStatus::Success).await;

    fetcher.request(params_at(21.2));
    let state = wait_until(&mut rx, |s| s.status == FetchStatus::Error).await;
    assert_eq!(state.data.unwrap()[0].name, "Good");
    let error = state.error.unwrap();
    assert!(error.starts_with(PLACES_LABEL), "{error}");
    assert!(error.contains("db down"), "{error}");
}

#[tokio::test]
async fn route_is_fetched_then_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/maps/route"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "waypoints": [{ "lat": 21.0, "lng": 105.8 }, { "lat": 21.1, "lng": 105.9 }],
            "distance": 15400.0,
            "time": 1290.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, 0);
    let mut rx = fetcher.subscribe_route();
    let a = GeoPoint {
        lat: 21.0,
        lng: 105.8,
    };
    let b = GeoPoint {
        lat: 21.1,
        lng: 105.9,
    };

    fetcher.select_places(&[a, b], TravelMode::Drive);
    let state = wait_until(&mut rx, |s| s.status == FetchStatus::Success).await;
    assert!((state.data.unwrap().distance_km().unwrap() - 15.4).abs() < 1e-9);

    fetcher.select_places(&[a], TravelMode::Drive);
    let cleared = fetcher.route();
    assert_eq!(cleared.status, FetchStatus::Idle);
    assert!(cleared.data.is_none());
}

#[tokio::test]
async fn destination_typing_sends_one_geocode_for_final_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/maps/geocode"))
        .and(query_param("q", "Sapa"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{ "name": "Sa Pa", "country": "Vietnam", "lat": 22.3364, "lng": 103.8438 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, 150);
    let mut rx = fetcher.subscribe_destinations();
    for text in ["S", "Sa", "Sap", "Sapa"] {
        fetcher.search_destinations(text);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let state = wait_until(&mut rx, |s| s.status == FetchStatus::Success).await;
    assert_eq!(state.data.unwrap()[0].name, "Sa Pa");
    assert_eq!(fetcher.fired_count(), 1);

    fetcher.search_destinations("");
    let cleared = wait_until(&mut rx, |s| s.status == FetchStatus::Idle).await;
    assert!(cleared.data.is_none());
}
