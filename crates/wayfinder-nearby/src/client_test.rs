use super::*;

fn test_client(base_url: &str) -> BackendClient {
    BackendClient::with_base_url(base_url, 12, "wayfinder-test")
        .expect("client construction should not fail")
}

fn params() -> FetchRequestParams {
    FetchRequestParams::new(
        GeoPoint {
            lat: 21.0285,
            lng: 105.8542,
        },
        "catering.restaurant",
        5000,
        10,
    )
    .unwrap()
}

#[test]
fn endpoint_url_joins_path_and_query() {
    let client = test_client("http://localhost:8000");
    let url = client
        .endpoint_url(NEARBY_PATH, &BackendClient::query_for(&params(), "categories"))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://localhost:8000/api/maps/nearby?lat=21.0285&lng=105.8542&categories=catering.restaurant&radius=5000&limit=10"
    );
}

#[test]
fn endpoint_url_keeps_base_path_prefix() {
    let client = test_client("https://maps.example.com/backend/");
    let url = client.endpoint_url(WEATHER_PATH, &[]).unwrap();
    assert_eq!(url.as_str(), "https://maps.example.com/backend/api/weather");
}

#[test]
fn suggestions_use_singular_category_key() {
    let client = test_client("http://localhost:8000");
    let url = client
        .endpoint_url(SUGGEST_PATH, &BackendClient::query_for(&params(), "category"))
        .unwrap();
    assert!(url.as_str().contains("/api/maps/ai/suggest_places?"));
    assert!(url.as_str().contains("&category=catering.restaurant&"));
}

#[test]
fn endpoint_url_encodes_special_characters() {
    let client = test_client("http://localhost:8000");
    let url = client
        .endpoint_url(NEARBY_PATH, &[("categories", "cafe & bar".to_owned())])
        .unwrap();
    assert!(
        url.as_str().contains("cafe+%26+bar") || url.as_str().contains("cafe%20%26%20bar"),
        "query param should be percent-encoded: {url}"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    let err = BackendClient::with_base_url("not a url", 12, "ua").unwrap_err();
    assert!(matches!(err, BackendError::InvalidBaseUrl { .. }));
}

#[test]
fn rejects_non_http_scheme() {
    let err = BackendClient::with_base_url("ftp://example.com", 12, "ua").unwrap_err();
    assert!(err.to_string().contains("unsupported scheme 'ftp'"), "{err}");
}

#[test]
fn builder_methods_set_auth_and_retries() {
    let client = test_client("http://localhost:8000")
        .with_auth_token("secret")
        .with_retries(3, 250);
    assert_eq!(client.auth_token.as_deref(), Some("secret"));
    assert_eq!(client.max_retries, 3);
    assert_eq!(client.backoff_base_ms, 250);
}

#[test]
fn debug_redacts_auth_token() {
    let client = test_client("http://localhost:8000").with_auth_token("super-secret");
    let rendered = format!("{client:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}
