//! Integration tests for the provider search client
//!
//! These tests verify:
//! - Form encoding of the search request
//! - Decoding of success, empty, and failure response shapes
//! - User-facing messages for rejection and transport failures
//! - Latest-request-wins when responses arrive out of order

use carefinder::StateManager;
use carefinder::models::provider::Location;
use carefinder::services::search::{SearchClient, SearchError};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_body(name: &str, lat: f64, lon: f64) -> serde_json::Value {
    json!({
        "name": name,
        "full_address": format!("{name}, 1 Main St"),
        "type": "Hospital",
        "cms_rating": 4.0,
        "cost": 100.0,
        "availability": "High",
        "distance": 1.2,
        "latitude": lat,
        "longitude": lon,
        "contact": "555-0100"
    })
}

#[tokio::test]
async fn test_search_sends_form_and_decodes_providers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search_providers"))
        .and(body_string_contains("latitude=40"))
        .and(body_string_contains("provider_type=nursing+home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "providers": [provider_body("Mercy General", 40.1, -98.1)],
            "count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SearchClient::new(server.uri());
    let (providers, count) = client
        .search(Location::new(40.0, -98.0), "nursing home")
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].name, "Mercy General");
    assert_eq!(providers[0].kind, "Hospital");
}

#[tokio::test]
async fn test_search_empty_result_set() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search_providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "providers": [],
            "count": 0
        })))
        .mount(&server)
        .await;

    let client = SearchClient::new(server.uri());
    let (providers, count) = client
        .search(Location::new(40.0, -98.0), "supplier")
        .await
        .unwrap();

    assert!(providers.is_empty());
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_search_rejection_carries_server_reason() {
    let server = MockServer::start().await;

    // The backend answers rejections with HTTP 400 and a JSON error body
    Mock::given(method("POST"))
        .and(path("/search_providers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "could not convert string to float"
        })))
        .mount(&server)
        .await;

    let client = SearchClient::new(server.uri());
    let err = client
        .search(Location::new(40.0, -98.0), "hospital")
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Rejected(Some(_))));
    assert_eq!(
        err.user_message(),
        "Search failed: could not convert string to float"
    );
}

#[tokio::test]
async fn test_search_transport_failure_message() {
    // Nothing is listening here
    let client = SearchClient::new("http://127.0.0.1:1");
    let err = client
        .search(Location::new(40.0, -98.0), "hospital")
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Transport(_)));
    assert!(err.user_message().starts_with("Network error: "));
}

#[tokio::test]
async fn test_out_of_order_responses_latest_wins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search_providers"))
        .and(body_string_contains("provider_type=hospital"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "providers": [provider_body("Old Result", 40.0, -98.0)],
            "count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search_providers"))
        .and(body_string_contains("provider_type=supplier"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "providers": [provider_body("New Result", 41.0, -97.0)],
            "count": 1
        })))
        .mount(&server)
        .await;

    let client = SearchClient::new(server.uri());
    let state = StateManager::new();
    let location = Location::new(40.0, -98.0);

    // Two overlapping invocations; the first one's response is applied last
    let first_seq = state.begin_search();
    let second_seq = state.begin_search();

    let (second_providers, second_count) =
        client.search(location, "supplier").await.unwrap();
    assert!(state.finish_search(second_seq, second_providers, second_count));

    let (first_providers, first_count) = client.search(location, "hospital").await.unwrap();
    assert!(!state.finish_search(first_seq, first_providers, first_count));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.providers[0].name, "New Result");
    assert!(!snapshot.is_searching);
}

#[tokio::test]
async fn test_provider_types_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get_provider_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "types": ["hospital", "supplier"]
        })))
        .mount(&server)
        .await;

    let client = SearchClient::new(server.uri());
    let types = client.provider_types().await.unwrap();
    assert_eq!(types, vec!["hospital".to_string(), "supplier".to_string()]);
}
