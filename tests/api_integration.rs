//! Integration tests for Lantern API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP
//! API. Where a live Overpass response shape is needed, a local axum
//! server stands in for the upstream; the "unreachable upstream" tests
//! point the client at the discard port instead.

use axum::routing::get;
use axum::{Json, Router};
use axum_test::TestServer;
use serde_json::{Value, json};

use lantern::api::{self, AppState};
use lantern::locator::OverpassClient;
use lantern::sos::SosBroadcaster;

/// Base URL nothing listens on; connections fail fast.
const UNREACHABLE_UPSTREAM: &str = "http://127.0.0.1:9";

fn create_test_server(overpass_base: &str) -> (TestServer, SosBroadcaster) {
    let sos = SosBroadcaster::new();
    let state = AppState {
        locator: OverpassClient::with_base_url(overpass_base),
        sos: sos.clone(),
    };

    let server = TestServer::new(api::router(state)).unwrap();
    (server, sos)
}

/// Spawn a local stand-in for the Overpass API that answers every query
/// with `payload`. Returns its base URL.
async fn spawn_mock_overpass(payload: Value) -> String {
    let app = Router::new().route(
        "/",
        get(move || {
            let payload = payload.clone();
            async move { Json(payload) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_nearby_requires_coordinates() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/safety/nearby?lat=21.1458").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_nearby_rejects_out_of_range_coordinates() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/safety/nearby?lat=123.0&lng=79.0").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_upstream_unreachable_is_bad_gateway() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/safety/nearby?lat=21.1458&lng=79.0882").await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_nearby_ranks_filters_and_counts() {
    // Origin is central Nagpur; 0.01 degrees of latitude is ~1.1 km.
    let base = spawn_mock_overpass(json!({
        "elements": [
            {
                "id": 1,
                "lat": 21.1558,
                "lon": 79.0882,
                "tags": { "name": "Sitabuldi Police Station", "phone": "100" }
            },
            // Closer, but untagged: gets the fallback name and sorts first.
            { "id": 2, "lat": 21.1498, "lon": 79.0882, "tags": {} },
            // ~22 km away: outside the 5 km default radius.
            { "id": 3, "lat": 21.3458, "lon": 79.0882, "tags": { "name": "Too Far" } },
            // No coordinates: dropped before ranking.
            { "id": 4, "tags": { "name": "Unlocatable" } }
        ]
    }))
    .await;
    let (server, _sos) = create_test_server(&base);

    let response = server
        .get("/api/safety/nearby?lat=21.1458&lng=79.0882&type=police")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["id"], 2);
    assert_eq!(data[0]["name"], "Police Station");
    assert_eq!(data[1]["name"], "Sitabuldi Police Station");
    assert_eq!(data[1]["phone"], "100");
    assert!(data[0]["distance"].as_f64().unwrap() <= data[1]["distance"].as_f64().unwrap());
}

#[tokio::test]
async fn test_nearby_empty_result_is_not_an_error() {
    let base = spawn_mock_overpass(json!({ "elements": [] })).await;
    let (server, _sos) = create_test_server(&base);

    let response = server
        .get("/api/safety/nearby?lat=21.1458&lng=79.0882&type=hospital")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_score_requires_coordinates() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/safety/score?lng=79.0882").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_score_degrades_when_upstream_unreachable() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);

    let response = server.get("/api/safety/score?lat=21.1458&lng=79.0882").await;

    // Degraded, not failed: the scorer treats missing counts as zero.
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    let score = data["score"].as_i64().unwrap();
    assert!((0..=100).contains(&score));
    // Zero counts always apply the police and hospital penalties.
    assert!(score <= 65);

    let factors: Vec<&str> = data["factors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["factor"].as_str().unwrap())
        .collect();
    assert!(factors.contains(&"No Police Nearby"));
    assert!(factors.contains(&"No Hospital Nearby"));

    let recommendations = data["recommendations"].as_array().unwrap();
    assert_eq!(
        recommendations[recommendations.len() - 1],
        "Trust your instincts - if something feels wrong, leave"
    );
    assert_eq!(data["nearbyResources"]["policeCount"], 0);
}

#[tokio::test]
async fn test_score_with_live_counts() {
    // Two POIs close to the origin; the same mock answers both the
    // police and hospital lookups, so both counts come back as 2.
    let base = spawn_mock_overpass(json!({
        "elements": [
            { "id": 1, "lat": 21.1498, "lon": 79.0882, "tags": {} },
            { "id": 2, "lat": 21.1518, "lon": 79.0882, "tags": {} }
        ]
    }))
    .await;
    let (server, _sos) = create_test_server(&base);

    let response = server.get("/api/safety/score?lat=21.1458&lng=79.0882").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];

    assert_eq!(data["nearbyResources"]["policeCount"], 2);
    assert_eq!(data["nearbyResources"]["hospitalCount"], 2);

    // No resource penalties; only a time-of-day factor may remain.
    let factors = data["factors"].as_array().unwrap();
    for factor in factors {
        let label = factor["factor"].as_str().unwrap();
        assert!(label == "Late Night" || label == "Early Morning", "unexpected {label}");
    }
}

#[tokio::test]
async fn test_sos_requires_location() {
    let (server, sos) = create_test_server(UNREACHABLE_UPSTREAM);
    let mut rx = sos.subscribe();

    let response = server
        .post("/api/sos/send")
        .json(&json!({ "message": "help" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    // Nothing was published for the invalid trigger.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_sos_missing_lat_is_rejected() {
    let (server, sos) = create_test_server(UNREACHABLE_UPSTREAM);
    let mut rx = sos.subscribe();

    let response = server
        .post("/api/sos/send")
        .json(&json!({ "location": { "lng": 79.0882 } }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_sos_broadcasts_alert() {
    let (server, sos) = create_test_server(UNREACHABLE_UPSTREAM);
    let mut rx = sos.subscribe();

    let response = server
        .post("/api/sos/send")
        .json(&json!({
            "location": { "lat": 21.1458, "lng": 79.0882, "accuracy": 10.0 },
            "message": "EMERGENCY SOS activated! I need help immediately."
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let alert_id = body["data"]["alertId"].as_str().unwrap();
    assert!(alert_id.starts_with("sos_"));

    let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame["alertId"], alert_id);
    assert_eq!(frame["message"], "EMERGENCY SOS activated! I need help immediately.");
    assert_eq!(frame["location"]["accuracy"], 10.0);
}

#[tokio::test]
async fn test_sos_default_message() {
    let (server, sos) = create_test_server(UNREACHABLE_UPSTREAM);
    let mut rx = sos.subscribe();

    server
        .post("/api/sos/send")
        .json(&json!({ "location": { "lat": 21.1458, "lng": 79.0882 } }))
        .await
        .assert_status_ok();

    let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame["message"], "Emergency assistance needed");
}

#[tokio::test]
async fn test_sos_alert_ids_are_distinct() {
    let (server, _sos) = create_test_server(UNREACHABLE_UPSTREAM);
    let body = json!({ "location": { "lat": 21.1458, "lng": 79.0882 } });

    let first = server.post("/api/sos/send").json(&body).await;
    let second = server.post("/api/sos/send").json(&body).await;

    let first: Value = first.json();
    let second: Value = second.json();
    assert_ne!(first["data"]["alertId"], second["data"]["alertId"]);
}
