mod common;

use common::{StubClient, settle};
use lot_watch::api::{Endpoints, OccupancySource, ParkingApi};
use lot_watch::config::SyncConfig;
use lot_watch::fetch::{BasicClient, FetchFailure};
use lot_watch::model::{HistoryPoint, LotSummary};
use lot_watch::view::AggregateView;
use std::sync::Arc;
use std::time::Duration;

fn api(responses: &[(u16, &str)]) -> ParkingApi<StubClient> {
    ParkingApi::new(
        StubClient::with(responses),
        Endpoints::new("http://localhost:5000").unwrap(),
    )
}

#[tokio::test]
async fn test_parking_data_decodes_every_lot() {
    let body = r#"{
        "lot1": {"total": 25, "available": 12, "occupied": 13},
        "lot2": {"total": 30, "available": 8, "occupied": 22}
    }"#;
    let api = api(&[(200, body)]);

    let state = api.parking_data().await.unwrap();

    assert_eq!(state.get("lot1"), Some(&LotSummary::new(25, 12, 13)));
    assert_eq!(state.get("lot2"), Some(&LotSummary::new(30, 8, 22)));
}

#[tokio::test]
async fn test_parking_details_requests_lot() {
    let body = r#"{
        "total": 20, "available": 5, "occupied": 15,
        "history": [{"time": "12:00:01", "available": 5, "occupied": 15}]
    }"#;
    let client = StubClient::with(&[(200, body)]);
    let requests = Arc::clone(&client.requests);
    let endpoints = Endpoints::new("http://monitor.example/parking/").unwrap();
    let api = ParkingApi::new(client, endpoints);

    let detail = api.parking_details("2").await.unwrap();

    assert_eq!(
        requests.lock().unwrap().as_slice(),
        ["http://monitor.example/parking/api/parking-details?lot=2"]
    );
    assert_eq!(detail.summary, LotSummary::new(20, 5, 15));
    assert_eq!(detail.history, vec![HistoryPoint::new("12:00:01", 5, 15)]);
}

#[tokio::test]
async fn test_error_status_is_failure() {
    let api = api(&[(400, r#"{"error":"Invalid lot number"}"#)]);

    let err = api.parking_details("9").await.unwrap_err();

    assert!(matches!(err, FetchFailure::Status(s) if s.as_u16() == 400));
}

#[tokio::test]
async fn test_malformed_body_is_failure() {
    let api = api(&[(200, "<html>not json</html>")]);

    let err = api.parking_data().await.unwrap_err();

    assert!(matches!(err, FetchFailure::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_failure() {
    let client = BasicClient::with_timeout(Duration::from_millis(500)).unwrap();
    let api = ParkingApi::new(client, Endpoints::new("http://127.0.0.1:1").unwrap());

    let err = api.parking_data().await.unwrap_err();

    assert!(matches!(err, FetchFailure::Transport(_)));
}

#[tokio::test]
async fn test_health() {
    let api = api(&[(200, r#"{"status":"healthy"}"#)]);
    assert!(api.health().await.unwrap().is_healthy());
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_over_http_falls_back() {
    let source = Arc::new(api(&[(500, "")]));
    let view = AggregateView::mount(source, &SyncConfig::default()).unwrap();

    settle().await;
    let current = view.current();

    assert!(!current.loading);
    assert_eq!(
        current.model.get("lot1"),
        Some(&LotSummary::new(25, 12, 13))
    );
    assert_eq!(
        current.error.as_deref(),
        Some("Failed to fetch parking data")
    );
}
