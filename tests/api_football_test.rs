//! Integration tests for ApiFootballClient using wiremock

use std::time::Duration;

use chrono::NaiveDate;
use round_watch::config::ApiFootballConfig;
use round_watch::provider::{ApiFootballClient, MatchSource};
use round_watch::WatchError;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiFootballClient {
    let config = ApiFootballConfig {
        base_url: server.uri(),
        key: "test-key".to_string(),
        season: "2024".to_string(),
        round_prefix: "Regular Season - ".to_string(),
        request_timeout: Duration::from_secs(5),
    };
    ApiFootballClient::new(&config).unwrap()
}

fn fixture(id: u32, short: &str, elapsed: Option<u32>) -> Value {
    json!({
        "fixture": {
            "id": id,
            "date": "2025-03-01T17:00:00+00:00",
            "status": {"short": short, "elapsed": elapsed}
        },
        "league": {"id": 197, "round": "Regular Season - 9"},
        "teams": {"home": {"name": "Olympiacos"}, "away": {"name": "Panathinaikos"}},
        "goals": {"home": elapsed.map(|_| 2), "away": elapsed.map(|_| 1)}
    })
}

#[tokio::test]
async fn test_round_fixtures_use_round_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("league", "197"))
        .and(query_param("season", "2024"))
        .and(query_param("round", "Regular Season - 9"))
        .and(query_param("timezone", "UTC"))
        .and(header("x-rapidapi-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [],
            "response": [fixture(11, "NS", None), fixture(12, "FT", Some(90)), "not an object"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let matches = client(&server).fixtures(197, "9").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].key().as_deref(), Some("11"));
    assert_eq!(matches[0].round().as_deref(), Some("9"));
    assert_eq!(matches[0].text("time").as_deref(), Some("17:00"));
    assert_eq!(
        matches[1].nested_text("scores", "score").as_deref(),
        Some("2 - 1")
    );
}

#[tokio::test]
async fn test_fixtures_on_day_sends_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("date", "2025-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [],
            "response": [fixture(11, "NS", None)]
        })))
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let matches = client(&server).fixtures_on(197, day).await.unwrap();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn test_live_carries_minute() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("live", "197"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [],
            "response": [fixture(12, "1H", Some(34))]
        })))
        .mount(&server)
        .await;

    let live = client(&server).live(197).await.unwrap();
    assert_eq!(live[0].text("status").as_deref(), Some("1H"));
    assert_eq!(live[0].text("time").as_deref(), Some("34"));
    assert_eq!(live[0].text("scheduled").as_deref(), Some("17:00"));
}

#[tokio::test]
async fn test_results_ask_for_finished_window() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("from", "2025-02-22"))
        .and(query_param("to", "2025-03-08"))
        .and(query_param("status", "FT-AET-PEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [],
            "response": [fixture(12, "FT", Some(90))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = NaiveDate::from_ymd_opt(2025, 2, 22).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
    let results = client(&server).results(197, from, to).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_reported_errors_are_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": {"token": "Error/Missing application key."},
            "response": []
        })))
        .mount(&server)
        .await;

    let err = client(&server).live(197).await.unwrap_err();
    match err {
        WatchError::Provider { message, url } => {
            assert!(message.contains("Missing application key"));
            assert!(!url.contains("test-key"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_response_list_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let err = client(&server).live(197).await.unwrap_err();
    assert!(matches!(err, WatchError::Provider { .. }));
}
