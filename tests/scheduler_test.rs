//! Integration tests for CloudTasksScheduler using wiremock

use chrono::{TimeZone, Utc};
use round_watch::config::CloudTasksConfig;
use round_watch::scheduler::{
    CloudTasksScheduler, CreateOutcome, DeleteOutcome, TaskRequest, TaskScheduler,
};
use round_watch::WatchError;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUEUE: &str = "/v2/projects/demo/locations/europe-west1/queues/rounds";

fn config(server: &MockServer, token: Option<&str>) -> CloudTasksConfig {
    CloudTasksConfig {
        project_id: "demo".to_string(),
        location: "europe-west1".to_string(),
        queue_id: "rounds".to_string(),
        api_base: server.uri(),
        access_token: token.map(str::to_string),
        metadata_url: format!("{}/token", server.uri()),
    }
}

fn task() -> TaskRequest {
    TaskRequest {
        name: "round-9-202503011605".to_string(),
        url: "https://tracker.example/run".to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-API-Key".to_string(), "secret".to_string()),
        ],
        run_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 16, 5, 30).unwrap()),
    }
}

#[tokio::test]
async fn test_create_posts_named_task() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{QUEUE}/tasks")))
        .and(bearer_token("static-token"))
        .and(body_json(json!({
            "task": {
                "name": "projects/demo/locations/europe-west1/queues/rounds/tasks/round-9-202503011605",
                "scheduleTime": "2025-03-01T16:05:30+00:00",
                "httpRequest": {
                    "httpMethod": "POST",
                    "url": "https://tracker.example/run",
                    "headers": {
                        "Content-Type": "application/json",
                        "X-API-Key": "secret"
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let scheduler = CloudTasksScheduler::new(&config(&server, Some("static-token"))).unwrap();
    assert_eq!(scheduler.create(&task()).await.unwrap(), CreateOutcome::Created);
}

#[tokio::test]
async fn test_conflict_means_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{QUEUE}/tasks")))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let scheduler = CloudTasksScheduler::new(&config(&server, Some("t"))).unwrap();
    assert_eq!(
        scheduler.create(&task()).await.unwrap(),
        CreateOutcome::AlreadyExists
    );
}

#[tokio::test]
async fn test_delete_outcomes() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{QUEUE}/tasks/present")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{QUEUE}/tasks/absent")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{QUEUE}/tasks/forbidden")))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let scheduler = CloudTasksScheduler::new(&config(&server, Some("t"))).unwrap();
    assert_eq!(scheduler.delete("present").await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(scheduler.delete("absent").await.unwrap(), DeleteOutcome::NotFound);

    let err = scheduler.delete("forbidden").await.unwrap_err();
    assert!(matches!(
        err,
        WatchError::Scheduler {
            operation: "delete",
            ..
        }
    ));
}

#[tokio::test]
async fn test_token_from_metadata_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/token"))
        .and(header("Metadata-Flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "from-metadata",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(bearer_token("from-metadata"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let scheduler = CloudTasksScheduler::new(&config(&server, None)).unwrap();
    assert_eq!(
        scheduler.delete("round-9-202503011605").await.unwrap(),
        DeleteOutcome::NotFound
    );
}
