//! Inbound HTTP trigger.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::tracker::planner::API_KEY_HEADER;
use crate::tracker::Orchestrator;

struct AppState {
    orchestrator: Arc<Orchestrator>,
    api_key: String,
}

/// Routes of the tracker service.
///
/// `POST /run` performs one invocation and requires the shared secret in the
/// `X-API-Key` header. `GET /health` always answers `OK`.
pub fn router(orchestrator: Arc<Orchestrator>, api_key: impl Into<String>) -> Router {
    let state = Arc::new(AppState {
        orchestrator,
        api_key: api_key.into(),
    });

    Router::new()
        .route("/run", post(run_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (StatusCode, &'static str) {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if state.api_key.is_empty() || presented != Some(state.api_key.as_str()) {
        warn!("rejected run request with missing or wrong api key");
        return (StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match state.orchestrator.run().await {
        Ok(report) => {
            info!(
                tracking = ?report.tracking,
                round_state = ?report.round_state,
                announcement = %report.announcement,
                next_run_at = ?report.next_run_at,
                task_name = ?report.task_name,
                "invocation finished"
            );
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            error!(error = %e, category = %e.category(), "invocation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::announce::RedditAnnouncer;
    use crate::config::Config;
    use crate::provider::LiveScoreClient;
    use crate::scheduler::MemoryScheduler;
    use crate::store::MemoryStore;

    fn app() -> (Router, Arc<MemoryScheduler>) {
        let mut config = Config::default();
        // Nothing listens here; a run that reaches the provider fails fast.
        config.live_score.base_url = "http://127.0.0.1:9".to_string();
        config.service.callback_url = "http://127.0.0.1:9/run".to_string();

        let store = Arc::new(MemoryStore::new());
        let scheduler = Arc::new(MemoryScheduler::new());
        let orchestrator = Orchestrator::new(
            Arc::new(LiveScoreClient::with_client(
                reqwest::Client::new(),
                &config.live_score,
            )),
            store.clone(),
            store,
            Arc::new(RedditAnnouncer::with_client(
                reqwest::Client::new(),
                &config.reddit,
                &config.competition.round_label,
            )),
            scheduler.clone(),
            &config,
        );
        (router(Arc::new(orchestrator), "secret"), scheduler)
    }

    fn run_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/run");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_requires_api_key() {
        let (app, scheduler) = app();
        let response = app.clone().oneshot(run_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(run_request(Some("wrong"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(scheduler.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_is_server_error() {
        let (app, scheduler) = app();
        let response = app.oneshot(run_request(Some("secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(scheduler.tasks().is_empty());
    }
}
