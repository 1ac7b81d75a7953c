use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use round_watch::announce::RedditAnnouncer;
use round_watch::config::{FeedProvider, LogFormat};
use round_watch::provider::{ApiFootballClient, LiveScoreClient, MatchSource};
use round_watch::scheduler::CloudTasksScheduler;
use round_watch::store::FileStore;
use round_watch::{server, Config, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    setup_tracing(config.service.log_format);
    config.validate().context("Invalid configuration")?;

    let source: Arc<dyn MatchSource> = match config.provider {
        FeedProvider::LiveScore => Arc::new(LiveScoreClient::new(&config.live_score)?),
        FeedProvider::ApiFootball => Arc::new(ApiFootballClient::new(&config.api_football)?),
    };

    let store = Arc::new(FileStore::new(&config.service.store_root));
    let orchestrator = Orchestrator::new(
        source,
        store.clone(),
        store,
        Arc::new(RedditAnnouncer::new(
            &config.reddit,
            &config.competition.round_label,
        )?),
        Arc::new(CloudTasksScheduler::new(&config.cloud_tasks)?),
        &config,
    );

    let app = server::router(Arc::new(orchestrator), config.service.api_key.clone());
    let listener = tokio::net::TcpListener::bind(config.service.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.service.bind_address))?;

    tracing::info!(
        address = %config.service.bind_address,
        competition_id = config.competition.competition_id,
        provider = %config.provider,
        "round-watch listening"
    );
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn setup_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("round_watch=info,warn"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
