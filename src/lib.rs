//! Follows one competition round at a time: merges the provider's fixture,
//! live and results feeds into a snapshot, keeps a watch thread current and
//! asks a task queue to call the service again when something will change.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use round_watch::announce::RedditAnnouncer;
//! use round_watch::provider::LiveScoreClient;
//! use round_watch::scheduler::CloudTasksScheduler;
//! use round_watch::store::FileStore;
//! use round_watch::{Config, Orchestrator};
//!
//! # async fn example() -> round_watch::Result<()> {
//! let config = Config::from_env()?;
//! config.validate()?;
//!
//! let store = Arc::new(FileStore::new(&config.service.store_root));
//! let orchestrator = Orchestrator::new(
//!     Arc::new(LiveScoreClient::new(&config.live_score)?),
//!     store.clone(),
//!     store,
//!     Arc::new(RedditAnnouncer::new(&config.reddit, &config.competition.round_label)?),
//!     Arc::new(CloudTasksScheduler::new(&config.cloud_tasks)?),
//!     &config,
//! );
//!
//! let report = orchestrator.run().await?;
//! println!("round state: {:?}", report.round_state);
//! # Ok(())
//! # }
//! ```

pub mod announce;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod tracker;

pub use config::Config;
pub use error::{ErrorCategory, Result, WatchError};
pub use tracker::{InvocationReport, Orchestrator};
