use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::announce::Announcer;
use crate::config::{CadenceConfig, CompetitionConfig, Config};
use crate::error::{Result, WatchError};
use crate::model::{PointerUpdate, Round, RoundAnalysis, RoundPointer, RoundState, Tracking};
use crate::provider::MatchSource;
use crate::scheduler::TaskScheduler;
use crate::store::{PointerStore, SnapshotStore};
use crate::tracker::analyze::{analyze, earliest_pending_kickoff, to_chrono};
use crate::tracker::consolidate::{consolidate, RoundFeeds};
use crate::tracker::{discovery, planner};

/// What happened to the round's post during one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnnouncementAction {
    None,
    Created { post_id: String },
    Updated,
    Finalized,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    /// The state the invocation ended up working on.
    pub tracking: Tracking,
    /// Whether the round was discovered during this invocation.
    pub discovered: bool,
    /// `None` when no round was tracked.
    pub round_state: Option<RoundState>,
    pub announcement: AnnouncementAction,
    pub next_run_at: Option<DateTime<Utc>>,
    pub task_name: Option<String>,
}

/// The announcement step chosen for a round snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementStep {
    Nothing,
    Create,
    Update,
    Finalize,
}

/// Decide what to do with the round's post.
///
/// A post is created once the round is under way, or while it has not
/// started as soon as its earliest kickoff is inside `lead_window`. An
/// existing post is rewritten while the round is in play and once more
/// when it completes.
pub fn announcement_step(
    pointer: &RoundPointer,
    round: &Round,
    analysis: &RoundAnalysis,
    now: DateTime<Utc>,
    lead_window: std::time::Duration,
) -> AnnouncementStep {
    match (&pointer.announcement_post_id, analysis.round_state) {
        (None, RoundState::InPlay | RoundState::PartiallyCompleted) => AnnouncementStep::Create,
        (None, RoundState::NotStarted) => match earliest_pending_kickoff(&round.matches) {
            Some(kickoff) if kickoff - now <= to_chrono(lead_window) => AnnouncementStep::Create,
            _ => AnnouncementStep::Nothing,
        },
        (Some(_), RoundState::InPlay) => AnnouncementStep::Update,
        (Some(_), RoundState::Completed) if !pointer.announcement_finalized => {
            AnnouncementStep::Finalize
        }
        _ => AnnouncementStep::Nothing,
    }
}

/// Drives one tracker invocation end to end.
///
/// Every collaborator sits behind a trait object, so the same controller runs
/// against the real services and against in-memory doubles.
pub struct Orchestrator {
    source: Arc<dyn MatchSource>,
    pointers: Arc<dyn PointerStore>,
    snapshots: Arc<dyn SnapshotStore>,
    announcer: Arc<dyn Announcer>,
    scheduler: Arc<dyn TaskScheduler>,
    competition: CompetitionConfig,
    cadence: CadenceConfig,
    callback_url: String,
    api_key: String,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn MatchSource>,
        pointers: Arc<dyn PointerStore>,
        snapshots: Arc<dyn SnapshotStore>,
        announcer: Arc<dyn Announcer>,
        scheduler: Arc<dyn TaskScheduler>,
        config: &Config,
    ) -> Self {
        Self {
            source,
            pointers,
            snapshots,
            announcer,
            scheduler,
            competition: config.competition.clone(),
            cadence: config.cadence.clone(),
            callback_url: config.service.callback_url.clone(),
            api_key: config.service.api_key.clone(),
        }
    }

    /// Run one invocation at the current time.
    pub async fn run(&self) -> Result<InvocationReport> {
        self.run_at(Utc::now()).await
    }

    /// Run one invocation as if the clock read `now`.
    #[instrument(skip(self))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<InvocationReport> {
        let stored = self.pointers.get().await?;
        let tracking = Tracking::from_pointer(stored.as_ref())?;

        let (pointer, round_id, document_path, discovered) = match (tracking, stored) {
            (
                Tracking::Round {
                    round_id,
                    document_path,
                },
                Some(pointer),
            ) => (pointer, round_id, document_path, false),
            (Tracking::Round { round_id, .. }, None) => {
                return Err(WatchError::MalformedPointer {
                    reason: format!("round {round_id} tracked without a stored pointer"),
                });
            }
            (Tracking::Discovering { previous_round }, _) => {
                match self.discover(previous_round.as_deref(), now).await? {
                    Some((pointer, round_id)) => {
                        let document_path = pointer.document_path.clone();
                        (pointer, round_id, document_path, true)
                    }
                    None => return self.idle(previous_round, now).await,
                }
            }
        };
        info!(%round_id, discovered, "tracking round");

        let round = self.snapshot(&round_id, now).await?;
        let analysis = analyze(&round, now, &self.cadence);

        self.snapshots.set(&document_path, &round).await?;

        let announcement = self.announce(&pointer, &round, &analysis, now).await?;

        if analysis.round_state == RoundState::Completed {
            self.pointers.update(&PointerUpdate::completed(), now).await?;
            info!(%round_id, "round completed, pointer retired");
        }

        let task_name = planner::schedule(
            self.scheduler.as_ref(),
            analysis.next_run_at,
            &self.callback_url,
            &self.api_key,
            Some(&round_id),
            self.cadence.task_bucket,
        )
        .await?;

        Ok(InvocationReport {
            tracking: Tracking::Round {
                round_id,
                document_path,
            },
            discovered,
            round_state: Some(analysis.round_state),
            announcement,
            next_run_at: analysis.next_run_at,
            task_name,
        })
    }

    async fn discover(
        &self,
        previous: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<(RoundPointer, String)>> {
        let Some(round_id) = discovery::discover_round(
            self.source.as_ref(),
            self.competition.competition_id,
            now.date_naive(),
            self.cadence.discovery_lookahead_days,
            previous,
        )
        .await?
        else {
            return Ok(None);
        };

        let document_path = self.competition.document_path(&round_id);
        self.pointers.set(&document_path, &round_id, now).await?;
        let pointer = RoundPointer::tracking(&document_path, &round_id, now);
        Ok(Some((pointer, round_id)))
    }

    async fn idle(&self, previous: Option<String>, now: DateTime<Utc>) -> Result<InvocationReport> {
        let next_run_at = now + to_chrono(self.cadence.idle_recheck);
        info!(%next_run_at, "no round to track, checking again later");

        let task_name = planner::schedule(
            self.scheduler.as_ref(),
            Some(next_run_at),
            &self.callback_url,
            &self.api_key,
            None,
            self.cadence.task_bucket,
        )
        .await?;

        Ok(InvocationReport {
            tracking: Tracking::Discovering {
                previous_round: previous,
            },
            discovered: false,
            round_state: None,
            announcement: AnnouncementAction::None,
            next_run_at: Some(next_run_at),
            task_name,
        })
    }

    async fn snapshot(&self, round_id: &str, now: DateTime<Utc>) -> Result<Round> {
        let competition_id = self.competition.competition_id;
        let today = now.date_naive();
        let window = Days::new(u64::from(self.cadence.results_window_days));
        let from = today.checked_sub_days(window).unwrap_or(today);
        let to = today.checked_add_days(window).unwrap_or(today);

        let (baseline, live, results) = tokio::join!(
            self.source.fixtures(competition_id, round_id),
            self.source.live(competition_id),
            self.source.results(competition_id, from, to),
        );

        let feeds = RoundFeeds {
            baseline: feed("baseline", baseline),
            live: feed("live", live),
            results: feed("results", results),
        };
        consolidate(feeds, round_id, &self.competition.competition_name, now)
    }

    async fn announce(
        &self,
        pointer: &RoundPointer,
        round: &Round,
        analysis: &RoundAnalysis,
        now: DateTime<Utc>,
    ) -> Result<AnnouncementAction> {
        let step = announcement_step(pointer, round, analysis, now, self.cadence.lead_window);
        let post_id = pointer.announcement_post_id.as_deref();

        match (step, post_id) {
            (AnnouncementStep::Create, _) => {
                let post_id = self.announcer.create_or_get(round).await?;
                self.pointers
                    .update(&PointerUpdate::post_created(&post_id), now)
                    .await?;
                Ok(AnnouncementAction::Created { post_id })
            }
            (AnnouncementStep::Update, Some(post_id)) => {
                self.announcer.update(post_id, round).await?;
                Ok(AnnouncementAction::Updated)
            }
            (AnnouncementStep::Finalize, Some(post_id)) => {
                self.announcer.update(post_id, round).await?;
                self.pointers.update(&PointerUpdate::finalized(), now).await?;
                Ok(AnnouncementAction::Finalized)
            }
            _ => Ok(AnnouncementAction::None),
        }
    }
}

fn feed<T>(name: &'static str, result: Result<T>) -> Option<T> {
    result
        .map_err(|e| warn!(feed = name, error = %e, "feed fetch failed"))
        .ok()
}
