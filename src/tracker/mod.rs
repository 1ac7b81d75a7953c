//! The decision core: merge feeds, classify the round, drive announcements
//! and plan the next invocation.

pub mod analyze;
pub mod consolidate;
pub mod discovery;
mod orchestrator;
pub mod planner;
pub mod status;
pub mod teams;

pub use analyze::analyze;
pub use consolidate::{consolidate, RoundFeeds};
pub use discovery::discover_round;
pub use orchestrator::{
    announcement_step, AnnouncementAction, AnnouncementStep, InvocationReport, Orchestrator,
};
pub use planner::{schedule, task_name};
pub use status::normalize_status;
