//! Announcement posts that follow a round as it is played.

mod reddit;
mod render;

pub use reddit::RedditAnnouncer;
pub use render::{render, Post};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Round;

/// A backend that publishes one post per round and rewrites it in place.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Return the id of the round's post, creating it if no post with the
    /// round's title exists yet.
    async fn create_or_get(&self, round: &Round) -> Result<String>;

    /// Replace the body of an existing post with the current snapshot.
    async fn update(&self, post_id: &str, round: &Round) -> Result<()>;
}
