use itertools::Itertools;
use url::form_urlencoded;

use crate::model::{Match, MatchStatus, Round};

const TABLE_HEADER: &str = "| Home | Score | Away | Status |\n|:---|:---:|:---|:---|\n";
const SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Title and markdown body of a round's post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub body: String,
}

/// Render a round snapshot as a post.
///
/// The output depends only on `round` and `round_label`, so the title can be
/// searched for and repeated updates overwrite identical content.
pub fn render(round: &Round, round_label: &str) -> Post {
    let title = format!(
        "{} Watch Thread: {round_label} {}",
        round.competition_name, round.round_id
    );

    let body = format!(
        "{TABLE_HEADER}{}\n\n---\n*Last updated: {} (UTC)*",
        round.matches.iter().map(row).join("\n"),
        round.last_updated_utc.format("%Y-%m-%d %H:%M:%S")
    );

    Post { title, body }
}

fn row(m: &Match) -> String {
    let home = team_cell(&m.home_team, m.home_local_name.as_deref(), m.home_link.as_deref());
    let away = team_cell(&m.away_team, m.away_local_name.as_deref(), m.away_link.as_deref());

    let score = match m.score.trim() {
        "" => "-".to_string(),
        score => {
            let query: String =
                form_urlencoded::byte_serialize(format!("{} vs {}", m.home_team, m.away_team).as_bytes())
                    .collect();
            format!("[{score}]({SEARCH_URL}{query})")
        }
    };

    format!("| {home} | **{score}** | {away} | {} |", status_cell(m))
}

fn team_cell(name: &str, local_name: Option<&str>, link: Option<&str>) -> String {
    let display = local_name.unwrap_or(name);
    match link {
        Some(link) => format!("[{display}]({link})"),
        None => display.to_string(),
    }
}

fn status_cell(m: &Match) -> String {
    match m.status {
        MatchStatus::InPlay => format!("🔴 Live ({}')", m.live_minute.as_deref().unwrap_or("")),
        MatchStatus::HalfTime => "Half Time".to_string(),
        MatchStatus::Completed => "Full Time".to_string(),
        MatchStatus::NotStarted => {
            let date = m.date.map(|d| d.to_string()).unwrap_or_default();
            let time = m
                .kickoff_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default();
            format!("{date} {time}").trim().to_string()
        }
    }
}
