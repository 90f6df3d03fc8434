// 📊 Aggregation Engine - read models derived from the ledger
//
// Two projections feed the dashboard:
// - every team with its points over a rolling 7-day window
// - the most recent ledger entries, newest first
//
// The window is anchored at the `now` passed in (query time), not at a
// calendar week, and nothing is cached between calls.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::db;
use crate::entities::{ScoreEntry, ScoreEntryWithTeam, TeamWithRecentChange};
use crate::error::Result;

/// Length of the "recent change" window
pub const WINDOW_DAYS: i64 = 7;

/// Size of the public activity feed
pub const DEFAULT_FEED_LIMIT: usize = 10;

/// Oldest timestamp still inside the window (inclusive)
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    db::normalize_timestamp(now - Duration::days(WINDOW_DAYS))
}

pub fn sum_points(entries: &[ScoreEntry]) -> i64 {
    entries
        .iter()
        .fold(0i64, |acc, entry| acc.saturating_add(entry.points))
}

/// Every team with `recent_change` = points earned since `now - 7 days`
pub fn teams_with_weekly_change(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Vec<TeamWithRecentChange>> {
    let cutoff = window_start(now);

    db::list_teams(conn)?
        .into_iter()
        .map(|team| -> Result<TeamWithRecentChange> {
            let weekly = db::list_entries_for_team_since(conn, &team.id, cutoff)?;
            Ok(TeamWithRecentChange {
                recent_change: sum_points(&weekly),
                team,
            })
        })
        .collect()
}

/// Newest entries with their team, at most `limit`
pub fn recent_activity_feed(conn: &Connection, limit: usize) -> Result<Vec<ScoreEntryWithTeam>> {
    db::list_recent_entries(conn, limit)
}
