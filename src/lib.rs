// Team Scoreboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod aggregation;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod validation;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use aggregation::{recent_activity_feed, teams_with_weekly_change, DEFAULT_FEED_LIMIT, WINDOW_DAYS};
pub use api::{LoginOutcome, WritePolicy};
pub use auth::{authenticate, AuthResult, AuthSession};
pub use config::{Config, ConfigError};
pub use db::{
    append_score_entry, get_team, get_teacher, get_teacher_by_login_id, initialize_if_empty,
    list_entries_for_team_since, list_recent_entries, list_teams, open_database, setup_database,
};
pub use entities::{
    default_roster, ActionPreset, NewScoreEntry, NewTeacher, NewTeam, ScoreEntry,
    ScoreEntryWithTeam, Teacher, TeacherSummary, Team, TeamWithRecentChange, ACTION_PRESETS,
};
pub use error::{LedgerError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directives used when RUST_LOG is not set
pub fn default_log_filter(binary: &str) -> String {
    format!("team_scoreboard=info,{}=info", binary.replace('-', "_"))
}
