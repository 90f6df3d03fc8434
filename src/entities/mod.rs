// Entity Models
//
// Teachers and teams are written once, when the database is seeded.
// Score entries are the ledger: appended, never changed.

pub mod action;
pub mod score_entry;
pub mod teacher;
pub mod team;

pub use action::{ActionPreset, ACTION_PRESETS};
pub use score_entry::{NewScoreEntry, ScoreEntry, ScoreEntryWithTeam};
pub use teacher::{NewTeacher, Teacher, TeacherSummary};
pub use team::{default_roster, NewTeam, Team, TeamWithRecentChange};
