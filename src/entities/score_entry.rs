// 📒 Score Entry - one immutable line of the ledger
//
// "Every change is an event"
//
// Entries are appended, never updated or deleted. A team's total_score is
// the sum of the points of its entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::team::Team;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: String,

    /// Owning team (Team.id)
    pub team_id: String,

    /// Author (Teacher.id, not the login handle)
    pub teacher_id: String,

    /// Free-text label, e.g. "emprunter un livre au CDI"
    pub action: String,

    /// Signed; negative entries remove points
    pub points: i64,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

/// Validated write request, before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScoreEntry {
    pub team_id: String,
    pub teacher_id: String,
    pub action: String,
    pub points: i64,
}

impl NewScoreEntry {
    pub fn new(team_id: &str, teacher_id: &str, action: &str, points: i64) -> Self {
        NewScoreEntry {
            team_id: team_id.to_string(),
            teacher_id: teacher_id.to_string(),
            action: action.to_string(),
            points,
        }
    }

    pub fn into_entry(self, timestamp: DateTime<Utc>) -> ScoreEntry {
        ScoreEntry {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: self.team_id,
            teacher_id: self.teacher_id,
            action: self.action,
            points: self.points,
            timestamp,
        }
    }
}

/// Activity feed row: the entry with its team embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntryWithTeam {
    #[serde(flatten)]
    pub entry: ScoreEntry,

    pub team: Team,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::team::NewTeam;

    #[test]
    fn test_into_entry_assigns_identity() {
        let now = Utc::now();
        let entry = NewScoreEntry::new("team-1", "teacher-1", "carnet à jour", 10).into_entry(now);

        assert!(!entry.id.is_empty());
        assert_eq!(entry.team_id, "team-1");
        assert_eq!(entry.points, 10);
        assert_eq!(entry.timestamp, now);
    }

    #[test]
    fn test_entry_with_team_wire_shape() {
        let team = NewTeam::new("Les Tigres", &["Julia"], "fas fa-fire", "yellow").into_team();
        let entry = NewScoreEntry::new(&team.id, "teacher-1", "violence", -100).into_entry(Utc::now());
        let row = ScoreEntryWithTeam { entry, team };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["points"], -100);
        assert_eq!(json["teacherId"], "teacher-1");
        assert_eq!(json["team"]["name"], "Les Tigres");
        assert_eq!(json["team"]["id"], json["teamId"]);
    }
}
