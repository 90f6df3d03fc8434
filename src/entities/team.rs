// 🏆 Team Entity - fixed roster, score changes only through the ledger
//
// "A team's total is a projection of its ledger entries"
//
// Teams are inserted once when the database is seeded. After that the only
// thing that ever changes is total_score, and only as a side effect of
// appending a score entry.

use serde::{Deserialize, Serialize};

// ============================================================================
// TEAM ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    /// Member names, in display order
    pub members: Vec<String>,

    /// Icon class name (e.g. "fas fa-eagle")
    pub icon: String,

    /// Color class (e.g. "blue")
    pub color: String,

    /// Running sum of every ledger entry for this team
    pub total_score: i64,
}

/// Team definition used when seeding the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub members: Vec<String>,
    pub icon: String,
    pub color: String,
}

impl NewTeam {
    pub fn new(name: &str, members: &[&str], icon: &str, color: &str) -> Self {
        NewTeam {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }

    /// Materialize the team with a fresh identity and a zero score
    pub fn into_team(self) -> Team {
        Team {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            members: self.members,
            icon: self.icon,
            color: self.color,
            total_score: 0,
        }
    }
}

/// The four houses every fresh database starts with
pub fn default_roster() -> Vec<NewTeam> {
    vec![
        NewTeam::new(
            "Les Aigles",
            &["Emma", "Lucas", "Chloé", "Antoine"],
            "fas fa-eagle",
            "blue",
        ),
        NewTeam::new(
            "Les Lions",
            &["Sophie", "Thomas", "Léa", "Maxime"],
            "fas fa-crown",
            "orange",
        ),
        NewTeam::new(
            "Les Dauphins",
            &["Camille", "Hugo", "Marie", "Paul"],
            "fas fa-fish",
            "cyan",
        ),
        NewTeam::new(
            "Les Tigres",
            &["Julia", "Nathan", "Sarah", "Victor"],
            "fas fa-fire",
            "yellow",
        ),
    ]
}

// ============================================================================
// READ MODEL
// ============================================================================

/// Team plus its points over the trailing week (the dashboard row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithRecentChange {
    #[serde(flatten)]
    pub team: Team,

    pub recent_change: i64,
}

// ============================================================================
// TESTS
// ============================================================================
