// 👩‍🏫 Teacher Entity - the only actors allowed to write to the ledger
//
// Teachers are created when the database is seeded and never change
// afterwards. The credential is kept as a salted hash (see auth.rs) and is
// never serialized.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Stable identity (UUID), referenced by score entries
    pub id: String,

    /// Login handle, unique (e.g. "ENS001")
    #[serde(rename = "teacherId")]
    pub login_id: String,

    /// Encoded password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl Teacher {
    pub fn summary(&self) -> TeacherSummary {
        TeacherSummary {
            id: self.id.clone(),
            login_id: self.login_id.clone(),
        }
    }
}

/// Public view returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherSummary {
    pub id: String,

    #[serde(rename = "teacherId")]
    pub login_id: String,
}

/// Seed credential (plaintext, hashed before it is stored)
#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub login_id: String,
    pub password: String,
}

impl NewTeacher {
    pub fn new(login_id: &str, password: &str) -> Self {
        NewTeacher {
            login_id: login_id.to_string(),
            password: password.to_string(),
        }
    }
}
