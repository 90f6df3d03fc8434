use thiserror::Error;

/// Failures raised by the ledger store, the access gateway and request
/// validation. The HTTP layer maps each variant onto a status code.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing request fields. Carries the first message only.
    #[error("{0}")]
    Validation(String),

    /// A referenced team or teacher does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials or an unusable session token.
    #[error("{0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn team_not_found() -> Self {
        LedgerError::NotFound("Équipe non trouvée".to_string())
    }

    pub fn teacher_not_found() -> Self {
        LedgerError::NotFound("Enseignant non trouvé".to_string())
    }

    /// Same message for unknown login and wrong password.
    pub fn invalid_credentials() -> Self {
        LedgerError::Auth("Identifiant ou mot de passe incorrect".to_string())
    }

    pub fn invalid_session() -> Self {
        LedgerError::Auth("Session invalide ou expirée".to_string())
    }

    /// True for failures whose details must stay server-side.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            LedgerError::Storage(_)
                | LedgerError::Serialization(_)
                | LedgerError::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
