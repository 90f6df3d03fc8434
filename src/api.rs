//! Read/Write operations behind the HTTP endpoints.
//!
//! Each function validates its input, talks to the gateway and the store, and
//! returns a domain value or a [`LedgerError`]. Transport concerns (status
//! codes, headers) live in the `server` module.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde_json::Value;
use tracing::warn;

use crate::auth::{self, AuthSession};
use crate::db;
use crate::entities::{ScoreEntry, TeacherSummary};
use crate::error::{LedgerError, Result};
use crate::validation;

/// How the write path decides who the acting teacher is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WritePolicy {
    /// Reject writes that do not carry a session
    pub require_session: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub teacher: TeacherSummary,
    pub session: AuthSession,
}

/// Validate the body, check credentials, open a session
pub fn login(conn: &Connection, body: &Value, now: DateTime<Utc>, ttl: Duration) -> Result<LoginOutcome> {
    let request = validation::validate_login(body)?;
    let identity = auth::authenticate(conn, &request.login_id, &request.password)?;
    let teacher = db::get_teacher(conn, &identity.teacher_id)?
        .ok_or_else(LedgerError::teacher_not_found)?;
    let session = auth::open_session(conn, &identity, now, ttl)?;

    Ok(LoginOutcome {
        teacher: teacher.summary(),
        session,
    })
}

pub fn logout(conn: &Connection, token: Option<&str>) -> Result<()> {
    let token = token.ok_or_else(LedgerError::invalid_session)?;
    auth::revoke_session(conn, token)
}

/// A presented token must be valid; an absent one yields `None`
pub fn session_from_token(
    conn: &Connection,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<AuthSession>> {
    token
        .map(|token| auth::resolve_session(conn, token, now))
        .transpose()
}

/// Validate, authorize, check references, then append to the ledger.
///
/// The body is checked before the store is touched, the bearer token
/// (if any) is resolved after. Nothing is written unless every check passes.
pub fn record_score_entry(
    conn: &mut Connection,
    token: Option<&str>,
    body: &Value,
    policy: WritePolicy,
    now: DateTime<Utc>,
) -> Result<ScoreEntry> {
    let new_entry = validation::validate_score_entry(body)?;
    let session = session_from_token(conn, token, now)?;

    match &session {
        Some(session) if session.teacher_id != new_entry.teacher_id => {
            warn!(
                session_teacher = %session.teacher_id,
                body_teacher = %new_entry.teacher_id,
                "score entry rejected: teacher does not match session"
            );
            return Err(LedgerError::Auth(
                "L'enseignant ne correspond pas à la session".to_string(),
            ));
        }
        None if policy.require_session => {
            return Err(LedgerError::Auth("Authentification requise".to_string()));
        }
        _ => {}
    }

    if db::get_team(conn, &new_entry.team_id)?.is_none() {
        return Err(LedgerError::team_not_found());
    }
    if db::get_teacher(conn, &new_entry.teacher_id)?.is_none() {
        return Err(LedgerError::teacher_not_found());
    }

    db::append_score_entry(conn, new_entry, now)
}
