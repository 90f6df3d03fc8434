// 🔐 Access Gateway - credentials, password hashing and sessions
//
// Login checks a (login id, password) pair against the stored salted hash.
// A successful login opens a server-side session; the write path receives
// that session as an explicit value instead of trusting ambient state.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::db;
use crate::error::{LedgerError, Result};

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Hash a password with Argon2id and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
/// so the parameters travel with the hash.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| LedgerError::Internal(format!("password salt: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LedgerError::Internal(format!("password hashing: {e}")))
}

/// Check a password against a PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    #[cfg(test)]
    tests::VERIFICATIONS.with(|count| count.set(count.get() + 1));

    let Ok(parsed) = PasswordHash::new(encoded) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Stand-in hash checked when the login id is unknown, so that path costs
/// as much as a wrong password
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password(&uuid::Uuid::new_v4().to_string()).unwrap_or_default())
        .as_str()
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Identity proven by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    /// Teacher.id
    pub teacher_id: String,
    /// Teacher login handle
    pub login_id: String,
}

/// Verify credentials. Unknown login and wrong password fail identically,
/// and both run one hash verification.
pub fn authenticate(conn: &Connection, login_id: &str, password: &str) -> Result<AuthResult> {
    let teacher = db::get_teacher_by_login_id(conn, login_id)?;

    let stored = match &teacher {
        Some(teacher) => teacher.password_hash.as_str(),
        None => dummy_hash(),
    };
    let password_ok = verify_password(password, stored);

    match teacher {
        Some(teacher) if password_ok => {
            debug!(login = %login_id, "login accepted");
            Ok(AuthResult {
                teacher_id: teacher.id,
                login_id: teacher.login_id,
            })
        }
        _ => {
            warn!(login = %login_id, "login rejected");
            Err(LedgerError::invalid_credentials())
        }
    }
}

// ============================================================================
// SESSIONS
// ============================================================================

/// Server-issued proof of a login, passed explicitly to the write path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub teacher_id: String,
    pub login_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Key a session is stored under; the bearer token itself is not persisted
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub fn open_session(
    conn: &Connection,
    identity: &AuthResult,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<AuthSession> {
    let created_at = db::normalize_timestamp(now);
    let expires_at = created_at
        .checked_add_signed(ttl)
        .ok_or_else(|| LedgerError::Internal(format!("session expiry out of range (ttl {ttl})")))?;

    let session = AuthSession {
        token: uuid::Uuid::new_v4().simple().to_string(),
        teacher_id: identity.teacher_id.clone(),
        login_id: identity.login_id.clone(),
        created_at,
        expires_at,
    };

    db::insert_session(
        conn,
        &AuthSession {
            token: token_digest(&session.token),
            ..session.clone()
        },
    )?;
    Ok(session)
}

/// Look up a live session. Expired sessions are removed on the way.
pub fn resolve_session(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<AuthSession> {
    let removed = db::delete_expired_sessions(conn, now)?;
    if removed > 0 {
        debug!(removed, "expired sessions purged");
    }

    match db::get_session(conn, &token_digest(token))? {
        Some(stored) if !stored.is_expired(now) => Ok(AuthSession {
            token: token.to_string(),
            ..stored
        }),
        _ => Err(LedgerError::invalid_session()),
    }
}

pub fn revoke_session(conn: &Connection, token: &str) -> Result<()> {
    if db::delete_session(conn, &token_digest(token))? {
        Ok(())
    } else {
        Err(LedgerError::invalid_session())
    }
}
