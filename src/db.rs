use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::{hash_password, AuthSession};
use crate::entities::{NewScoreEntry, NewTeacher, NewTeam, ScoreEntry, ScoreEntryWithTeam, Teacher, Team};
use crate::error::{LedgerError, Result};

/// How long a writer waits for the SQLite lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ledger database file
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // per-connection, so every handle needs it, not just the one that ran setup
    conn.pragma_update(None, "foreign_keys", "ON")?;
    debug!(path = %path.display(), "opened ledger database");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Roster tables (written once, at seed time)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers (
            id TEXT PRIMARY KEY NOT NULL,
            login_id TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL
        )",
        [],
    )?;

    // seq keeps insertion order for display
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teams (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            members TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            total_score INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // ==========================================================================
    // Ledger (append-only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS score_entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            team_id TEXT NOT NULL REFERENCES teams(id),
            teacher_id TEXT NOT NULL REFERENCES teachers(id),
            action TEXT NOT NULL,
            points INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            token_digest TEXT PRIMARY KEY NOT NULL,
            teacher_id TEXT NOT NULL REFERENCES teachers(id),
            login_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_team_time ON score_entries(team_id, timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_time ON score_entries(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Fixed-width RFC 3339 (microseconds, `Z`), so text order is time order
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drop precision the store cannot keep
pub fn normalize_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

fn decode_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const TEAM_COLUMNS: &str = "id, name, members, icon, color, total_score";
const ENTRY_COLUMNS: &str = "id, team_id, teacher_id, action, points, timestamp";

fn team_from_row(row: &Row, offset: usize) -> rusqlite::Result<Team> {
    let members_json: String = row.get(offset + 2)?;
    let members = serde_json::from_str(&members_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(offset + 2, Type::Text, Box::new(e))
    })?;

    Ok(Team {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        members,
        icon: row.get(offset + 3)?,
        color: row.get(offset + 4)?,
        total_score: row.get(offset + 5)?,
    })
}

fn entry_from_row(row: &Row, offset: usize) -> rusqlite::Result<ScoreEntry> {
    let timestamp_str: String = row.get(offset + 5)?;

    Ok(ScoreEntry {
        id: row.get(offset)?,
        team_id: row.get(offset + 1)?,
        teacher_id: row.get(offset + 2)?,
        action: row.get(offset + 3)?,
        points: row.get(offset + 4)?,
        timestamp: decode_timestamp(offset + 5, &timestamp_str)?,
    })
}

fn teacher_from_row(row: &Row) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        login_id: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

// ============================================================================
// SEEDING
// ============================================================================

/// Insert the roster and seed teacher, unless any team already exists.
/// Returns whether anything was written.
pub fn initialize_if_empty(
    conn: &mut Connection,
    seed_teams: &[NewTeam],
    seed_teacher: &NewTeacher,
) -> Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))?;
    if existing > 0 {
        debug!(teams = existing, "roster already present, skipping seed");
        return Ok(false);
    }

    for new_team in seed_teams {
        let team = new_team.clone().into_team();
        let members_json = serde_json::to_string(&team.members)?;

        tx.execute(
            "INSERT INTO teams (id, name, members, icon, color, total_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![team.id, team.name, members_json, team.icon, team.color, team.total_score],
        )?;
    }

    tx.execute(
        "INSERT INTO teachers (id, login_id, password_hash) VALUES (?1, ?2, ?3)",
        params![
            uuid::Uuid::new_v4().to_string(),
            seed_teacher.login_id,
            hash_password(&seed_teacher.password)?,
        ],
    )?;

    tx.commit()?;

    info!(
        teams = seed_teams.len(),
        teacher = %seed_teacher.login_id,
        "seeded roster"
    );
    Ok(true)
}

// ============================================================================
// TEACHERS
// ============================================================================

pub fn get_teacher(conn: &Connection, id: &str) -> Result<Option<Teacher>> {
    let teacher = conn
        .query_row(
            "SELECT id, login_id, password_hash FROM teachers WHERE id = ?1",
            [id],
            teacher_from_row,
        )
        .optional()?;

    Ok(teacher)
}

pub fn get_teacher_by_login_id(conn: &Connection, login_id: &str) -> Result<Option<Teacher>> {
    let teacher = conn
        .query_row(
            "SELECT id, login_id, password_hash FROM teachers WHERE login_id = ?1",
            [login_id],
            teacher_from_row,
        )
        .optional()?;

    Ok(teacher)
}

// ============================================================================
// TEAMS
// ============================================================================

pub fn get_team(conn: &Connection, id: &str) -> Result<Option<Team>> {
    let team = conn
        .query_row(
            &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
            [id],
            |row| team_from_row(row, 0),
        )
        .optional()?;

    Ok(team)
}

/// All teams, in insertion order
pub fn list_teams(conn: &Connection) -> Result<Vec<Team>> {
    let mut stmt = conn.prepare(&format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY seq"))?;

    let teams = stmt
        .query_map([], |row| team_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(teams)
}

// ============================================================================
// LEDGER
// ============================================================================

/// Append an entry and bump the team total in one IMMEDIATE transaction.
///
/// The write lock is taken before the current total is read, so concurrent
/// appends (even from other connections) serialize and no increment is lost.
/// Any failure rolls back both writes.
pub fn append_score_entry(
    conn: &mut Connection,
    new_entry: NewScoreEntry,
    timestamp: DateTime<Utc>,
) -> Result<ScoreEntry> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current_total: i64 = tx
        .query_row(
            "SELECT total_score FROM teams WHERE id = ?1",
            [&new_entry.team_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(LedgerError::team_not_found)?;

    let teacher_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM teachers WHERE id = ?1)",
        [&new_entry.teacher_id],
        |row| row.get(0),
    )?;
    if !teacher_exists {
        return Err(LedgerError::teacher_not_found());
    }

    let new_total = current_total.checked_add(new_entry.points).ok_or_else(|| {
        LedgerError::Validation("Le score de l'équipe dépasserait la limite autorisée".to_string())
    })?;

    let entry = new_entry.into_entry(normalize_timestamp(timestamp));

    tx.execute(
        &format!("INSERT INTO score_entries ({ENTRY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            entry.id,
            entry.team_id,
            entry.teacher_id,
            entry.action,
            entry.points,
            encode_timestamp(entry.timestamp),
        ],
    )?;

    tx.execute(
        "UPDATE teams SET total_score = ?1 WHERE id = ?2",
        params![new_total, entry.team_id],
    )?;

    tx.commit()?;

    info!(
        entry = %entry.id,
        team = %entry.team_id,
        points = entry.points,
        total = new_total,
        "score entry appended"
    );
    Ok(entry)
}

/// Newest entries joined with their team. Ties on timestamp go to the later
/// insert.
pub fn list_recent_entries(conn: &Connection, limit: usize) -> Result<Vec<ScoreEntryWithTeam>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.team_id, e.teacher_id, e.action, e.points, e.timestamp,
                t.id, t.name, t.members, t.icon, t.color, t.total_score
         FROM score_entries e
         INNER JOIN teams t ON t.id = e.team_id
         ORDER BY e.timestamp DESC, e.seq DESC
         LIMIT ?1",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let entries = stmt
        .query_map([limit], |row| {
            Ok(ScoreEntryWithTeam {
                entry: entry_from_row(row, 0)?,
                team: team_from_row(row, 6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

/// Entries for one team with `timestamp >= cutoff`, newest first
pub fn list_entries_for_team_since(
    conn: &Connection,
    team_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ScoreEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM score_entries
         WHERE team_id = ?1 AND timestamp >= ?2
         ORDER BY timestamp DESC, seq DESC"
    ))?;

    let entries = stmt
        .query_map(params![team_id, encode_timestamp(cutoff)], |row| {
            entry_from_row(row, 0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

/// Sum of every ledger entry for a team, recomputed from scratch
pub fn ledger_sum_for_team(conn: &Connection, team_id: &str) -> Result<i64> {
    let sum: i64 = conn.query_row(
        "SELECT COALESCE(SUM(points), 0) FROM score_entries WHERE team_id = ?1",
        [team_id],
        |row| row.get(0),
    )?;

    Ok(sum)
}

pub fn count_entries(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM score_entries", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// SESSIONS
// ============================================================================

// Rows are keyed by a digest of the bearer token (see auth.rs); the raw
// token never reaches the database.

pub fn insert_session(conn: &Connection, session: &AuthSession) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_digest, teacher_id, login_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.token,
            session.teacher_id,
            session.login_id,
            encode_timestamp(session.created_at),
            encode_timestamp(session.expires_at),
        ],
    )?;

    Ok(())
}

pub fn get_session(conn: &Connection, token_digest: &str) -> Result<Option<AuthSession>> {
    let session = conn
        .query_row(
            "SELECT token_digest, teacher_id, login_id, created_at, expires_at
             FROM sessions WHERE token_digest = ?1",
            [token_digest],
            |row| {
                let created_at: String = row.get(3)?;
                let expires_at: String = row.get(4)?;

                Ok(AuthSession {
                    token: row.get(0)?,
                    teacher_id: row.get(1)?,
                    login_id: row.get(2)?,
                    created_at: decode_timestamp(3, &created_at)?,
                    expires_at: decode_timestamp(4, &expires_at)?,
                })
            },
        )
        .optional()?;

    Ok(session)
}

/// Returns whether a session was removed
pub fn delete_session(conn: &Connection, token_digest: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM sessions WHERE token_digest = ?1", [token_digest])?;
    Ok(removed > 0)
}

pub fn delete_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        [encode_timestamp(now)],
    )?;
    Ok(removed)
}
