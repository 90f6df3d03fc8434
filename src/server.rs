// Team Scoreboard - HTTP surface
// REST API with Axum

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::aggregation;
use crate::api;
use crate::config::Config;
use crate::entities::{
    ScoreEntry, ScoreEntryWithTeam, TeacherSummary, TeamWithRecentChange, ACTION_PRESETS,
};
use crate::error::LedgerError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    /// A handler that panicked mid-request leaves the lock poisoned; SQLite
    /// rolled back its open transaction, so the connection is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("database lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A ledger error plus the generic message shown if it turns out internal
pub struct ApiError {
    error: LedgerError,
    fallback: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

impl ApiError {
    fn with(fallback: &'static str) -> impl Fn(LedgerError) -> ApiError {
        move |error| ApiError { error, fallback }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Auth(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.error.is_internal() {
            error!(error = %self.error, "{}", self.fallback);
            self.fallback.to_string()
        } else {
            self.error.to_string()
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Malformed JSON is a validation failure like any other
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, LedgerError> {
    payload
        .map(|Json(body)| body)
        .map_err(|_| LedgerError::Validation("Requête invalide".to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    message: &'static str,
    teacher: TeacherSummary,
    token: String,
    expires_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreEntryResponse {
    message: &'static str,
    score_entry: ScoreEntry,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// GET /api/teams - Teams with their points over the last 7 days
async fn get_teams(State(state): State<AppState>) -> ApiResult<Vec<TeamWithRecentChange>> {
    let on_err = ApiError::with("Erreur lors de la récupération des équipes");
    let conn = state.conn();

    aggregation::teams_with_weekly_change(&conn, Utc::now())
        .map(Json)
        .map_err(on_err)
}

/// GET /api/recent-activities - Newest ledger entries
async fn get_recent_activities(State(state): State<AppState>) -> ApiResult<Vec<ScoreEntryWithTeam>> {
    let on_err = ApiError::with("Erreur lors de la récupération des activités");
    let conn = state.conn();

    aggregation::recent_activity_feed(&conn, state.config.feed_limit())
        .map(Json)
        .map_err(on_err)
}

/// GET /api/actions - Suggested actions and their points
async fn get_actions() -> impl IntoResponse {
    Json(ACTION_PRESETS)
}

/// POST /api/login - Check credentials, open a session
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let on_err = ApiError::with("Erreur de connexion");
    let body = json_body(payload).map_err(&on_err)?;
    let conn = state.conn();

    let outcome = api::login(&conn, &body, Utc::now(), state.config.session_ttl()).map_err(on_err)?;

    Ok(Json(LoginResponse {
        message: "Connexion réussie",
        teacher: outcome.teacher,
        token: outcome.session.token,
        expires_at: outcome.session.expires_at,
    }))
}

/// POST /api/logout - Revoke the bearer session
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let on_err = ApiError::with("Erreur de déconnexion");
    let conn = state.conn();

    api::logout(&conn, bearer_token(&headers)).map_err(on_err)?;

    Ok(Json(MessageResponse {
        message: "Déconnexion réussie".to_string(),
    }))
}

/// POST /api/score-entries - Append to the ledger
async fn create_score_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ScoreEntryResponse> {
    let on_err = ApiError::with("Erreur lors de la saisie du score");
    let body = json_body(payload).map_err(&on_err)?;
    let now = Utc::now();

    let mut conn = state.conn();

    let score_entry = api::record_score_entry(
        &mut conn,
        bearer_token(&headers),
        &body,
        state.config.write_policy(),
        now,
    )
    .map_err(on_err)?;

    Ok(Json(ScoreEntryResponse {
        message: "Score bien saisi !",
        score_entry,
    }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/teams", get(get_teams))
        .route("/recent-activities", get(get_recent_activities))
        .route("/actions", get(get_actions))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/score-entries", post(create_score_entry))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
