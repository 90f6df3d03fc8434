// 📐 Request validation - shape checks run before the store is touched
//
// Every write body is checked against a fixed schema. All field errors are
// collected, but only the first one is surfaced to the client.

use serde_json::Value;
use tracing::debug;

use crate::entities::NewScoreEntry;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Credentials submitted to the login endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

const INVALID_BODY: &str = "Requête invalide";

/// Collects field errors for one request body
struct Checker<'a> {
    body: &'a serde_json::Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Checker<'a> {
    fn new(body: &'a Value) -> Result<Self> {
        let body = body
            .as_object()
            .ok_or_else(|| LedgerError::Validation(INVALID_BODY.to_string()))?;

        Ok(Checker {
            body,
            errors: Vec::new(),
        })
    }

    fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// A string with at least one non-whitespace character
    fn required_string(&mut self, field: &str, message: &str) -> String {
        match self.body.get(field).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                self.fail(field, message);
                String::new()
            }
        }
    }

    /// Any non-empty string, whitespace included
    fn non_empty_string(&mut self, field: &str, message: &str) -> String {
        match self.body.get(field).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                self.fail(field, message);
                String::new()
            }
        }
    }

    fn required_integer(&mut self, field: &str, message: &str) -> i64 {
        match self.body.get(field).and_then(Value::as_i64) {
            Some(n) => n,
            None => {
                self.fail(field, message);
                0
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T> {
        let count = self.errors.len();
        match self.errors.into_iter().next() {
            None => Ok(value),
            Some(first) => {
                debug!(error = %first, count, "request body rejected");
                Err(LedgerError::Validation(first.message))
            }
        }
    }
}

pub fn validate_login(body: &Value) -> Result<LoginRequest> {
    let mut check = Checker::new(body)?;

    // credentials are compared as typed, so blank-looking values go to the gateway
    let login_id = check.non_empty_string("teacherId", "L'identifiant est requis");
    let password = check.non_empty_string("password", "Le mot de passe est requis");

    check.finish(LoginRequest { login_id, password })
}

pub fn validate_score_entry(body: &Value) -> Result<NewScoreEntry> {
    let mut check = Checker::new(body)?;

    let team_id = check.required_string("teamId", "L'équipe est requise");
    let teacher_id = check.required_string("teacherId", "L'enseignant est requis");
    let action = check.required_string("action", "L'action est requise");
    let points = check.required_integer("points", "Les points doivent être un nombre entier");

    check.finish(NewScoreEntry {
        team_id,
        teacher_id,
        action: action.trim().to_string(),
        points,
    })
}
