//! Runtime configuration.
//!
//! Loaded from an optional TOML file; every field has a default so a missing
//! or partial file is fine. Command-line flags override file values.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:3000"
//!
//! [database]
//! path = "scoreboard.db"
//!
//! [auth]
//! session_ttl_hours = 12
//! require_session = false
//!
//! [seed]
//! teacher_login = "ENS001"
//! teacher_password = "password123"
//!
//! [activity]
//! feed_limit = 10
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aggregation::DEFAULT_FEED_LIMIT;
use crate::api::WritePolicy;
use crate::entities::NewTeacher;

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "scoreboard.toml";

/// Longest session a login may open (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub auth: AuthSection,
    pub seed: SeedSection,
    pub activity: ActivitySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scoreboard.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub session_ttl_hours: i64,
    pub require_session: bool,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_ttl_hours: 12,
            require_session: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedSection {
    pub teacher_login: String,
    pub teacher_password: String,
}

impl Default for SeedSection {
    fn default() -> Self {
        Self {
            teacher_login: "ENS001".to_string(),
            teacher_password: "password123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivitySection {
    pub feed_limit: usize,
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path must exist; otherwise fall back to `scoreboard.toml`
    /// in the working directory, then to defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if !(1..=DEFAULT_FEED_LIMIT).contains(&self.activity.feed_limit) {
            return Err(ConfigError::Invalid(format!(
                "activity.feed_limit must be between 1 and {DEFAULT_FEED_LIMIT}"
            )));
        }
        if self.seed.teacher_login.trim().is_empty() {
            return Err(ConfigError::Invalid("seed.teacher_login is empty".to_string()));
        }
        Ok(())
    }

    /// Clamped again here: sections are public and may be set without `parse`
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auth.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }

    /// Size of the public activity feed, never above ten
    pub fn feed_limit(&self) -> usize {
        self.activity.feed_limit.clamp(1, DEFAULT_FEED_LIMIT)
    }

    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy {
            require_session: self.auth.require_session,
        }
    }

    pub fn seed_teacher(&self) -> NewTeacher {
        NewTeacher::new(&self.seed.teacher_login, &self.seed.teacher_password)
    }
}
