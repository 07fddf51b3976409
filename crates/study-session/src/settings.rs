//! Application configuration
//!
//! Layered from an optional TOML/JSON/YAML file and `STUDY_BUDDY__*`
//! environment variables, e.g. `STUDY_BUDDY__ALERTS__COOLDOWN_SECONDS=3`.

use std::path::Path;
use std::time::Duration;

use alerting::AlertConfig;
use attention::AttentionConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Session control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Name stored with each session record
    pub username: String,
    /// Length of a pomodoro focus block (minutes)
    pub pomodoro_minutes: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            username: "pundra_student".to_string(),
            pomodoro_minutes: 25,
        }
    }
}

impl SessionSettings {
    pub fn pomodoro(&self) -> Duration {
        Duration::from_secs(self.pomodoro_minutes * 60)
    }
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub database_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://study_sessions.db".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub attention: AttentionConfig,
    pub alerts: AlertConfig,
    pub session: SessionSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Load defaults, then the file (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SessionError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix("STUDY_BUDDY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SessionError::Config(e.to_string()))?;

        config.attention.validate()?;
        config.alerts.validate()?;
        Ok(config)
    }

    /// Settings that have no effect when replaying a trace
    pub fn ignored_by_replay(&self) -> Vec<String> {
        let mut ignored = Vec::new();
        if let Some(path) = &self.attention.emotion_model_path {
            ignored.push(format!(
                "emotion_model_path '{}' (emotions come from the trace)",
                path
            ));
        }
        ignored
    }
}
