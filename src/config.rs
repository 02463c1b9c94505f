//! Configuration management for messenger-session.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::avatar::AvatarConfig;
use crate::backend::{InMemoryBackend, TimeoutBackend};
use crate::cli::Args;
use crate::identity::Identity;
use crate::validation::{CredentialValidator, ValidationConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity backend configuration.
    pub backend: BackendSection,
    /// Avatar service configuration.
    pub avatar: AvatarConfig,
    /// Input validation limits.
    pub validation: ValidationSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Identity backend section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Hosted app id.
    pub app_id: String,
    /// Hosted region.
    pub region: String,
    /// App-wide auth key presented on every login.
    pub auth_key: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Accounts known to the backend at startup.
    pub users: Vec<Identity>,
    /// User with a live session at startup, found by restore.
    pub resume_session: Option<String>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            region: "us".to_string(),
            auth_key: String::new(),
            timeout_secs: 30,
            users: Vec::new(),
            resume_session: None,
        }
    }
}

/// Validation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub max_identifier_length: usize,
    pub max_display_name_length: usize,
    pub max_email_length: usize,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let defaults = ValidationConfig::default();
        Self {
            max_identifier_length: defaults.max_identifier_length,
            max_display_name_length: defaults.max_display_name_length,
            max_email_length: defaults.max_email_length,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(app_id) = std::env::var("MESSENGER_APP_ID") {
            self.backend.app_id = app_id;
        }

        if let Ok(region) = std::env::var("MESSENGER_REGION") {
            self.backend.region = region;
        }

        if let Ok(key) = std::env::var("MESSENGER_AUTH_KEY") {
            if !key.is_empty() {
                self.backend.auth_key = key;
            }
        }

        if let Ok(secs) = std::env::var("MESSENGER_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.backend.timeout_secs = secs;
            }
        }

        if let Ok(level) = std::env::var("MESSENGER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref key) = args.auth_key {
            self.backend.auth_key = key.clone();
        }

        if let Some(ref user) = args.resume {
            self.backend.resume_session = Some(user.clone());
        }

        if let Some(secs) = args.timeout_secs {
            self.backend.timeout_secs = secs;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Check values that cannot be represented by the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if let Some(ref user) = self.backend.resume_session {
            if !self.backend.users.iter().any(|u| &u.id == user) {
                return Err(ConfigError::UnknownResumeUser(user.clone()));
            }
        }

        Ok(())
    }

    /// Per-call backend timeout.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Build the in-memory identity backend, bounded by the configured timeout.
    pub fn to_backend(&self) -> TimeoutBackend<InMemoryBackend> {
        let mut backend = InMemoryBackend::new(self.backend.auth_key.clone());
        for user in &self.backend.users {
            backend = backend.with_user(user.clone());
        }
        if let Some(ref user) = self.backend.resume_session {
            backend = backend.with_session(user.clone());
        }
        TimeoutBackend::new(backend, self.backend_timeout())
    }

    /// Build the credential validator.
    pub fn to_validator(&self) -> CredentialValidator {
        CredentialValidator::new(ValidationConfig {
            max_identifier_length: self.validation.max_identifier_length,
            max_display_name_length: self.validation.max_display_name_length,
            max_email_length: self.validation.max_email_length,
        })
    }

    /// Avatar service settings.
    pub fn to_avatar_config(&self) -> AvatarConfig {
        self.avatar.clone()
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Backend timeout of zero.
    InvalidTimeout,
    /// Resume session names a user missing from `backend.users`.
    UnknownResumeUser(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidTimeout => write!(f, "backend timeout must be at least one second"),
            Self::UnknownResumeUser(user) => {
                write!(f, "resume session user '{}' is not in backend.users", user)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
