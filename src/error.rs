//! Error types for AuditDog
//!
//! Top-level operations return `AuditDogResult<T>`. Per-attempt failures of
//! the explanation client are `ExplainError`; cache storage failures are
//! `CacheError` and only reach the user from `--clear-cache`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for AuditDog operations
pub type AuditDogResult<T> = Result<T, AuditDogError>;

/// All errors that can surface from an AuditDog run
#[derive(Error, Debug)]
pub enum AuditDogError {
    // Explanation errors
    #[error("Could not explain command after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: ExplainError,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Invocation errors
    #[error("No command given")]
    EmptyCommand,

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Cache maintenance errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl AuditDogError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Exhausted { last, .. } => last.hint(),
            Self::ConfigInvalid { .. } => Some("Fix the file or run: auditdog --help"),
            Self::EmptyCommand => Some("Usage: auditdog <command> [args...]"),
            _ => None,
        }
    }
}

/// A single failed explanation attempt.
///
/// Every variant is retryable: the client does not tell a refusing
/// server apart from an unreachable one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {reason}")]
    Malformed { reason: String, body: String },

    #[error("server error: {0}")]
    Remote(String),
}

impl ExplainError {
    /// Create a malformed-response error keeping the raw body for diagnostics
    pub fn malformed(reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Check if the attempt may be retried. The client stops early on `false`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::Malformed { .. } | Self::Remote(_) => {
                true
            }
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport(_) | Self::Timeout(_) => {
                Some("Check that the API is running, or set AUDITDOG_API_URL / --api-url")
            }
            Self::Malformed { .. } => Some("Re-run with -vv to see the raw response"),
            Self::Remote(_) => None,
        }
    }
}

/// Cache storage failure. Recovered locally during a session.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
