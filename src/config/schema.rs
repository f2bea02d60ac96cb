//! Configuration schema for AuditDog
//!
//! Configuration is stored at `~/.config/auditdog/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Analysis API settings
    pub api: ApiConfig,

    /// Explanation cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Print request/response payloads and retry diagnostics
    pub verbose: bool,

    /// Append decisions to the audit log
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            audit_log: true,
        }
    }
}

/// Analysis API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; the explain endpoint is `<url>/commands/explain`
    pub url: String,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts before giving up
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after every retry
    pub backoff_multiplier: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 15,
            max_attempts: 5,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ApiConfig {
    /// Full URL of the explain endpoint
    pub fn explain_url(&self) -> String {
        format!("{}/commands/explain", self.url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Explanation cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Use the cache at all
    pub enabled: bool,

    /// Cache document location (defaults to the user cache dir)
    pub path: Option<PathBuf>,

    /// Maximum number of stored explanations
    pub max_entries: usize,

    /// Whole-store expiry in seconds, measured from the last write or hit
    pub expiry_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_entries: 100,
            expiry_secs: 24 * 60 * 60,
        }
    }
}
