//! Audit trail of explained and executed commands
//!
//! Appends one JSON object per line to `<state_dir>/auditdog/audit.log`.
//! Write failures are logged and dropped.

use crate::config::{schema::Config, ConfigManager};
use chrono::Utc;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// What happened to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Explained,
    ExplainFailed,
    Executed,
    Skipped,
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Explained => "command.explained",
            Self::ExplainFailed => "command.explain_failed",
            Self::Executed => "command.executed",
            Self::Skipped => "command.skipped",
        }
    }
}

/// Append-only JSON lines log
#[derive(Debug, Clone)]
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Create a new audit logger from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    /// Logger that drops every event
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    /// Record `event` for `command` with extra fields merged into the entry
    pub async fn record(&self, event: AuditEvent, command: &str, data: Value) {
        if !self.enabled {
            return;
        }

        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event.name(),
            "command": command,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
