//! Wire payload and HTTP transport for the explain endpoint

use crate::error::ExplainError;
use crate::invocation::Invocation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Body of `POST /commands/explain`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainRequest {
    pub command: String,
    pub arguments: String,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub working_directory: String,
}

impl ExplainRequest {
    /// Build a payload stamped with the current time
    pub fn new(invocation: &Invocation, username: &str, working_directory: &str) -> Self {
        Self {
            command: invocation.program().to_string(),
            arguments: invocation.argument_string(),
            timestamp: Utc::now(),
            username: username.to_string(),
            working_directory: working_directory.to_string(),
        }
    }
}

/// Delivers one explain request and returns the raw response body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ExplainRequest) -> Result<String, ExplainError>;
}

/// Blocking `ureq` agent driven from the blocking pool
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: Agent,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        // Status codes are not special-cased; the body decides success
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ExplainRequest) -> Result<String, ExplainError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| ExplainError::Transport(format!("encoding request: {}", e)))?;
        let agent = self.agent.clone();
        let url = self.url.clone();
        let timeout = self.timeout;

        let result = tokio::task::spawn_blocking(move || {
            let mut response = agent
                .post(&url)
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .send(payload.as_str())?;

            let status = response.status();
            let body = response.body_mut().read_to_string()?;
            Ok::<_, ureq::Error>((status, body))
        })
        .await
        .map_err(|e| ExplainError::Transport(format!("request task failed: {}", e)))?;

        match result {
            Ok((status, body)) => {
                debug!("HTTP {} from {}", status, self.url);
                Ok(body)
            }
            Err(ureq::Error::Timeout(_)) => Err(ExplainError::Timeout(timeout)),
            Err(e) => Err(ExplainError::Transport(e.to_string())),
        }
    }
}
