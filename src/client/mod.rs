//! Explanation client
//!
//! Sends the command to the analysis API and retries every failure with
//! exponential backoff. Attempts are strictly sequential.

pub mod retry;
pub mod transport;

pub use retry::RetryPolicy;
pub use transport::{ExplainRequest, HttpTransport, Transport};

use crate::config::schema::ApiConfig;
use crate::error::{AuditDogError, AuditDogResult, ExplainError};
use crate::explanation::ExplanationRecord;
use crate::invocation::Invocation;
use std::time::Duration;
use tracing::{debug, info};

/// Hooks fired by the retry loop
pub trait RetryObserver: Send {
    /// An attempt is about to be sent (1-based)
    fn on_attempt(&mut self, _attempt: u32, _max_attempts: u32) {}

    /// `attempt` failed and the client will wait `delay` before the next one
    fn on_retry(&mut self, _attempt: u32, _error: &ExplainError, _delay: Duration) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {}

/// Retrying client for the explain endpoint
pub struct ExplanationClient<T: Transport = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl ExplanationClient<HttpTransport> {
    /// HTTP client for the configured API
    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(
            HttpTransport::new(api.explain_url(), api.timeout()),
            RetryPolicy::from_config(api),
        )
    }
}

impl<T: Transport> ExplanationClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Explain `invocation`, retrying until a valid record arrives or the
    /// policy runs out of attempts.
    pub async fn explain(
        &self,
        invocation: &Invocation,
        username: &str,
        working_directory: &str,
        observer: &mut dyn RetryObserver,
    ) -> AuditDogResult<ExplanationRecord> {
        let max_attempts = self.policy.attempts();
        let mut last = ExplainError::Transport("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            observer.on_attempt(attempt, max_attempts);

            let request = ExplainRequest::new(invocation, username, working_directory);
            match self.attempt(&request).await {
                Ok(record) => {
                    info!(
                        "Explained '{}' on attempt {}/{}",
                        invocation.command_line(),
                        attempt,
                        max_attempts
                    );
                    return Ok(record);
                }
                Err(e) => {
                    debug!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    if let ExplainError::Malformed { body, .. } = &e {
                        debug!("Rejected response body: {}", body);
                    }

                    if !e.is_retryable() {
                        return Err(AuditDogError::Exhausted { attempts: attempt, last: e });
                    }

                    if attempt < max_attempts {
                        let delay = self.policy.delay_for(attempt - 1);
                        observer.on_retry(attempt, &e, delay);
                        debug!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                    last = e;
                }
            }
        }

        Err(AuditDogError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }

    async fn attempt(&self, request: &ExplainRequest) -> Result<ExplanationRecord, ExplainError> {
        if let Ok(payload) = serde_json::to_string_pretty(request) {
            debug!("Request payload: {}", payload);
        }

        let timeout = self.policy.timeout_per_attempt;
        let body = tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| ExplainError::Timeout(timeout))??;

        debug!("Response body: {}", body);
        ExplanationRecord::from_response(&body)
    }
}
