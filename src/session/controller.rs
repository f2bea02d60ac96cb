//! Session state machine
//!
//! ```text
//! CacheCheck ─hit──────────────► Render ─► ConfirmExecute ─► Execute ─► Done
//!     │                            ▲              │
//!     └─miss─► ClientCall ─ok──────┘              └─no─► Skip ─► Done
//!                  │
//!                  └─exhausted─► Exhausted (offer run anyway) ─► Done
//! ```

use super::exec::{CommandRunner, ShellRunner};
use super::Identity;
use crate::audit::{AuditEvent, AuditLog};
use crate::cache::{CacheStore, FileBackend, StoreBackend};
use crate::client::{ExplanationClient, HttpTransport, RetryObserver, Transport};
use crate::error::{AuditDogError, AuditDogResult, ExplainError};
use crate::explanation::ExplanationRecord;
use crate::invocation::Invocation;
use crate::ui::{self, ProgressIndicator, Prompter, TerminalPrompter, UiContext};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

enum State {
    CacheCheck,
    ClientCall,
    Render {
        record: ExplanationRecord,
        from_cache: bool,
    },
    ConfirmExecute,
    Execute,
    Skip,
    Exhausted(AuditDogError),
    Done,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            Self::CacheCheck => "cache-check",
            Self::ClientCall => "client-call",
            Self::Render { .. } => "render",
            Self::ConfirmExecute => "confirm-execute",
            Self::Execute => "execute",
            Self::Skip => "skip",
            Self::Exhausted(_) => "exhausted",
            Self::Done => "done",
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutcome {
    /// The explanation shown, if any
    pub record: Option<ExplanationRecord>,
    /// Whether the explanation came from the cache
    pub from_cache: bool,
    /// Whether the command was handed to the shell
    pub executed: bool,
    /// Exit code of the executed command
    pub command_exit_code: Option<i32>,
}

impl SessionOutcome {
    pub fn explained(&self) -> bool {
        self.record.is_some()
    }

    /// Process exit status: 0 when explained, whatever the user chose
    pub fn exit_code(&self) -> u8 {
        if self.explained() {
            0
        } else {
            1
        }
    }
}

/// Drives one invocation through cache, client, render and execution
pub struct Session<T: Transport = HttpTransport, B: StoreBackend = FileBackend> {
    client: ExplanationClient<T>,
    cache: Option<CacheStore<B>>,
    prompter: Box<dyn Prompter>,
    runner: Box<dyn CommandRunner>,
    audit: AuditLog,
    identity: Identity,
    ctx: UiContext,
    auto_execute: bool,
}

impl<T: Transport, B: StoreBackend> Session<T, B> {
    /// Session with terminal prompts, the system shell and no audit log.
    /// Pass `None` as cache to bypass caching entirely.
    pub fn new(client: ExplanationClient<T>, cache: Option<CacheStore<B>>, ctx: UiContext) -> Self {
        Self {
            client,
            cache,
            prompter: Box::new(TerminalPrompter::new(ctx)),
            runner: Box::new(ShellRunner::new()),
            audit: AuditLog::disabled(),
            identity: Identity::detect(),
            ctx,
            auto_execute: false,
        }
    }

    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Execute after a successful explanation without asking
    pub fn auto_execute(mut self, yes: bool) -> Self {
        self.auto_execute = yes;
        self
    }

    pub fn cache(&self) -> Option<&CacheStore<B>> {
        self.cache.as_ref()
    }

    pub fn cache_mut(&mut self) -> Option<&mut CacheStore<B>> {
        self.cache.as_mut()
    }

    /// Run the whole session for raw argv (program first)
    pub async fn run(&mut self, args: &[String]) -> AuditDogResult<SessionOutcome> {
        let invocation = Invocation::from_args(args)?;
        let key = invocation.cache_key();
        let command_line = invocation.command_line();
        debug!(
            "Explaining '{}' as {} in {}",
            key, self.identity.username, self.identity.working_directory
        );

        let mut indicator = ProgressIndicator::new(&self.ctx);
        let mut outcome = SessionOutcome::default();
        let mut state = State::CacheCheck;

        loop {
            debug!("Session state: {}", state.name());
            state = match state {
                State::CacheCheck => match self.cache.as_mut().and_then(|c| c.lookup(&key)) {
                    Some(record) => {
                        info!("Serving '{}' from cache", key);
                        State::Render {
                            record,
                            from_cache: true,
                        }
                    }
                    None => State::ClientCall,
                },

                State::ClientCall => {
                    let result = {
                        let mut observer = IndicatorObserver {
                            indicator: &mut indicator,
                            ctx: self.ctx,
                        };
                        self.client
                            .explain(
                                &invocation,
                                &self.identity.username,
                                &self.identity.working_directory,
                                &mut observer,
                            )
                            .await
                    };

                    match result {
                        Ok(record) => {
                            if let Some(cache) = self.cache.as_mut() {
                                indicator.restart("Saving explanation...");
                                cache.insert(&key, &record);
                            }
                            indicator.stop();
                            self.audit
                                .record(
                                    AuditEvent::Explained,
                                    &command_line,
                                    json!({"risk_level": record.risk_level.as_str()}),
                                )
                                .await;
                            State::Render {
                                record,
                                from_cache: false,
                            }
                        }
                        Err(e) => {
                            indicator.stop();
                            State::Exhausted(e)
                        }
                    }
                }

                State::Render { record, from_cache } => {
                    ui::explanation(&record, from_cache);
                    outcome.from_cache = from_cache;
                    outcome.record = Some(record);
                    State::ConfirmExecute
                }

                State::ConfirmExecute => {
                    let run = if self.auto_execute {
                        ui::step_info(&self.ctx, "Running without confirmation (--yes)");
                        true
                    } else {
                        self.prompter.confirm("Run this command?", true).await?
                    };

                    if run {
                        State::Execute
                    } else {
                        State::Skip
                    }
                }

                State::Execute => {
                    outcome.command_exit_code = self.execute(&command_line).await;
                    outcome.executed = true;
                    State::Done
                }

                State::Skip => {
                    self.skip(&command_line).await;
                    State::Done
                }

                State::Exhausted(err) => {
                    ui::step_error_detail(&self.ctx, "Could not explain command", &err.to_string());
                    if let Some(hint) = err.hint() {
                        ui::remark(&self.ctx, hint);
                    }
                    self.audit
                        .record(
                            AuditEvent::ExplainFailed,
                            &command_line,
                            json!({"error": err.to_string()}),
                        )
                        .await;

                    if self.prompter.confirm("Run the command anyway?", false).await? {
                        outcome.command_exit_code = self.execute(&command_line).await;
                        outcome.executed = true;
                    } else {
                        self.skip(&command_line).await;
                    }
                    State::Done
                }

                State::Done => break,
            };
        }

        Ok(outcome)
    }

    /// Hand the command line to the shell and report how it went
    async fn execute(&self, command_line: &str) -> Option<i32> {
        match self.runner.run(command_line).await {
            Ok(code) => {
                if code != 0 {
                    ui::step_warn(&self.ctx, &format!("Command exited with code {}", code));
                }
                self.audit
                    .record(AuditEvent::Executed, command_line, json!({"exit_code": code}))
                    .await;
                Some(code)
            }
            Err(e) => {
                ui::step_error_detail(&self.ctx, "Could not run command", &e.to_string());
                None
            }
        }
    }

    async fn skip(&self, command_line: &str) {
        ui::step_info(&self.ctx, "Skipped, command not run");
        self.audit
            .record(AuditEvent::Skipped, command_line, json!({}))
            .await;
    }
}

/// Keeps the spinner text in step with the retry loop
struct IndicatorObserver<'a> {
    indicator: &'a mut ProgressIndicator,
    ctx: UiContext,
}

impl RetryObserver for IndicatorObserver<'_> {
    fn on_attempt(&mut self, attempt: u32, max_attempts: u32) {
        let message = if attempt == 1 {
            "Asking for an explanation...".to_string()
        } else {
            format!(
                "Asking for an explanation (attempt {}/{})...",
                attempt, max_attempts
            )
        };
        self.indicator.restart(&message);
    }

    fn on_retry(&mut self, attempt: u32, error: &ExplainError, delay: Duration) {
        self.indicator.stop();
        ui::step_warn(&self.ctx, &format!("Attempt {} failed: {}", attempt, error));
        self.indicator
            .start(&format!("Retrying in {:.1}s...", delay.as_secs_f64()));
    }
}
