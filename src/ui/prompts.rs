//! Yes/no prompts with a plain line fallback
//!
//! An empty answer and a closed stdin both resolve to the default. Only
//! an explicit answer overrides it.

use super::context::UiContext;
use crate::error::{AuditDogError, AuditDogResult};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Asks the user a yes/no question
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn confirm(&self, message: &str, default: bool) -> AuditDogResult<bool>;
}

/// Prompter bound to the real terminal
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    ctx: UiContext,
}

impl TerminalPrompter {
    pub fn new(ctx: UiContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str, default: bool) -> AuditDogResult<bool> {
        let message = message.to_string();

        if self.ctx.is_interactive() {
            let result = tokio::task::spawn_blocking(move || {
                cliclack::confirm(&message).initial_value(default).interact()
            })
            .await
            .map_err(|e| AuditDogError::Internal(format!("Prompt task failed: {}", e)))?;

            return match result {
                Ok(answer) => Ok(answer),
                // Esc / Ctrl-C inside the prompt is an explicit "no"
                Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(default),
                Err(e) => Err(AuditDogError::User(format!("Prompt failed: {}", e))),
            };
        }

        tokio::task::spawn_blocking(move || confirm_line(&message, default))
            .await
            .map_err(|e| AuditDogError::Internal(format!("Prompt task failed: {}", e)))
    }
}

/// Plain `[Y/n]` prompt on stdout, answer read from stdin
fn confirm_line(message: &str, default: bool) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    print!("  {} {} ", message, hint);
    if io::stdout().flush().is_err() {
        return default;
    }

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) => {
            // Keep the next output off the prompt line
            println!();
            debug!("No answer on stdin, using default ({})", default);
            default
        }
        Ok(_) => parse_answer(&input, default),
        Err(e) => {
            println!();
            debug!("Could not read answer ({}), using default", e);
            default
        }
    }
}

/// Interpret a typed answer. Anything but an explicit yes/no is the default.
pub fn parse_answer(input: &str, default: bool) -> bool {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
