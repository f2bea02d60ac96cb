//! Verbatim command execution
//!
//! The command line is handed to `sh -c` exactly as the user typed it.
//! Nothing is escaped or filtered: running it is the whole point. Signals
//! that reach AuditDog meanwhile are left to the child.

use crate::error::{AuditDogError, AuditDogResult};
use crate::signals::ForegroundGuard;
use async_trait::async_trait;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::debug;

/// Runs a confirmed command line and returns its exit code
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command_line: &str) -> AuditDogResult<i32>;
}

/// Runs through the system shell, inheriting env, stdio and cwd
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> AuditDogResult<i32> {
        debug!("Executing via {} -c: {}", self.shell, command_line);

        // Ctrl-C belongs to the child until it exits
        let _foreground = ForegroundGuard::acquire();
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .status()
            .await
            .map_err(|e| AuditDogError::command_failed(command_line, e))?;

        Ok(exit_code(status))
    }
}

/// Exit code, using the shell convention 128+N for signal deaths
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
