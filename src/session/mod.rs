//! Explain-then-execute session
//!
//! One session handles one invocation: cache check, API call, render,
//! confirmation, execution.

pub mod controller;
pub mod exec;

pub use controller::{Session, SessionOutcome};
pub use exec::{CommandRunner, ShellRunner};

/// Who is asking, and from where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub working_directory: String,
}

impl Identity {
    /// Resolve from `$USER`/`$USERNAME` and the current directory
    pub fn detect() -> Self {
        let username = ["USER", "USERNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let working_directory = std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();

        Self {
            username,
            working_directory,
        }
    }
}
