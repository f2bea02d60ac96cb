//! The command line being explained

use crate::error::{AuditDogError, AuditDogResult};

/// A user command: program name plus its arguments, exactly as typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    arguments: Vec<String>,
}

impl Invocation {
    /// Build an invocation from raw argv (program first)
    pub fn from_args(args: &[String]) -> AuditDogResult<Self> {
        let (program, rest) = args.split_first().ok_or(AuditDogError::EmptyCommand)?;
        if program.trim().is_empty() {
            return Err(AuditDogError::EmptyCommand);
        }

        Ok(Self {
            program: program.clone(),
            arguments: rest.to_vec(),
        })
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments joined by single spaces, as sent to the API
    pub fn argument_string(&self) -> String {
        self.arguments.join(" ")
    }

    /// Full command line handed to the shell. Arguments are joined with
    /// single spaces, so quoting inside an argument is not preserved.
    pub fn command_line(&self) -> String {
        if self.arguments.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.argument_string())
        }
    }

    /// Normalized cache key for this invocation
    pub fn cache_key(&self) -> String {
        cache_key(&self.program, &self.argument_string())
    }
}

/// Collapse whitespace in `program arguments` into a stable key.
///
/// Only whitespace is normalized. Flag order and quoting still matter.
pub fn cache_key(program: &str, arguments: &str) -> String {
    program
        .split_whitespace()
        .chain(arguments.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
