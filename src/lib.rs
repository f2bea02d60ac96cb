//! AuditDog - explain a shell command before running it
//!
//! Asks an analysis API what a command does and how risky it is, caches
//! the answer on disk, and only runs the command once the user agrees.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod explanation;
pub mod invocation;
pub mod session;
pub mod signals;
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{AuditDogError, AuditDogResult};
