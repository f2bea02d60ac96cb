//! CLI argument definitions using clap derive

use clap::{value_parser, ArgAction, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

/// AuditDog - explain a shell command before running it
///
/// Sends the command to an analysis API, shows what it does and how risky
/// it is, then asks before running it.
#[derive(Parser, Debug)]
#[command(name = "auditdog")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  \
    auditdog rm -rf ./build\n  \
    auditdog -y git push --force\n  \
    auditdog --no-cache -- curl -fsSL https://example.com/install.sh\n  \
    auditdog --clear-cache\n\n\
    Arguments are joined with single spaces and run by `sh -c`, so shell\n\
    quoting is lost. Quote the whole command line when an argument\n\
    contains spaces:\n  \
    auditdog 'ls \"my file\"'")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "AUDITDOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analysis API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Total attempts before giving up
    #[arg(long, value_name = "N", value_parser = value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Run the command after a successful explanation without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Bypass the explanation cache
    #[arg(long)]
    pub no_cache: bool,

    /// Empty the explanation cache
    #[arg(long)]
    pub clear_cache: bool,

    /// Write the default configuration file and exit
    #[arg(long, conflicts_with = "command")]
    pub init_config: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL", conflicts_with = "command")]
    pub completions: Option<Shell>,

    /// Command to explain, with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
