//! AuditDog - explain a shell command before running it
//!
//! CLI entry point: loads configuration, then runs one session.

use auditdog::audit::AuditLog;
use auditdog::cache::CacheStore;
use auditdog::cli::Cli;
use auditdog::client::ExplanationClient;
use auditdog::config::{Config, ConfigManager};
use auditdog::error::{AuditDogError, AuditDogResult};
use auditdog::session::Session;
use auditdog::signals;
use auditdog::ui::{self, UiContext};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use console::{style, Term};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The session future is dropped before exiting on a signal
    let finished = tokio::select! {
        result = run(cli) => Ok(result),
        interrupt = signals::shutdown_signal() => Err(interrupt),
    };

    match finished {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
        Err(interrupt) => {
            Term::stderr().show_cursor().ok();
            eprintln!();
            eprintln!("{}", style("Interrupted").yellow());
            std::process::exit(interrupt.exit_code());
        }
    }
}

async fn run(cli: Cli) -> AuditDogResult<ExitCode> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let mut config = manager.load().await?;
    ConfigManager::apply_env(&mut config);
    cli.apply_to(&mut config);

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbosity(&config) {
        0 => EnvFilter::new("auditdog=warn"),
        1 => EnvFilter::new("auditdog=info"),
        _ => EnvFilter::new("auditdog=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    debug!("Configuration: {}", manager.path().display());
    debug!("API endpoint: {}", config.api.explain_url());

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        generate(shell, &mut command, "auditdog", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = UiContext::detect();

    if cli.init_config {
        if manager.path().exists() {
            ui::step_info(
                &ctx,
                &format!("Configuration already exists at {}", manager.path().display()),
            );
        } else {
            manager.save(&Config::default()).await?;
            ui::step_ok(
                &ctx,
                &format!("Wrote default configuration to {}", manager.path().display()),
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.clear_cache {
        CacheStore::from_config(&config.cache).clear()?;
        ui::step_ok(&ctx, "Cache cleared");
        if cli.command.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    if cli.command.is_empty() {
        return Err(AuditDogError::EmptyCommand);
    }

    let cache = if config.cache.enabled {
        Some(CacheStore::from_config(&config.cache))
    } else {
        debug!("Explanation cache disabled");
        None
    };

    let mut session = Session::new(ExplanationClient::from_config(&config.api), cache, ctx)
        .with_audit(AuditLog::new(&config))
        .auto_execute(cli.yes);

    let outcome = session.run(&cli.command).await?;
    Ok(ExitCode::from(outcome.exit_code()))
}
