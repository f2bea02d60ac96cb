//! Progress indicator shown while waiting on the API or the cache
//!
//! The animation runs on indicatif's steady-tick thread and only ever
//! touches the terminal. Dropping the indicator stops it, so an early
//! return or a cancelled future still restores the cursor.

use super::context::UiContext;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

const TICK_INTERVAL: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Animated spinner on stderr
    Terminal,
    /// Spinner state is tracked but nothing is drawn
    Hidden,
    /// One plain line per message
    Plain,
}

/// Cancellable spinner with guaranteed cleanup
pub struct ProgressIndicator {
    bar: Option<ProgressBar>,
    target: Target,
    term: Term,
}

impl ProgressIndicator {
    pub fn new(ctx: &UiContext) -> Self {
        let target = if ctx.use_fancy_output() {
            Target::Terminal
        } else {
            Target::Plain
        };
        Self {
            bar: None,
            target,
            term: Term::stderr(),
        }
    }

    /// Indicator that animates invisibly, for tests
    pub fn hidden() -> Self {
        Self {
            bar: None,
            target: Target::Hidden,
            term: Term::stderr(),
        }
    }

    /// Start rendering `message`. A running indicator is stopped first.
    pub fn start(&mut self, message: &str) {
        if self.bar.is_some() {
            debug!("Progress indicator already running, replacing it");
            self.stop();
        }

        match self.target {
            Target::Plain => eprintln!("{} {}", style("...").dim(), message),
            Target::Hidden => {
                let bar = ProgressBar::hidden();
                bar.set_message(message.to_string());
                self.bar = Some(bar);
            }
            Target::Terminal => {
                let bar = ProgressBar::new_spinner();
                let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
                bar.set_style(spinner_style);
                bar.set_message(message.to_string());
                bar.enable_steady_tick(TICK_INTERVAL);
                if let Err(e) = self.term.hide_cursor() {
                    debug!("Could not hide cursor: {}", e);
                }
                self.bar = Some(bar);
            }
        }
    }

    /// Stop, then start again with a new message
    pub fn restart(&mut self, message: &str) {
        self.stop();
        self.start(message);
    }

    /// Stop rendering and restore the cursor. No-op when idle.
    pub fn stop(&mut self) {
        let Some(bar) = self.bar.take() else {
            return;
        };

        bar.disable_steady_tick();
        bar.finish_and_clear();
        if self.target == Target::Terminal {
            if let Err(e) = self.term.show_cursor() {
                debug!("Could not restore cursor: {}", e);
            }
        }
    }

    /// Whether an animation is currently running
    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    /// Current message, if running
    pub fn message(&self) -> Option<String> {
        self.bar.as_ref().map(|bar| bar.message())
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
