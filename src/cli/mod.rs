//! Command-line interface

pub mod args;

pub use args::Cli;

use crate::config::Config;

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.url = url.clone();
        }
        if let Some(attempts) = self.max_attempts {
            config.api.max_attempts = attempts;
        }
        if let Some(secs) = self.timeout {
            config.api.timeout_secs = secs;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }

    /// Effective verbosity: `-v` count, raised to debug by `general.verbose`
    pub fn verbosity(&self, config: &Config) -> u8 {
        if config.general.verbose {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}
