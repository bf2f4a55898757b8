//! Resolver configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::source::{FileRateSource, RateSource, SeedRateSource};

/// Longest simulated fetch we accept.
const MAX_LOAD_DELAY: Duration = Duration::from_secs(60);

/// Configuration for building a [`RateResolver`](crate::RateResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Simulated fetch latency for the seed source.
    pub load_delay: Duration,
    /// JSON rates file; the built-in seed is used when unset.
    pub rates_file: Option<PathBuf>,
    /// Log level.
    pub log_level: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_secs(1),
            rates_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(delay) = lookup("HOPFX_LOAD_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.load_delay = Duration::from_millis(ms);
            }
        }

        if let Some(path) = lookup("HOPFX_RATES_FILE") {
            config.rates_file = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.load_delay > MAX_LOAD_DELAY {
            return Err(format!(
                "Load delay {}ms exceeds maximum {}ms",
                self.load_delay.as_millis(),
                MAX_LOAD_DELAY.as_millis()
            ));
        }

        if let Some(path) = &self.rates_file {
            if path.as_os_str().is_empty() {
                return Err("Rates file path cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Build the rate source this configuration describes.
    pub fn build_source(&self) -> Arc<dyn RateSource> {
        match &self.rates_file {
            Some(path) => Arc::new(FileRateSource::new(path.clone())),
            None => Arc::new(SeedRateSource::new(self.load_delay)),
        }
    }
}
