//! Rate source trait and implementations.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::table::RateEntry;

/// Trait for anything that can supply the resolver's rate set.
///
/// `load` is called at most once per successful resolver initialization.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Produce the full set of directed rates.
    async fn load(&self) -> FxResult<Vec<RateEntry>>;
}

/// Built-in illustrative seed rates.
///
/// The set spans the DZD -> EUR -> USD -> DZD cycle plus a GBP leg so both
/// direct and one-hop lookups have something to find.
pub fn seed_rates() -> Vec<RateEntry> {
    vec![
        RateEntry::new("DZD", "EUR", Decimal::new(69, 4)),
        RateEntry::new("EUR", "USD", Decimal::new(106, 2)),
        RateEntry::new("USD", "DZD", Decimal::new(1370, 1)),
        RateEntry::new("EUR", "GBP", Decimal::new(85, 2)),
        RateEntry::new("GBP", "DZD", Decimal::new(1600, 1)),
    ]
}

/// Seed source that simulates a slow external fetch.
pub struct SeedRateSource {
    load_delay: Duration,
}

impl SeedRateSource {
    /// Create a seed source that waits `load_delay` before answering.
    pub fn new(load_delay: Duration) -> Self {
        Self { load_delay }
    }

    /// Seed source with no delay.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl RateSource for SeedRateSource {
    fn name(&self) -> &str {
        "SEED"
    }

    async fn load(&self) -> FxResult<Vec<RateEntry>> {
        if !self.load_delay.is_zero() {
            debug!(delay = ?self.load_delay, "Simulating rate fetch");
            tokio::time::sleep(self.load_delay).await;
        }
        Ok(seed_rates())
    }
}

/// Source backed by an explicitly supplied rate set.
pub struct StaticRateSource {
    name: String,
    entries: Vec<RateEntry>,
}

impl StaticRateSource {
    /// Create a new static source.
    pub fn new(name: impl Into<String>, entries: Vec<RateEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> FxResult<Vec<RateEntry>> {
        Ok(self.entries.clone())
    }
}

/// Source reading a JSON array of rate entries from disk.
///
/// ```json
/// [{"base": "EUR", "target": "USD", "rate": "1.06"}]
/// ```
pub struct FileRateSource {
    path: PathBuf,
    name: String,
}

impl FileRateSource {
    /// Create a new file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("FILE:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl RateSource for FileRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> FxResult<Vec<RateEntry>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FxError::Source(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let entries: Vec<RateEntry> = serde_json::from_str(&raw).map_err(|e| {
            FxError::Source(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), entries = entries.len(), "Read rates file");
        Ok(entries)
    }
}
