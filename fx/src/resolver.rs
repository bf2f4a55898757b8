//! Rate resolver: lazy one-time table load plus direct and one-hop lookup.

use std::sync::Arc;

use hopfx_common::{Currency, CurrencyPair};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::conversion::{Conversion, ResolvedRate};
use crate::error::{FxError, FxResult};
use crate::source::RateSource;
use crate::table::RateTable;

/// Lifecycle of a resolver's rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// No load attempted yet, or the last attempt failed.
    Uninitialized,
    /// A load is in flight; other callers wait on it.
    Initializing,
    /// Table published. Terminal.
    Ready,
}

/// Answers conversion queries against a lazily loaded rate table.
///
/// The table is built at most once per resolver. Concurrent first callers
/// wait on the same in-flight load and all observe the same table.
pub struct RateResolver {
    source: Arc<dyn RateSource>,
    table: OnceCell<RateTable>,
    state: Mutex<ResolverState>,
}

impl RateResolver {
    /// Create a resolver that will load from `source` on first use.
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            table: OnceCell::new(),
            state: Mutex::new(ResolverState::Uninitialized),
        }
    }

    /// Create a resolver using the source described by `config`.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.build_source())
    }

    /// Current lifecycle state.
    ///
    /// `Ready` comes from the published table; the mutex only distinguishes
    /// an idle resolver from one with a load in flight.
    pub fn state(&self) -> ResolverState {
        if self.table.initialized() {
            return ResolverState::Ready;
        }
        *self.state.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.table.initialized()
    }

    /// The loaded table, without triggering a load.
    pub fn table(&self) -> Option<&RateTable> {
        self.table.get()
    }

    /// Load the table if this is the first call, otherwise return it.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn ensure_loaded(&self) -> FxResult<&RateTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        self.table.get_or_try_init(|| self.load_table()).await
    }

    async fn load_table(&self) -> FxResult<RateTable> {
        let mut guard = LoadGuard::start(&self.state);
        info!("Loading rate table");

        let result = match self.source.load().await {
            Ok(entries) => RateTable::from_entries(entries, self.source.name()),
            Err(e) => Err(e),
        };

        match &result {
            Ok(table) => {
                guard.succeeded();
                info!(entries = table.len(), "Rate table loaded");
            }
            Err(e) => warn!(error = %e, "Failed to load rate table"),
        }

        result
    }

    /// Resolve the rate for a pair, directly or through one intermediate.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn resolve(&self, pair: &CurrencyPair) -> FxResult<ResolvedRate> {
        let table = self.ensure_loaded().await?;
        find_rate(table, pair)
    }

    /// Convert an amount, reporting a missing path as an error.
    pub async fn try_convert(
        &self,
        base: impl Into<Currency>,
        target: impl Into<Currency>,
        amount: Decimal,
    ) -> FxResult<Conversion> {
        let pair = CurrencyPair::new(base.into(), target.into());
        let resolved = self.resolve(&pair).await?;
        let conversion = Conversion::execute(resolved, amount)?;

        debug!(
            conversion_id = %conversion.id,
            pair = %pair,
            path = %conversion.path,
            output = %conversion.output.value,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Convert an amount, returning zero when no rate path exists or the
    /// result does not fit in a decimal.
    ///
    /// Failures never escape: they are logged with the offending pair and the
    /// result is `0`.
    pub async fn convert(
        &self,
        base: impl Into<Currency>,
        target: impl Into<Currency>,
        amount: Decimal,
    ) -> Decimal {
        let base = base.into();
        let target = target.into();
        match self.try_convert(base.clone(), target.clone(), amount).await {
            Ok(conversion) => conversion.output.value,
            Err(e) => {
                warn!(
                    base = %base,
                    target = %target,
                    code = e.error_code(),
                    error = %e,
                    "Conversion unavailable, returning zero"
                );
                Decimal::ZERO
            }
        }
    }
}

/// Marks a load as in flight and puts the resolver back to `Uninitialized`
/// if the load fails or its future is dropped before finishing.
struct LoadGuard<'a> {
    state: &'a Mutex<ResolverState>,
    succeeded: bool,
}

impl<'a> LoadGuard<'a> {
    fn start(state: &'a Mutex<ResolverState>) -> Self {
        *state.lock() = ResolverState::Initializing;
        Self {
            state,
            succeeded: false,
        }
    }

    fn succeeded(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.succeeded {
            *self.state.lock() = ResolverState::Uninitialized;
        }
    }
}

/// Look up `pair` in `table`: direct rate first, then the first intermediate
/// (in table order) with both legs listed.
pub fn find_rate(table: &RateTable, pair: &CurrencyPair) -> FxResult<ResolvedRate> {
    if let Some(rate) = table.rate(pair) {
        debug!(pair = %pair, %rate, "Direct rate");
        return Ok(ResolvedRate::direct(pair.clone(), rate));
    }

    for via in table.intermediates() {
        let Some(first) = table.rate_between(&pair.base, via) else {
            continue;
        };
        let Some(second) = table.rate_between(via, &pair.quote) else {
            continue;
        };

        debug!(pair = %pair, via = %via, %first, %second, "Composed rate");
        return ResolvedRate::composed(pair.clone(), via.clone(), first, second);
    }

    Err(FxError::RateNotFound(pair.clone()))
}
