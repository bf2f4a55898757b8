//! Immutable table of directed exchange rates.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use hopfx_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// One directed rate: `amount_in_target = amount_in_base * rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub base: Currency,
    pub target: Currency,
    pub rate: Decimal,
}

impl RateEntry {
    /// Create a new rate entry.
    pub fn new(base: impl Into<Currency>, target: impl Into<Currency>, rate: Decimal) -> Self {
        Self {
            base: base.into(),
            target: target.into(),
            rate,
        }
    }

    /// The pair this entry quotes.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.target.clone())
    }
}

/// Rate table keyed by ordered currency pair.
///
/// Entries keep their insertion order, which is also the order in which
/// intermediate currencies are tried during one-hop composition.
#[derive(Debug, Clone)]
pub struct RateTable {
    entries: Vec<RateEntry>,
    index: HashMap<CurrencyPair, Decimal>,
    intermediates: Vec<Currency>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl RateTable {
    /// Build a table from entries, rejecting non-positive and duplicate rates.
    pub fn from_entries(
        entries: impl IntoIterator<Item = RateEntry>,
        source: impl Into<String>,
    ) -> FxResult<Self> {
        let mut kept = Vec::new();
        let mut index = HashMap::new();
        let mut intermediates = Vec::new();
        let mut seen_bases = HashSet::new();

        for entry in entries {
            let pair = entry.pair();
            if entry.rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate {
                    pair,
                    rate: entry.rate,
                });
            }
            if index.insert(pair.clone(), entry.rate).is_some() {
                return Err(FxError::DuplicateRate(pair));
            }
            if seen_bases.insert(entry.base.clone()) {
                intermediates.push(entry.base.clone());
            }
            kept.push(entry);
        }

        Ok(Self {
            entries: kept,
            index,
            intermediates,
            source: source.into(),
            loaded_at: Utc::now(),
        })
    }

    /// Direct rate for a pair, if listed.
    pub fn rate(&self, pair: &CurrencyPair) -> Option<Decimal> {
        self.index.get(pair).copied()
    }

    /// Direct rate looked up by borrowed codes.
    pub fn rate_between(&self, base: &Currency, target: &Currency) -> Option<Decimal> {
        // HashMap lookups need an owned key for a struct pair.
        self.rate(&CurrencyPair::new(base.clone(), target.clone()))
    }

    /// Check whether a direct rate is listed for the pair.
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.index.contains_key(pair)
    }

    /// Distinct base currencies in order of first appearance.
    pub fn intermediates(&self) -> impl Iterator<Item = &Currency> {
        self.intermediates.iter()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the source the table was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// When the table was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair(base: &str, quote: &str) -> CurrencyPair {
        CurrencyPair::new(Currency::new(base), Currency::new(quote))
    }

    #[test]
    fn test_lookup_is_directional() {
        let table =
            RateTable::from_entries(vec![RateEntry::new("EUR", "USD", dec!(1.06))], "TEST")
                .unwrap();

        assert_eq!(table.rate(&pair("EUR", "USD")), Some(dec!(1.06)));
        assert_eq!(table.rate(&pair("USD", "EUR")), None);
        assert!(table.contains(&pair("EUR", "USD")));
        assert_eq!(table.source(), "TEST");
    }

    #[test]
    fn test_intermediates_in_first_appearance_order() {
        let table = RateTable::from_entries(
            vec![
                RateEntry::new("DZD", "EUR", dec!(0.0069)),
                RateEntry::new("EUR", "USD", dec!(1.06)),
                RateEntry::new("DZD", "GBP", dec!(0.0058)),
                RateEntry::new("USD", "DZD", dec!(137.0)),
                RateEntry::new("EUR", "GBP", dec!(0.85)),
            ],
            "TEST",
        )
        .unwrap();

        let order: Vec<&str> = table.intermediates().map(|c| c.code()).collect();
        assert_eq!(order, vec!["DZD", "EUR", "USD"]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.entries()[2].pair(), pair("DZD", "GBP"));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let result = RateTable::from_entries(vec![RateEntry::new("EUR", "USD", dec!(0))], "TEST");
        assert!(matches!(result, Err(FxError::InvalidRate { .. })));

        let result =
            RateTable::from_entries(vec![RateEntry::new("EUR", "USD", dec!(-1.2))], "TEST");
        assert!(matches!(result, Err(FxError::InvalidRate { .. })));
    }

    #[test]
    fn test_rejects_duplicate_pair() {
        let result = RateTable::from_entries(
            vec![
                RateEntry::new("EUR", "USD", dec!(1.06)),
                RateEntry::new("EUR", "USD", dec!(1.07)),
            ],
            "TEST",
        );

        match result {
            Err(FxError::DuplicateRate(p)) => assert_eq!(p, pair("EUR", "USD")),
            other => panic!("expected duplicate rate error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table() {
        let table = RateTable::from_entries(Vec::new(), "EMPTY").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.intermediates().count(), 0);
    }

    #[test]
    fn test_entry_deserializes_from_json() {
        let entry: RateEntry =
            serde_json::from_str(r#"{"base": "EUR", "target": "GBP", "rate": "0.85"}"#).unwrap();

        assert_eq!(entry, RateEntry::new("EUR", "GBP", dec!(0.85)));
    }
}
