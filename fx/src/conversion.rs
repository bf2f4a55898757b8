//! Conversion results and the rate path that produced them.

use std::fmt;

use chrono::{DateTime, Utc};
use hopfx_common::{Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FxError, FxResult};

/// How a rate was obtained from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatePath {
    /// Listed directly for the pair.
    Direct,
    /// Chained through one intermediate currency.
    Composed {
        via: Currency,
        /// Rate from base to `via`.
        first: Decimal,
        /// Rate from `via` to target.
        second: Decimal,
    },
}

impl RatePath {
    pub fn is_direct(&self) -> bool {
        matches!(self, RatePath::Direct)
    }
}

impl fmt::Display for RatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatePath::Direct => write!(f, "direct"),
            RatePath::Composed { via, .. } => write!(f, "via {}", via),
        }
    }
}

/// A rate resolved for a pair, with the path used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub pair: CurrencyPair,
    /// Effective multiplier from base to target.
    pub rate: Decimal,
    pub path: RatePath,
}

impl ResolvedRate {
    /// A rate listed directly in the table.
    pub fn direct(pair: CurrencyPair, rate: Decimal) -> Self {
        Self {
            pair,
            rate,
            path: RatePath::Direct,
        }
    }

    /// A rate composed through `via`. Fails if the leg product overflows.
    pub fn composed(
        pair: CurrencyPair,
        via: Currency,
        first: Decimal,
        second: Decimal,
    ) -> FxResult<Self> {
        let rate = first
            .checked_mul(second)
            .ok_or_else(|| FxError::Overflow(pair.clone()))?;
        Ok(Self {
            pair,
            rate,
            path: RatePath::Composed { via, first, second },
        })
    }

    /// Apply the rate to an amount of the base currency.
    ///
    /// Composed paths multiply leg by leg so the result is
    /// `amount * first * second` exactly as the legs are quoted.
    pub fn apply(&self, amount: Decimal) -> FxResult<Decimal> {
        let value = match &self.path {
            RatePath::Direct => amount.checked_mul(self.rate),
            RatePath::Composed { first, second, .. } => amount
                .checked_mul(*first)
                .and_then(|v| v.checked_mul(*second)),
        };
        value.ok_or_else(|| FxError::Overflow(self.pair.clone()))
    }
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Input amount.
    pub input: Money,
    /// Output amount.
    pub output: Money,
    /// Effective rate applied.
    pub rate: Decimal,
    /// Direct or composed.
    pub path: RatePath,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl Conversion {
    /// Execute a resolved rate against an amount.
    pub fn execute(resolved: ResolvedRate, amount: Decimal) -> FxResult<Self> {
        let output_value = resolved.apply(amount)?;
        Ok(Self {
            id: Uuid::now_v7(),
            input: Money::new(amount, resolved.pair.base.clone()),
            output: Money::new(output_value, resolved.pair.quote.clone()),
            rate: resolved.rate,
            path: resolved.path,
            executed_at: Utc::now(),
        })
    }

    /// Get the effective rate used.
    pub fn effective_rate(&self) -> Decimal {
        if self.input.value.is_zero() {
            return Decimal::ZERO;
        }
        self.output.value / self.input.value
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.input.currency.clone(), self.output.currency.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dzd_usd() -> CurrencyPair {
        CurrencyPair::new(Currency::dzd(), Currency::usd())
    }

    #[test]
    fn test_composed_rate_multiplies_legs() {
        let resolved =
            ResolvedRate::composed(dzd_usd(), Currency::eur(), dec!(0.0069), dec!(1.06)).unwrap();

        assert_eq!(resolved.rate, dec!(0.007314));
        assert_eq!(resolved.apply(dec!(1000)).unwrap(), dec!(7.314));
        assert_eq!(resolved.path.to_string(), "via EUR");
        assert!(!resolved.path.is_direct());
    }

    #[test]
    fn test_conversion_effective_rate() {
        let resolved = ResolvedRate::direct(
            CurrencyPair::new(Currency::eur(), Currency::usd()),
            dec!(1.06),
        );

        let conversion = Conversion::execute(resolved, dec!(10)).unwrap();

        assert_eq!(conversion.output.value, dec!(10.6));
        assert_eq!(conversion.output.currency, Currency::usd());
        assert_eq!(conversion.effective_rate(), dec!(1.06));
        assert_eq!(conversion.pair(), CurrencyPair::new(Currency::eur(), Currency::usd()));
    }

    #[test]
    fn test_zero_input_effective_rate() {
        let resolved = ResolvedRate::direct(dzd_usd(), dec!(0.0073));
        let conversion = Conversion::execute(resolved, Decimal::ZERO).unwrap();

        assert!(conversion.output.is_zero());
        assert_eq!(conversion.effective_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_amount_is_an_error() {
        let resolved = ResolvedRate::direct(
            CurrencyPair::new(Currency::usd(), Currency::dzd()),
            dec!(137),
        );

        let result = resolved.apply(Decimal::MAX);
        assert!(matches!(result, Err(FxError::Overflow(_))));
        assert!(matches!(
            Conversion::execute(resolved, Decimal::MAX),
            Err(FxError::Overflow(_))
        ));
    }

    #[test]
    fn test_overflowing_leg_product_is_an_error() {
        let big = dec!(100000000000000000000);
        let result = ResolvedRate::composed(dzd_usd(), Currency::eur(), big, big);

        assert!(matches!(result, Err(FxError::Overflow(p)) if p == dzd_usd()));
    }

    #[test]
    fn test_path_serializes_tagged() {
        let path = RatePath::Composed {
            via: Currency::eur(),
            first: dec!(0.0069),
            second: dec!(1.06),
        };
        let json = serde_json::to_value(&path).unwrap();

        assert_eq!(json["kind"], "composed");
        assert_eq!(json["via"], "EUR");
    }
}
