//! Rate engine error types.

use hopfx_common::CurrencyPair;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the rate engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Neither a direct nor a one-hop rate exists for the pair.
    #[error("No rate found for {0}")]
    RateNotFound(CurrencyPair),

    /// Applying the rate exceeded the decimal range.
    #[error("Conversion overflow for {0}")]
    Overflow(CurrencyPair),

    /// A source produced a zero or negative rate.
    #[error("Invalid rate {rate} for {pair}: rates must be positive")]
    InvalidRate { pair: CurrencyPair, rate: Decimal },

    /// A source listed the same pair twice.
    #[error("Duplicate rate for {0}")]
    DuplicateRate(CurrencyPair),

    /// Rate source failed to produce its entries.
    #[error("Rate source error: {0}")]
    Source(String),
}

impl FxError {
    /// Whether a later call may succeed where this one failed.
    ///
    /// Only source failures leave the resolver uninitialized; everything else
    /// is a property of the data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::Source(_))
    }

    /// Short machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::RateNotFound(_) => "RATE_NOT_FOUND",
            FxError::Overflow(_) => "OVERFLOW",
            FxError::InvalidRate { .. } => "INVALID_RATE",
            FxError::DuplicateRate(_) => "DUPLICATE_RATE",
            FxError::Source(_) => "SOURCE_ERROR",
        }
    }
}

/// Result type for rate engine operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hopfx_common::Currency;

    #[test]
    fn test_rate_not_found_names_pair() {
        let err = FxError::RateNotFound(CurrencyPair::new(Currency::usd(), Currency::gbp()));

        assert_eq!(err.to_string(), "No rate found for USD/GBP");
        assert_eq!(err.error_code(), "RATE_NOT_FOUND");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_source_error_is_retryable() {
        assert!(FxError::Source("boom".to_string()).is_retryable());
    }
}
