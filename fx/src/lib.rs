//! hopfx Rate Engine
//!
//! Converts amounts between currencies using a small table of directed
//! exchange rates, falling back to a single intermediate currency when no
//! direct rate is listed.
//!
//! # Features
//!
//! - Lazy, exactly-once table load shared by concurrent callers
//! - Direct lookup with one-hop composition (first match in table order)
//! - Pluggable rate sources: built-in seed, static set, JSON file
//! - Typed results, plus a zero-sentinel `convert` for callers that want one
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hopfx_fx::{RateResolver, SeedRateSource};
//! use rust_decimal_macros::dec;
//!
//! let resolver = RateResolver::new(Arc::new(SeedRateSource::instant()));
//!
//! let eur = resolver.convert("DZD", "EUR", dec!(1000)).await;
//! assert_eq!(eur, dec!(6.9));
//!
//! let conversion = resolver.try_convert("DZD", "USD", dec!(1000)).await?;
//! println!("{} ({})", conversion.output, conversion.path);
//! ```

pub mod config;
pub mod conversion;
pub mod error;
pub mod resolver;
pub mod source;
pub mod table;

pub use config::ResolverConfig;
pub use conversion::{Conversion, RatePath, ResolvedRate};
pub use error::{FxError, FxResult};
pub use resolver::{find_rate, RateResolver, ResolverState};
pub use source::{seed_rates, FileRateSource, RateSource, SeedRateSource, StaticRateSource};
pub use table::{RateEntry, RateTable};
