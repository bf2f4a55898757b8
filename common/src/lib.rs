//! hopfx Common Types
//!
//! Currency codes, directed currency pairs and monetary amounts shared by the
//! rate engine and the command-line driver.

pub mod monetary;

pub use monetary::*;
