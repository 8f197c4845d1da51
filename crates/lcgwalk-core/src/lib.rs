//! # lcgwalk-core
//!
//! Deterministic pseudorandom numbers for random-walk simulations.
//!
//! `lcgwalk-core` implements the linear congruential generator that feeds the
//! `lcgwalk-tests` battery. Output values lie in `[0, 1)` and are truncated
//! (never rounded) to five decimal places, so the same parameters always give
//! the same sample, bit for bit.
//!
//! ## Quick Start
//!
//! ```
//! use lcgwalk_core::generate;
//!
//! // a = 1 + 2k = 3, m = 2^4 = 16
//! let sample = generate(1, 1, 1, 4, 5).unwrap();
//! assert_eq!(sample.values(), &[0.25, 0.8125, 0.5, 0.5625, 0.75]);
//! ```
//!
//! ## Architecture
//!
//! Parameters → Generator → Sample → test battery → verdict
//!
//! A [`Sample`] is immutable once built. Downstream consumers only see it as an
//! ordered list of floats.

pub mod error;
pub mod generator;

pub use error::{Error, Result};
pub use generator::{
    DECIMALS, Draw, GeneratorParams, MAX_EXPONENT, RECOMMENDED_MIN_COUNT, Sample,
    format_truncated, generate, truncate5, truncated_digits,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
