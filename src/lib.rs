#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Frequency symbols and conversions shared by element formulas.
pub mod constants;
/// Scalar aliases and complex-number helpers.
pub mod math;
/// Error type shared across the crate.
pub mod errors;
/// Expression trees with substitution, evaluation and differentiation.
pub mod symbolic;
/// Components, networks, sources and circuits.
pub mod circuits;
/// Frequency/time sweeps and plot-ready series.
pub mod sweep;

/// Common exports for downstream crates.
pub mod prelude;
