//! Minimal symbolic algebra used to express impedances and waveforms.
//!
//! - `Symbol` / `Expr` - expression tree with constant folding on construction
//! - `Bindings` / `Lambda` - numeric substitution and vectorised evaluation
//! - differentiation with respect to a real-valued symbol
//! - `Display` rendering of equations

mod diff;
mod display;
pub(crate) mod expr;

pub use expr::{Bindings, Expr, Func, Lambda, Symbol};
