//! Circuit primitives: lumped elements, networks, sources and their resolution.

/// Lumped component definitions and the shared read contract.
pub mod component;
/// Series and parallel composition of components.
pub mod network;
/// Elementary DC and AC waveform sources.
pub mod sources;
/// Mixed sources built from two operands with a shared period.
pub mod superposition;
/// Networks driven by a source on each terminal.
pub mod circuit;
/// Resonance and stationary-point search over frequency.
pub mod resonance;

pub use circuit::{Circuit, PartialCurrent, Terminal};
pub use component::{Capacitor, Component, Element, Inductor, Resistor};
pub use network::{ConnectionKind, Network};
pub use resonance::ResonanceOptions;
pub use sources::{Phase, Source, SourceKind, WaveformKind, WaveformSymbols};
pub use superposition::{MixedSource, PeakEstimate, PeakSearch};
