//! Convenience re-exports for building and resolving circuits.

pub use crate::circuits::{
    circuit::{Circuit, PartialCurrent, Terminal},
    component::{Capacitor, Component, Element, Inductor, Resistor},
    network::{ConnectionKind, Network},
    resonance::{find_root, minimum_impedance, reactance_zero, resonance, ResonanceOptions},
    sources::{Phase, Source, SourceKind, WaveformKind, WaveformSymbols},
    superposition::{common_frequency, MixedSource, PeakEstimate, PeakSearch},
};
pub use crate::constants::*;
pub use crate::errors::ReactanceError;
pub use crate::math::{phasor, CScalar, Scalar};
pub use crate::symbolic::{Bindings, Expr, Func, Lambda, Symbol};
pub use crate::sweep::{
    frequency_band, linspace, logspace_hz, mag, phase_deg, phase_rad, sample, sweep_impedance,
    sweep_map, FrequencyPoint, PlotSeries,
};
