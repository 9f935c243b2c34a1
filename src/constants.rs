//! Baseline constants and conversion helpers shared by the circuit model.

use std::f64::consts::PI;

/// Name of the frequency symbol used when a caller does not supply one.
pub const DEFAULT_FREQUENCY_SYMBOL: &str = "f";
/// Name of the time symbol used when a caller does not supply one.
pub const DEFAULT_TIME_SYMBOL: &str = "t";

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * PI * hz
}

/// Returns the period in seconds of a waveform repeating at `hz`.
#[inline]
#[must_use]
pub fn period(hz: f64) -> f64 {
    1.0 / hz
}

/// Returns the resonance frequency `1/(2π√(LC))` of an ideal LC pair in hertz.
#[inline]
#[must_use]
pub fn lc_resonance(inductance_h: f64, capacitance_f: f64) -> f64 {
    1.0 / (2.0 * PI * (inductance_h * capacitance_f).sqrt())
}
