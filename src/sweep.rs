//! Frequency and time sweeps, plus the sampled series handed to plotting collaborators.

use crate::circuits::{Circuit, Component, Source};
use crate::errors::Result;
use crate::math::{CScalar, Scalar};
use crate::symbolic::{Expr, Symbol};

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Generates `n` logarithmically spaced samples between `start` and `stop` (Hz).
/// Empty unless both bounds are positive and finite.
#[must_use]
pub fn logspace_hz(start_hz: Scalar, stop_hz: Scalar, n: usize) -> Vec<Scalar> {
    let valid = |hz: Scalar| hz.is_finite() && hz > 0.0;
    if !(valid(start_hz) && valid(stop_hz)) {
        return Vec::new();
    }
    match n {
        0 => Vec::new(),
        1 => vec![start_hz],
        _ => {
            let log_start = start_hz.log10();
            let log_stop = stop_hz.log10();
            let step = (log_stop - log_start) / (n as Scalar - 1.0);
            (0..n)
                .map(|i| 10f64.powf(log_start + step * i as Scalar))
                .collect()
        }
    }
}

/// `n` linear samples from `start_hz` to `stop_hz` with a leading 0 Hz removed.
///
/// Reactive formulas divide by the frequency, so a band starting at DC would
/// make every capacitor or inductor read fail on its first sample.
#[must_use]
pub fn frequency_band(stop_hz: Scalar, start_hz: Scalar, n: usize) -> Vec<Scalar> {
    let mut band = linspace(start_hz, stop_hz, n);
    if band.first() == Some(&0.0) {
        band.remove(0);
    }
    band
}

/// Applies `f` to each sample and collects results.
#[must_use]
pub fn sweep_map<I, F, T>(samples: I, f: F) -> Vec<T>
where
    I: IntoIterator<Item = Scalar>,
    F: FnMut(Scalar) -> T,
{
    samples.into_iter().map(f).collect()
}

/// Evaluates `expr` at every value of `var` in `xs`.
///
/// Every other symbol must already be substituted.
pub fn sample(expr: &Expr, var: &Symbol, xs: &[Scalar]) -> Result<Vec<CScalar>> {
    expr.lambdify(var).call_many(xs)
}

/// Magnitude of complex sequence.
#[must_use]
pub fn mag(values: impl IntoIterator<Item = CScalar>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.norm()).collect()
}

/// Phase in radians of complex sequence.
#[must_use]
pub fn phase_rad(values: impl IntoIterator<Item = CScalar>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.arg()).collect()
}

/// Phase in degrees of complex sequence.
#[must_use]
pub fn phase_deg(values: impl IntoIterator<Item = CScalar>) -> Vec<Scalar> {
    phase_rad(values).into_iter().map(|r| r.to_degrees()).collect()
}

/// Impedance sampled at a single frequency.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPoint {
    /// Frequency in hertz.
    pub frequency: Scalar,
    /// Complex impedance in ohms.
    pub impedance: CScalar,
}

/// Evaluates the impedance of `component` at every frequency (Hz).
///
/// Stops at the first frequency that cannot be evaluated.
pub fn sweep_impedance<C, I>(component: &C, frequencies: I) -> Result<Vec<FrequencyPoint>>
where
    C: Component + ?Sized,
    I: IntoIterator<Item = Scalar>,
{
    frequencies
        .into_iter()
        .map(|frequency| {
            Ok(FrequencyPoint {
                frequency,
                impedance: component.impedance_at(frequency)?,
            })
        })
        .collect()
}

/// Sampled `(x, y)` pairs with labelling metadata, ready to render.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotSeries {
    /// Abscissa samples.
    pub x: Vec<Scalar>,
    /// Ordinate samples, one per abscissa.
    pub y: Vec<Scalar>,
    /// Abscissa label including units.
    pub x_label: String,
    /// Ordinate label including units.
    pub y_label: String,
    /// Plot title.
    pub title: String,
}

impl PlotSeries {
    fn labelled(
        x: Vec<Scalar>,
        y: Vec<Scalar>,
        x_label: &str,
        y_label: &str,
        title: String,
    ) -> Self {
        Self {
            x,
            y,
            x_label: x_label.to_owned(),
            y_label: y_label.to_owned(),
            title,
        }
    }

    /// `|Z(f)|` of `component` over `frequencies`.
    pub fn impedance_series<C>(component: &C, frequencies: &[Scalar]) -> Result<Self>
    where
        C: Component + ?Sized,
    {
        let points = sweep_impedance(component, frequencies.iter().copied())?;
        Ok(Self::labelled(
            points.iter().map(|p| p.frequency).collect(),
            mag(points.iter().map(|p| p.impedance)),
            "f [Hz]",
            "|Z| [Ohm]",
            format!("Impedance of {}", component.name()),
        ))
    }

    /// Nyquist locus of `component`: `Re(Z)` against `Im(Z)` over `frequencies`.
    pub fn nyquist<C>(component: &C, frequencies: &[Scalar]) -> Result<Self>
    where
        C: Component + ?Sized,
    {
        let points = sweep_impedance(component, frequencies.iter().copied())?;
        Ok(Self::labelled(
            points.iter().map(|p| p.impedance.re).collect(),
            points.iter().map(|p| p.impedance.im).collect(),
            "Re(Z) [Ohm]",
            "Im(Z) [Ohm]",
            format!("Nyquist plot of {}", component.name()),
        ))
    }

    /// Voltage of `source` over `times` (seconds).
    pub fn source_voltage(source: &Source, times: &[Scalar]) -> Result<Self> {
        let y = times
            .iter()
            .map(|&t| source.voltage_at(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::labelled(
            times.to_vec(),
            y,
            "t [s]",
            "u [V]",
            format!("Voltage of {}", source.name()),
        ))
    }

    /// Real part of the total current of `circuit` over `times` (seconds).
    pub fn circuit_current(circuit: &Circuit, times: &[Scalar]) -> Result<Self> {
        let current = sample(&circuit.current()?, circuit.time_symbol(), times)?;
        Ok(Self::labelled(
            times.to_vec(),
            current.into_iter().map(|i| i.re).collect(),
            "t [s]",
            "Re(i) [A]",
            format!("Current through {}", circuit.network().name()),
        ))
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
