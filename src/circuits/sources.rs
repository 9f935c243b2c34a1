//! Independent voltage sources: DC levels, periodic AC waveforms and mixed sums.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_TIME_SYMBOL;
use crate::errors::{ReactanceError, Result};
use crate::math::Scalar;
use crate::symbolic::{Bindings, Expr, Symbol};

use super::superposition::MixedSource;

/// Elementary waveform shapes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformKind {
    /// Constant level.
    Dc,
    /// Sinusoid.
    Sine,
    /// Symmetric triangle.
    Triangle,
    /// Square wave alternating between `reference ± peak`.
    Rectangle,
}

impl WaveformKind {
    /// Canonical label (`"DC"`, `"AC sine"`, `"AC tri"`, `"AC rect"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dc => "DC",
            Self::Sine => "AC sine",
            Self::Triangle => "AC tri",
            Self::Rectangle => "AC rect",
        }
    }
}

impl FromStr for WaveformKind {
    type Err = ReactanceError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let shape = normalized.strip_prefix("ac").map_or(normalized.as_str(), str::trim_start);
        match shape {
            "dc" => Ok(Self::Dc),
            "sine" | "sin" => Ok(Self::Sine),
            "tri" | "triangle" => Ok(Self::Triangle),
            "rect" | "rectangle" | "square" => Ok(Self::Rectangle),
            _ => Err(ReactanceError::InvalidWaveform(s.to_owned())),
        }
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of any source, including composites.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Elementary source of the given shape.
    Elementary(WaveformKind),
    /// Superposition of two sources.
    Mixed,
}

/// Phase angle stored in radians.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Phase(Scalar);

impl Phase {
    /// Phase given in radians.
    #[must_use]
    pub const fn radians(value: Scalar) -> Self {
        Self(value)
    }

    /// Phase given in degrees.
    #[must_use]
    pub fn degrees(value: Scalar) -> Self {
        Self(value * PI / 180.0)
    }

    /// Value in radians.
    #[must_use]
    pub const fn as_radians(self) -> Scalar {
        self.0
    }
}

impl From<Scalar> for Phase {
    fn from(radians: Scalar) -> Self {
        Self(radians)
    }
}

/// Parses `"<number>rad"`, `"<number>deg"` or `"<number>°"`. A bare number is taken as radians.
/// NaN and infinities are rejected.
impl FromStr for Phase {
    type Err = ReactanceError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let (number, in_degrees) = if let Some(number) = text.strip_suffix("rad") {
            (number, false)
        } else if let Some(number) = text.strip_suffix("deg").or_else(|| text.strip_suffix('°')) {
            (number, true)
        } else {
            (text, false)
        };
        let value = number
            .trim()
            .parse::<Scalar>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ReactanceError::InvalidPhase(s.to_owned()))?;
        Ok(if in_degrees {
            Self::degrees(value)
        } else {
            Self::radians(value)
        })
    }
}

/// Symbols standing for a waveform's parameters in [`Source::symbolic_voltage`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSymbols {
    /// Peak amplitude.
    pub peak: Symbol,
    /// DC offset.
    pub reference: Symbol,
    /// Frequency in hertz.
    pub frequency: Symbol,
}

impl WaveformSymbols {
    fn for_source(name: &str) -> Self {
        Self {
            peak: Symbol::new(format!("u_{name}")),
            reference: Symbol::new(format!("ref_{name}")),
            frequency: Symbol::new(format!("f_{name}")),
        }
    }
}

/// Parameters of an elementary source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
struct Waveform {
    kind: WaveformKind,
    peak: Scalar,
    reference: Scalar,
    frequency: Scalar,
    phase: Phase,
    symbols: WaveformSymbols,
}

impl Waveform {
    /// Closed-form voltage for the given parameter expressions.
    fn expression(&self, peak: Expr, reference: Expr, frequency: Expr, time: &Symbol) -> Expr {
        let t = Expr::var(time);
        let phase = self.phase.as_radians();
        let shape = match self.kind {
            WaveformKind::Dc => Expr::one(),
            WaveformKind::Sine => (Expr::real(2.0) * Expr::Pi * frequency * t + phase).sin(),
            WaveformKind::Triangle => {
                // x = t/T + 1/4 + phase/(2π); 4·|x − ⌊x + ½⌋| − 1 spans [−1, 1]
                let x = frequency * t + 0.25 + phase / (2.0 * PI);
                let folded = (x.clone() - (x + 0.5).floor()).abs();
                Expr::real(4.0) * folded - 1.0
            }
            WaveformKind::Rectangle => {
                let edges = (Expr::real(2.0) * frequency * (t - phase)).floor();
                Expr::pow(Expr::real(-1.0), edges)
            }
        };
        peak * shape + reference
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
enum Signal {
    Elementary(Waveform),
    Mixed(Box<MixedSource>),
}

/// Independent voltage source expressed as a function of a time symbol.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    name: String,
    time: Symbol,
    signal: Signal,
}

impl Source {
    /// Constant source at `peak + reference` volts.
    #[must_use]
    pub fn dc(name: impl Into<String>, peak: Scalar, reference: Scalar) -> Self {
        let name = name.into();
        Self {
            time: Symbol::new(DEFAULT_TIME_SYMBOL),
            signal: Signal::Elementary(Waveform {
                kind: WaveformKind::Dc,
                peak,
                reference,
                frequency: 0.0,
                phase: Phase::default(),
                symbols: WaveformSymbols::for_source(&name),
            }),
            name,
        }
    }

    /// Grounded terminal: a 0 V DC source.
    #[must_use]
    pub fn ground() -> Self {
        Self::dc("ground", 0.0, 0.0)
    }

    /// Periodic source of the given `kind`.
    ///
    /// Fails with [`ReactanceError::InvalidWaveform`] for [`WaveformKind::Dc`]
    /// or a non-positive frequency.
    pub fn ac(
        name: impl Into<String>,
        kind: WaveformKind,
        peak: Scalar,
        reference: Scalar,
        frequency_hz: Scalar,
        time: Symbol,
        phase: impl Into<Phase>,
    ) -> Result<Self> {
        let name = name.into();
        if kind == WaveformKind::Dc {
            return Err(ReactanceError::InvalidWaveform(format!(
                "{name}: DC is not a periodic waveform, use Source::dc"
            )));
        }
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(ReactanceError::InvalidWaveform(format!(
                "{name}: {kind} needs a positive frequency, got {frequency_hz}"
            )));
        }
        Ok(Self {
            time,
            signal: Signal::Elementary(Waveform {
                kind,
                peak,
                reference,
                frequency: frequency_hz,
                phase: phase.into(),
                symbols: WaveformSymbols::for_source(&name),
            }),
            name,
        })
    }

    /// Like [`Source::ac`] but with the kind and phase given as text (`"AC sine"`, `"90deg"`).
    pub fn parse_ac(
        name: impl Into<String>,
        kind: &str,
        peak: Scalar,
        reference: Scalar,
        frequency_hz: Scalar,
        time: Symbol,
        phase: &str,
    ) -> Result<Self> {
        let phase: Phase = phase.parse()?;
        Self::ac(name, kind.parse()?, peak, reference, frequency_hz, time, phase)
    }

    /// Replaces the parameter symbols used by [`Source::symbolic_voltage`].
    ///
    /// Has no effect on mixed sources, whose symbolic form comes from their operands.
    #[must_use]
    pub fn with_symbols(mut self, symbols: WaveformSymbols) -> Self {
        if let Signal::Elementary(waveform) = &mut self.signal {
            waveform.symbols = symbols;
        }
        self
    }

    pub(crate) fn from_mixed(name: String, time: Symbol, mixed: MixedSource) -> Self {
        Self {
            name,
            time,
            signal: Signal::Mixed(Box::new(mixed)),
        }
    }

    /// Source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time symbol the voltage is expressed in.
    #[must_use]
    pub fn time_symbol(&self) -> &Symbol {
        &self.time
    }

    /// Source kind.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match &self.signal {
            Signal::Elementary(w) => SourceKind::Elementary(w.kind),
            Signal::Mixed(_) => SourceKind::Mixed,
        }
    }

    /// True for an elementary DC source.
    #[must_use]
    pub fn is_dc(&self) -> bool {
        self.kind() == SourceKind::Elementary(WaveformKind::Dc)
    }

    /// Peak amplitude; for mixed sources, the estimated peak magnitude.
    #[must_use]
    pub fn peak(&self) -> Scalar {
        match &self.signal {
            Signal::Elementary(w) => w.peak,
            Signal::Mixed(m) => m.peak().value(),
        }
    }

    /// DC offset; for mixed sources, the sum of the operands' offsets.
    #[must_use]
    pub fn reference(&self) -> Scalar {
        match &self.signal {
            Signal::Elementary(w) => w.reference,
            Signal::Mixed(m) => m.first().reference() + m.second().reference(),
        }
    }

    /// Frequency in hertz (0 for DC). `None` for a mixed source without a common period.
    #[must_use]
    pub fn frequency(&self) -> Option<Scalar> {
        match &self.signal {
            Signal::Elementary(w) => Some(w.frequency),
            Signal::Mixed(m) => m.frequency(),
        }
    }

    /// Phase of an elementary source; mixed sources carry none.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match &self.signal {
            Signal::Elementary(w) => Some(w.phase),
            Signal::Mixed(_) => None,
        }
    }

    /// Composite parameters, for mixed sources.
    #[must_use]
    pub fn as_mixed(&self) -> Option<&MixedSource> {
        match &self.signal {
            Signal::Elementary(_) => None,
            Signal::Mixed(m) => Some(m),
        }
    }

    /// Voltage as a function of [`Source::time_symbol`].
    #[must_use]
    pub fn voltage(&self) -> Expr {
        match &self.signal {
            Signal::Elementary(w) => w.expression(
                Expr::real(w.peak),
                Expr::real(w.reference),
                Expr::real(w.frequency),
                &self.time,
            ),
            Signal::Mixed(m) => {
                m.first().voltage() + m.second().voltage_in(&self.time)
            }
        }
    }

    /// Voltage with peak, reference and frequency left as symbols.
    #[must_use]
    pub fn symbolic_voltage(&self) -> Expr {
        match &self.signal {
            Signal::Elementary(w) => w.expression(
                Expr::var(&w.symbols.peak),
                Expr::var(&w.symbols.reference),
                Expr::var(&w.symbols.frequency),
                &self.time,
            ),
            Signal::Mixed(m) => {
                m.first().symbolic_voltage() + m.second().symbolic_voltage().subs(
                    m.second().time_symbol(),
                    &Expr::var(&self.time),
                )
            }
        }
    }

    /// Voltage re-expressed in another time symbol.
    #[must_use]
    pub fn voltage_in(&self, time: &Symbol) -> Expr {
        let voltage = self.voltage();
        if time == &self.time {
            voltage
        } else {
            voltage.subs(&self.time, &Expr::var(time))
        }
    }

    /// Instantaneous voltage at `t` seconds.
    pub fn voltage_at(&self, t: Scalar) -> Result<Scalar> {
        Ok(self.voltage().eval(&Bindings::new().with(&self.time, t))?.re)
    }

    /// Elementary sources this source decomposes into, flattened.
    #[must_use]
    pub fn base_sources(&self) -> Vec<Self> {
        match &self.signal {
            Signal::Elementary(_) => vec![self.clone()],
            Signal::Mixed(m) => {
                let mut out = m.first().base_sources();
                out.extend(m.second().base_sources());
                out
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signal {
            Signal::Elementary(w) if w.kind == WaveformKind::Dc => {
                write!(f, "DC source {}: {} V", self.name, w.peak + w.reference)
            }
            Signal::Elementary(w) => write!(
                f,
                "{} source {}: peak {} V, reference {} V, {} Hz, phase {} rad",
                w.kind,
                self.name,
                w.peak,
                w.reference,
                w.frequency,
                w.phase.as_radians()
            ),
            Signal::Mixed(m) => {
                write!(f, "Mixed source {} = ({}) + ({}), ", self.name, m.first(), m.second())?;
                match m.frequency() {
                    Some(hz) => write!(f, "{hz} Hz, ")?,
                    None => f.write_str("no common period, ")?,
                }
                write!(f, "peak {}", m.peak())
            }
        }
    }
}
