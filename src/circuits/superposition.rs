//! Mixed sources: the sum of two sources with a shared fundamental period.
//!
//! The effective frequency is the largest `min(f1, f2) / k` (for `k` up to
//! [`PeakSearch::max_divisor`]) that divides both frequencies. Commensurate
//! pairs such as 10 Hz and 15 Hz yield their common divisor (5 Hz); pairs
//! without one inside the bound keep `frequency = None` and report the
//! worst-case peak `|p1| + |p2|` instead of a sampled one.

use std::fmt;
use std::ops::Add;

use tracing::warn;

use crate::constants::period;
use crate::math::{approx_integer, Scalar};

use super::sources::Source;

const INTEGRAL_TOLERANCE: Scalar = 1.0e-9;

/// Bounds for the common-period search and the two-stage peak sampling.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakSearch {
    /// Largest divisor `k` tried when looking for a common frequency `min(f1, f2)/k`.
    pub max_divisor: u32,
    /// Minimum samples taken across one period in the coarse pass.
    pub coarse_samples: usize,
    /// Minimum coarse samples per cycle of the fastest elementary source.
    pub samples_per_cycle: usize,
    /// Largest coarse pass attempted; beyond it the peak falls back to the worst case.
    pub max_samples: usize,
    /// Samples taken between the neighbours of the coarse maximum.
    pub fine_samples: usize,
}

impl Default for PeakSearch {
    fn default() -> Self {
        Self {
            max_divisor: 10_000,
            coarse_samples: 10_000,
            samples_per_cycle: 32,
            max_samples: 1_000_000,
            fine_samples: 1_000,
        }
    }
}

impl PeakSearch {
    /// Coarse sample count for one common period at `frequency_hz` when the
    /// fastest elementary source runs at `fastest_hz`.
    ///
    /// `None` when the count would exceed [`PeakSearch::max_samples`].
    #[must_use]
    pub fn coarse_count(&self, frequency_hz: Scalar, fastest_hz: Scalar) -> Option<usize> {
        let cycles = (fastest_hz / frequency_hz).ceil().max(1.0);
        let needed = self.samples_per_cycle as Scalar * cycles;
        if !needed.is_finite() || needed > self.max_samples as Scalar {
            return None;
        }
        Some(self.coarse_samples.max(needed as usize))
    }
}

/// Peak magnitude of a mixed source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakEstimate {
    /// Maximum magnitude found by sampling one common period.
    Sampled(Scalar),
    /// Sum of the operand peaks, used when no common period was found.
    WorstCase(Scalar),
}

impl PeakEstimate {
    /// Estimated peak in volts.
    #[must_use]
    pub const fn value(self) -> Scalar {
        match self {
            Self::Sampled(v) | Self::WorstCase(v) => v,
        }
    }

    /// True when the value is the worst-case fallback.
    #[must_use]
    pub const fn is_approximate(self) -> bool {
        matches!(self, Self::WorstCase(_))
    }
}

impl fmt::Display for PeakEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sampled(v) => write!(f, "{v} V"),
            Self::WorstCase(v) => write!(f, "<= {v} V (no common period)"),
        }
    }
}

/// Operands and derived parameters of a mixed source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MixedSource {
    first: Source,
    second: Source,
    frequency: Option<Scalar>,
    peak: PeakEstimate,
}

impl MixedSource {
    /// First operand.
    #[must_use]
    pub fn first(&self) -> &Source {
        &self.first
    }

    /// Second operand.
    #[must_use]
    pub fn second(&self) -> &Source {
        &self.second
    }

    /// Common fundamental frequency, if one was found.
    #[must_use]
    pub fn frequency(&self) -> Option<Scalar> {
        self.frequency
    }

    /// Peak estimate.
    #[must_use]
    pub fn peak(&self) -> PeakEstimate {
        self.peak
    }
}

/// Largest frequency dividing both `f1` and `f2`, searching `min/k` for `k ≤ max_divisor`.
///
/// A zero frequency (DC) divides nothing and is ignored.
#[must_use]
pub fn common_frequency(f1: Scalar, f2: Scalar, max_divisor: u32) -> Option<Scalar> {
    let (lo, hi) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
    if lo == 0.0 {
        return Some(hi);
    }
    if !(lo > 0.0 && hi.is_finite()) {
        return None;
    }
    (1..=max_divisor)
        .map(|k| lo / Scalar::from(k))
        .find(|&candidate| approx_integer(hi / candidate, INTEGRAL_TOLERANCE))
}

/// Maximum of `|v(t)|` over one `period`, refined around the coarse maximum.
///
/// Returns `None` if any sample fails to evaluate.
fn sampled_peak<F>(voltage: F, period: Scalar, coarse: usize, fine: usize) -> Option<Scalar>
where
    F: Fn(Scalar) -> Option<Scalar>,
{
    let coarse = coarse.max(2);
    let step = period / coarse as Scalar;
    let mut best = (0.0, Scalar::NEG_INFINITY);
    for i in 0..coarse {
        let t = step * i as Scalar;
        let magnitude = voltage(t)?.abs();
        if magnitude > best.1 {
            best = (t, magnitude);
        }
    }
    let fine = fine.max(2);
    let start = best.0 - step;
    let fine_step = 2.0 * step / (fine - 1) as Scalar;
    for i in 0..fine {
        let magnitude = voltage(start + fine_step * i as Scalar)?.abs();
        best.1 = best.1.max(magnitude);
    }
    Some(best.1)
}

impl Source {
    /// Superposition of `first` and `second` with the default [`PeakSearch`].
    #[must_use]
    pub fn mixed(first: Self, second: Self) -> Self {
        Self::mixed_with(first, second, &PeakSearch::default())
    }

    /// Superposition of `first` and `second`.
    ///
    /// The result is expressed in `first`'s time symbol.
    #[must_use]
    pub fn mixed_with(first: Self, second: Self, search: &PeakSearch) -> Self {
        let name = format!("{}+{}", first.name(), second.name());
        let time = first.time_symbol().clone();
        let frequency = match (first.frequency(), second.frequency()) {
            (Some(f1), Some(f2)) => common_frequency(f1, f2, search.max_divisor),
            _ => None,
        };
        let worst_case = PeakEstimate::WorstCase(first.peak().abs() + second.peak().abs());

        let peak = match frequency {
            None => {
                warn!(
                    source = %name,
                    "no common period within {} divisors, using worst-case peak",
                    search.max_divisor
                );
                worst_case
            }
            Some(hz) => {
                let voltage = (first.voltage() + second.voltage_in(&time)).lambdify(&time);
                let evaluate = |t: Scalar| voltage.call_real(t).ok();
                let fastest = first
                    .base_sources()
                    .iter()
                    .chain(second.base_sources().iter())
                    .filter_map(Source::frequency)
                    .fold(hz, Scalar::max);
                let sampled = if hz == 0.0 {
                    evaluate(0.0).map(Scalar::abs)
                } else if let Some(coarse) = search.coarse_count(hz, fastest) {
                    sampled_peak(evaluate, period(hz), coarse, search.fine_samples)
                } else {
                    warn!(
                        source = %name,
                        fastest,
                        "common period spans more than {} samples",
                        search.max_samples
                    );
                    None
                };
                sampled.map_or_else(
                    || {
                        warn!(source = %name, "peak sampling failed, using worst-case peak");
                        worst_case
                    },
                    PeakEstimate::Sampled,
                )
            }
        };

        Self::from_mixed(
            name,
            time,
            MixedSource {
                first,
                second,
                frequency,
                peak,
            },
        )
    }
}

impl Add for Source {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::mixed(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::sources::{SourceKind, WaveformKind};
    use crate::symbolic::Symbol;

    fn sine(name: &str, peak: Scalar, hz: Scalar) -> Source {
        Source::ac(name, WaveformKind::Sine, peak, 0.0, hz, Symbol::new("t"), 0.0).unwrap()
    }

    #[test]
    fn common_frequency_is_the_gcd() {
        assert_eq!(common_frequency(10.0, 15.0, 100), Some(5.0));
        assert_eq!(common_frequency(1.0, 10.0, 100), Some(1.0));
        assert_eq!(common_frequency(0.0, 7.0, 100), Some(7.0));
        assert_relative_eq!(common_frequency(0.5, 1.5, 100).unwrap(), 0.5);
        assert_relative_eq!(common_frequency(0.3, 0.4, 100).unwrap(), 0.1, max_relative = 1.0e-9);
    }

    #[test]
    fn incommensurate_frequencies_hit_the_bound() {
        assert_eq!(common_frequency(1.0, std::f64::consts::SQRT_2, 1_000), None);
    }

    #[test]
    fn mixed_sine_pair_has_gcd_frequency() {
        let mixed = sine("S1", 1.0, 10.0) + sine("S2", 1.0, 15.0);
        assert_eq!(mixed.kind(), SourceKind::Mixed);
        assert_eq!(mixed.frequency(), Some(5.0));
        assert_relative_eq!(1.0 / mixed.frequency().unwrap(), 0.2);
        assert!(mixed.phase().is_none());
        let peak = mixed.as_mixed().unwrap().peak();
        assert!(!peak.is_approximate());
        assert!(peak.value() > 1.0 && peak.value() <= 2.0);
    }

    #[test]
    fn coincident_sines_peak_at_sum_of_amplitudes() {
        let mixed = sine("S1", 1.0, 10.0) + sine("S2", 2.0, 10.0);
        assert_relative_eq!(mixed.peak(), 3.0, max_relative = 1.0e-6);
        assert_relative_eq!(mixed.voltage_at(0.025).unwrap(), 3.0, epsilon = 1.0e-9);
    }

    #[test]
    fn dc_offset_shifts_sampled_peak() {
        let mixed = sine("S1", 1.0, 50.0) + Source::dc("B", 2.0, 0.0);
        assert_eq!(mixed.frequency(), Some(50.0));
        assert_relative_eq!(mixed.peak(), 3.0, max_relative = 1.0e-6);
    }

    #[test]
    fn incommensurate_mix_falls_back_to_worst_case() {
        let search = PeakSearch {
            max_divisor: 50,
            ..PeakSearch::default()
        };
        let mixed = Source::mixed_with(
            sine("S1", 1.0, 1.0),
            sine("S2", 2.0, std::f64::consts::PI),
            &search,
        );
        assert_eq!(mixed.frequency(), None);
        let peak = mixed.as_mixed().unwrap().peak();
        assert!(peak.is_approximate());
        assert_relative_eq!(peak.value(), 3.0);
    }

    #[test]
    fn wide_frequency_ratio_samples_every_fast_cycle() {
        let mixed = sine("A", 1.0, 1.0) + sine("B", 1.0, 4_999.0);
        assert_eq!(mixed.frequency(), Some(1.0));
        let peak = mixed.as_mixed().unwrap().peak();
        assert!(!peak.is_approximate());
        assert_relative_eq!(peak.value(), 2.0, max_relative = 1.0e-6);
    }

    #[test]
    fn oversized_sampling_falls_back_to_worst_case() {
        let search = PeakSearch {
            max_samples: 1_000,
            ..PeakSearch::default()
        };
        let mixed = Source::mixed_with(sine("A", 1.0, 1.0), sine("B", 2.0, 100.0), &search);
        assert_eq!(mixed.frequency(), Some(1.0));
        let peak = mixed.as_mixed().unwrap().peak();
        assert!(peak.is_approximate());
        assert_relative_eq!(peak.value(), 3.0);
    }

    #[test]
    fn coarse_count_scales_with_fastest_source() {
        let search = PeakSearch::default();
        assert_eq!(search.coarse_count(5.0, 15.0), Some(10_000));
        assert_eq!(search.coarse_count(1.0, 9_999.0), Some(319_968));
        assert_eq!(search.coarse_count(1.0, 1.0e5), None);
    }

    #[test]
    fn base_sources_flatten_across_nesting() {
        let a = sine("A", 1.0, 10.0);
        let b = sine("B", 1.0, 20.0);
        let c = Source::dc("C", 1.0, 0.0);
        let nested = (a.clone() + b.clone()) + c.clone();
        let names: Vec<String> =
            nested.base_sources().iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(nested.frequency(), Some(10.0));
    }

    #[test]
    fn operands_in_different_time_symbols_are_aligned() {
        let a = Source::ac("A", WaveformKind::Sine, 1.0, 0.0, 1.0, Symbol::new("t"), 0.0).unwrap();
        let b =
            Source::ac("B", WaveformKind::Sine, 1.0, 0.0, 1.0, Symbol::new("tau"), 0.0).unwrap();
        let mixed = a + b;
        assert_eq!(mixed.time_symbol(), &Symbol::new("t"));
        assert_relative_eq!(mixed.voltage_at(0.25).unwrap(), 2.0, epsilon = 1.0e-12);
        assert!(!mixed.symbolic_voltage().depends_on(&Symbol::new("tau")));
    }
}
