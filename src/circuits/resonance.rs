//! Resonance and extremum frequencies located by root-finding on symbolic derivatives.
//!
//! The magnitude of an impedance `Z(f)` is stationary where
//! `|Z|·d|Z|/df = re(conj(Z)·dZ/df)` vanishes. The right-hand side is smooth
//! even where `|Z|` has a kink (a lossless series resonance drives `|Z|` to
//! zero), so it is the function handed to the root finder.
//!
//! The root finder walks a geometric grid upward from a positive seed until
//! the function changes sign, then bisects the bracket. Both phases are
//! bounded; exhausting either yields [`ReactanceError::NotConvergent`].

use tracing::debug;

use crate::errors::{ReactanceError, Result};
use crate::math::Scalar;
use crate::symbolic::{Expr, Symbol};

use super::component::Component;
use super::network::Network;

/// Search parameters for the bracketing root finder.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResonanceOptions {
    /// First frequency sampled, in hertz. Must be positive; zero is excluded by reactive formulas.
    pub seed: Scalar,
    /// Ratio between consecutive sample frequencies.
    pub growth: Scalar,
    /// Maximum number of samples while looking for a sign change.
    pub max_scan_steps: usize,
    /// Maximum number of bisection steps once a bracket is found.
    pub max_iterations: usize,
    /// Relative bracket width at which bisection stops.
    pub tolerance: Scalar,
}

impl Default for ResonanceOptions {
    fn default() -> Self {
        Self {
            seed: 1.0e-3,
            growth: 1.05,
            max_scan_steps: 1_000,
            max_iterations: 200,
            tolerance: 1.0e-12,
        }
    }
}

impl ResonanceOptions {
    /// Default options starting the scan at `seed` hertz.
    #[must_use]
    pub fn from_seed(seed: Scalar) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// What a bisected sign change turned out to be.
enum Crossing {
    /// `g` passes through zero.
    Root(Scalar),
    /// `|g|` grows without bound across the bracket.
    Pole(Scalar),
}

/// Sign-change root of `g` at or above `options.seed`.
///
/// Probes where `g` fails to evaluate or is not finite are skipped. A sign
/// change across a pole is not a root; the scan continues past it.
pub fn find_root<G>(g: G, options: &ResonanceOptions) -> Result<Scalar>
where
    G: Fn(Scalar) -> Result<Scalar>,
{
    scan(g, options, false)
}

fn scan<G>(g: G, options: &ResonanceOptions, accept_poles: bool) -> Result<Scalar>
where
    G: Fn(Scalar) -> Result<Scalar>,
{
    let sample = |x: Scalar| g(x).ok().filter(|v| v.is_finite());
    let seed = if options.seed > 0.0 { options.seed } else { Scalar::EPSILON };
    let growth = if options.growth > 1.0 { options.growth } else { 1.05 };

    let mut previous: Option<(Scalar, Scalar)> = None;
    let mut x = seed;
    for _ in 0..options.max_scan_steps {
        if let Some(value) = sample(x) {
            if value == 0.0 {
                debug!(root = x, "sample landed on a root");
                return Ok(x);
            }
            if let Some((x_prev, v_prev)) = previous {
                if v_prev.signum() != value.signum() {
                    debug!(lower = x_prev, upper = x, "bracketed sign change");
                    match bisect(&sample, (x_prev, v_prev), (x, value), options)? {
                        Crossing::Root(root) => return Ok(root),
                        Crossing::Pole(pole) if accept_poles => return Ok(pole),
                        Crossing::Pole(pole) => debug!(pole, "skipping pole"),
                    }
                }
            }
            previous = Some((x, value));
        }
        x *= growth;
    }
    Err(ReactanceError::NotConvergent {
        iterations: options.max_scan_steps,
        last: x,
    })
}

fn bisect<P>(
    sample: &P,
    mut lower: (Scalar, Scalar),
    mut upper: (Scalar, Scalar),
    options: &ResonanceOptions,
) -> Result<Crossing>
where
    P: Fn(Scalar) -> Option<Scalar>,
{
    // a root shrinks |g| below the scan endpoints, a pole grows it past them
    let bound = lower.1.abs().max(upper.1.abs());
    for iteration in 0..options.max_iterations {
        let mid = 0.5 * (lower.0 + upper.0);
        if (upper.0 - lower.0) <= options.tolerance * mid.abs() {
            return Ok(match sample(mid) {
                Some(value) if value.abs() <= bound => {
                    debug!(root = mid, iteration, "bisection converged");
                    Crossing::Root(mid)
                }
                _ => Crossing::Pole(mid),
            });
        }
        let Some(value) = sample(mid) else {
            return Ok(Crossing::Pole(mid));
        };
        if value == 0.0 {
            return Ok(Crossing::Root(mid));
        }
        if value.signum() == lower.1.signum() {
            lower = (mid, value);
        } else {
            upper = (mid, value);
        }
    }
    Err(ReactanceError::NotConvergent {
        iterations: options.max_iterations,
        last: 0.5 * (lower.0 + upper.0),
    })
}

/// `|E|·d|E|/dx` as an expression, i.e. `re(conj(E)·dE/dx)`.
#[must_use]
pub fn magnitude_slope(expr: &Expr, var: &Symbol) -> Expr {
    (expr.clone().conj() * expr.diff(var)).re()
}

/// Root of `magnitude_slope(expr, var)` over positive `var`.
///
/// A pole of the slope marks a point where `|expr|` diverges, which is an
/// extremum too, so it is returned like a root. An expression that does not
/// depend on `var` has no isolated stationary point and is reported as not
/// convergent without scanning.
pub fn stationary_point(expr: &Expr, var: &Symbol, options: &ResonanceOptions) -> Result<Scalar> {
    let slope = magnitude_slope(expr, var);
    if !slope.depends_on(var) {
        return Err(ReactanceError::NotConvergent {
            iterations: 0,
            last: options.seed,
        });
    }
    let slope = slope.lambdify(var);
    scan(|x| slope.call_real(x), options, true)
}

/// Frequency at which `|Z|` of `component` is stationary.
pub fn resonance<C>(component: &C, frequency: &Symbol, options: &ResonanceOptions) -> Result<Scalar>
where
    C: Component + ?Sized,
{
    stationary_point(&component.impedance()?, frequency, options)
}

/// Frequency minimising `|Z|`, found through the stationary point of `|Y|`.
pub fn minimum_impedance<C>(
    component: &C,
    frequency: &Symbol,
    options: &ResonanceOptions,
) -> Result<Scalar>
where
    C: Component + ?Sized,
{
    stationary_point(&component.admittance()?, frequency, options)
}

/// Frequency at which the reactance `im(Z)` crosses zero.
pub fn reactance_zero<C>(
    component: &C,
    frequency: &Symbol,
    options: &ResonanceOptions,
) -> Result<Scalar>
where
    C: Component + ?Sized,
{
    let reactance = component.impedance()?.im().lambdify(frequency);
    find_root(|x| reactance.call_real(x), options)
}

impl Network {
    /// Frequency at which `|Z|` is stationary, scanning from the default seed.
    pub fn resonance(&self, frequency: &Symbol) -> Result<Scalar> {
        resonance(self, frequency, &ResonanceOptions::default())
    }

    /// [`Network::resonance`] with explicit search options.
    pub fn resonance_with(&self, frequency: &Symbol, options: &ResonanceOptions) -> Result<Scalar> {
        resonance(self, frequency, options)
    }

    /// Frequency minimising `|Z|`.
    pub fn minimum_impedance(&self, frequency: &Symbol) -> Result<Scalar> {
        minimum_impedance(self, frequency, &ResonanceOptions::default())
    }

    /// Frequency at which the reactance vanishes.
    pub fn reactance_zero(&self, frequency: &Symbol) -> Result<Scalar> {
        reactance_zero(self, frequency, &ResonanceOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::component::{Capacitor, Element, Inductor, Resistor};
    use crate::constants::lc_resonance;

    fn series_lc(f: &Symbol) -> Network {
        Network::series(
            "LC",
            [
                Element::from(Inductor::with_frequency("L1", 10e-3, f.clone())),
                Capacitor::with_frequency("C1", 20e-6, f.clone()).into(),
            ],
        )
    }

    #[test]
    fn series_lc_resonance() {
        let f = Symbol::new("f");
        let fr = series_lc(&f).resonance(&f).unwrap();
        assert_relative_eq!(fr, 355.88, max_relative = 1.0e-4);
        assert_relative_eq!(fr, lc_resonance(10e-3, 20e-6), max_relative = 1.0e-9);
    }

    #[test]
    fn parallel_lc_resonance_maximises_impedance() {
        let f = Symbol::new("f");
        let tank = Network::parallel(
            "tank",
            [
                Element::from(Inductor::with_frequency("L1", 1e-3, f.clone())),
                Capacitor::with_frequency("C1", 1e-6, f.clone()).into(),
            ],
        );
        let fr = tank.resonance(&f).unwrap();
        assert_relative_eq!(fr, lc_resonance(1e-3, 1e-6), max_relative = 1.0e-9);
    }

    #[test]
    fn minimum_impedance_of_damped_series_rlc() {
        let f = Symbol::new("f");
        let mut network = series_lc(&f);
        network.add_component(Resistor::new("R1", 100.0));
        let fmin = network.minimum_impedance(&f).unwrap();
        assert_relative_eq!(fmin, lc_resonance(10e-3, 20e-6), max_relative = 1.0e-9);
    }

    #[test]
    fn reactance_crosses_zero_at_resonance() {
        let f = Symbol::new("f");
        let fr = series_lc(&f).reactance_zero(&f).unwrap();
        assert_relative_eq!(fr, lc_resonance(10e-3, 20e-6), max_relative = 1.0e-9);
    }

    #[test]
    fn monotonic_magnitude_does_not_converge() {
        let f = Symbol::new("f");
        let network = Network::series(
            "RC",
            [
                Element::from(Resistor::new("R1", 100.0)),
                Capacitor::with_frequency("C1", 1e-6, f.clone()).into(),
            ],
        );
        let options = ResonanceOptions {
            max_scan_steps: 50,
            ..ResonanceOptions::default()
        };
        let err = network.resonance_with(&f, &options).unwrap_err();
        assert!(matches!(err, ReactanceError::NotConvergent { iterations: 50, .. }));
    }

    #[test]
    fn frequency_independent_network_has_no_resonance() {
        let f = Symbol::new("f");
        let network = Network::series("R", [Resistor::new("R1", 100.0)]);
        assert!(matches!(
            network.resonance(&f),
            Err(ReactanceError::NotConvergent { iterations: 0, .. })
        ));
    }

    #[test]
    fn seed_above_the_root_fails_softly_and_retry_succeeds() {
        let f = Symbol::new("f");
        let network = series_lc(&f);
        let options = ResonanceOptions {
            max_scan_steps: 100,
            ..ResonanceOptions::from_seed(1.0e3)
        };
        assert!(network.resonance_with(&f, &options).is_err());
        let retry = network.resonance_with(&f, &ResonanceOptions::from_seed(1.0)).unwrap();
        assert_relative_eq!(retry, lc_resonance(10e-3, 20e-6), max_relative = 1.0e-9);
    }

    #[test]
    fn reactance_pole_of_parallel_tank_is_not_a_zero() {
        let f = Symbol::new("f");
        let tank = Network::parallel(
            "tank",
            [
                Element::from(Inductor::with_frequency("L1", 1e-3, f.clone())),
                Capacitor::with_frequency("C1", 1e-6, f.clone()).into(),
            ],
        );
        assert!(matches!(
            tank.reactance_zero(&f),
            Err(ReactanceError::NotConvergent { .. })
        ));
    }

    #[test]
    fn find_root_steps_over_poles() {
        let root = find_root(
            |x| Ok((x - 2.0) / (x - 1.0)),
            &ResonanceOptions::from_seed(0.1),
        )
        .unwrap();
        assert_relative_eq!(root, 2.0, max_relative = 1.0e-10);
    }

    #[test]
    fn find_root_on_plain_function() {
        let root = find_root(|x| Ok(x * x - 2.0), &ResonanceOptions::default()).unwrap();
        assert_relative_eq!(root, std::f64::consts::SQRT_2, max_relative = 1.0e-10);
    }
}
