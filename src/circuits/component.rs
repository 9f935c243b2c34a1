use std::fmt;

use crate::constants::{angular_frequency, DEFAULT_FREQUENCY_SYMBOL};
use crate::errors::{ReactanceError, Result};
use crate::math::{checked_recip, CScalar, Scalar};
use crate::symbolic::{Expr, Symbol};

use super::network::Network;

/// Read contract shared by lumped components and composite networks.
///
/// Each quantity is available three ways: as an expression with only the
/// frequency symbol left free (`impedance`), as an expression in the
/// component symbols (`symbolic_impedance`), and as a number at a given
/// frequency in hertz (`impedance_at`).
pub trait Component {
    /// Human-readable identifier (e.g. `R1`).
    fn name(&self) -> &str;

    /// Impedance with component values substituted.
    fn impedance(&self) -> Result<Expr>;

    /// Admittance with component values substituted.
    fn admittance(&self) -> Result<Expr>;

    /// Impedance in terms of component symbols.
    fn symbolic_impedance(&self) -> Result<Expr>;

    /// Admittance in terms of component symbols.
    fn symbolic_admittance(&self) -> Result<Expr>;

    /// Impedance at `frequency_hz`.
    fn impedance_at(&self, frequency_hz: Scalar) -> Result<CScalar>;

    /// Admittance at `frequency_hz`.
    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar>;
}

fn omega_expr(frequency: Expr) -> Expr {
    Expr::real(2.0) * Expr::Pi * frequency
}

fn recip_at(z: CScalar, what: &str, name: &str) -> Result<CScalar> {
    checked_recip(z).ok_or_else(|| ReactanceError::division_by_zero(format!("{what} of {name}")))
}

/// Lumped resistor model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    name: String,
    symbol: Symbol,
    resistance: Scalar,
}

impl Resistor {
    /// Creates a resistor.
    #[must_use]
    pub fn new(name: impl Into<String>, resistance_ohms: Scalar) -> Self {
        let name = name.into();
        Self {
            symbol: Symbol::new(&name),
            name,
            resistance: resistance_ohms,
        }
    }

    /// Resistance in ohms.
    #[must_use]
    pub fn resistance(&self) -> Scalar {
        self.resistance
    }

    /// Symbol standing for the resistance.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl Component for Resistor {
    fn name(&self) -> &str {
        &self.name
    }

    fn impedance(&self) -> Result<Expr> {
        Ok(Expr::real(self.resistance))
    }

    fn admittance(&self) -> Result<Expr> {
        Expr::real(self.resistance).recip()
    }

    fn symbolic_impedance(&self) -> Result<Expr> {
        Ok(Expr::var(&self.symbol))
    }

    fn symbolic_admittance(&self) -> Result<Expr> {
        Expr::var(&self.symbol).recip()
    }

    fn impedance_at(&self, _frequency_hz: Scalar) -> Result<CScalar> {
        Ok(CScalar::new(self.resistance, 0.0))
    }

    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        recip_at(self.impedance_at(frequency_hz)?, "admittance", &self.name)
    }
}

/// Lumped capacitor model (ideal).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    name: String,
    symbol: Symbol,
    frequency: Symbol,
    capacitance: Scalar,
}

impl Capacitor {
    /// Creates a capacitor whose formulas use the default frequency symbol `f`.
    #[must_use]
    pub fn new(name: impl Into<String>, capacitance_f: Scalar) -> Self {
        Self::with_frequency(name, capacitance_f, Symbol::new(DEFAULT_FREQUENCY_SYMBOL))
    }

    /// Creates a capacitor bound to an explicit frequency symbol.
    #[must_use]
    pub fn with_frequency(
        name: impl Into<String>,
        capacitance_f: Scalar,
        frequency: Symbol,
    ) -> Self {
        let name = name.into();
        Self {
            symbol: Symbol::new(&name),
            name,
            frequency,
            capacitance: capacitance_f,
        }
    }

    /// Capacitance in farads.
    #[must_use]
    pub fn capacitance(&self) -> Scalar {
        self.capacitance
    }

    /// Frequency symbol used in the impedance formula.
    #[must_use]
    pub fn frequency_symbol(&self) -> &Symbol {
        &self.frequency
    }

    // -j/(ωC)
    fn impedance_of(&self, capacitance: Expr) -> Result<Expr> {
        let omega_c = omega_expr(Expr::var(&self.frequency)) * capacitance;
        Ok(-Expr::j() * omega_c.recip()?)
    }

    // jωC
    fn admittance_of(&self, capacitance: Expr) -> Expr {
        Expr::j() * omega_expr(Expr::var(&self.frequency)) * capacitance
    }
}

impl Component for Capacitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn impedance(&self) -> Result<Expr> {
        self.impedance_of(Expr::real(self.capacitance))
    }

    fn admittance(&self) -> Result<Expr> {
        Ok(self.admittance_of(Expr::real(self.capacitance)))
    }

    fn symbolic_impedance(&self) -> Result<Expr> {
        self.impedance_of(Expr::var(&self.symbol))
    }

    fn symbolic_admittance(&self) -> Result<Expr> {
        Ok(self.admittance_of(Expr::var(&self.symbol)))
    }

    fn impedance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        let y = self.admittance_at(frequency_hz)?;
        recip_at(y, "impedance", &self.name)
    }

    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        Ok(CScalar::new(0.0, angular_frequency(frequency_hz) * self.capacitance))
    }
}

/// Lumped inductor model (ideal).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    name: String,
    symbol: Symbol,
    frequency: Symbol,
    inductance: Scalar,
}

impl Inductor {
    /// Creates an inductor whose formulas use the default frequency symbol `f`.
    #[must_use]
    pub fn new(name: impl Into<String>, inductance_h: Scalar) -> Self {
        Self::with_frequency(name, inductance_h, Symbol::new(DEFAULT_FREQUENCY_SYMBOL))
    }

    /// Creates an inductor bound to an explicit frequency symbol.
    #[must_use]
    pub fn with_frequency(
        name: impl Into<String>,
        inductance_h: Scalar,
        frequency: Symbol,
    ) -> Self {
        let name = name.into();
        Self {
            symbol: Symbol::new(&name),
            name,
            frequency,
            inductance: inductance_h,
        }
    }

    /// Inductance in henries.
    #[must_use]
    pub fn inductance(&self) -> Scalar {
        self.inductance
    }

    /// Frequency symbol used in the impedance formula.
    #[must_use]
    pub fn frequency_symbol(&self) -> &Symbol {
        &self.frequency
    }

    // jωL
    fn impedance_of(&self, inductance: Expr) -> Expr {
        Expr::j() * omega_expr(Expr::var(&self.frequency)) * inductance
    }

    // -j/(ωL)
    fn admittance_of(&self, inductance: Expr) -> Result<Expr> {
        let omega_l = omega_expr(Expr::var(&self.frequency)) * inductance;
        Ok(-Expr::j() * omega_l.recip()?)
    }
}

impl Component for Inductor {
    fn name(&self) -> &str {
        &self.name
    }

    fn impedance(&self) -> Result<Expr> {
        Ok(self.impedance_of(Expr::real(self.inductance)))
    }

    fn admittance(&self) -> Result<Expr> {
        self.admittance_of(Expr::real(self.inductance))
    }

    fn symbolic_impedance(&self) -> Result<Expr> {
        Ok(self.impedance_of(Expr::var(&self.symbol)))
    }

    fn symbolic_admittance(&self) -> Result<Expr> {
        self.admittance_of(Expr::var(&self.symbol))
    }

    fn impedance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        Ok(CScalar::new(0.0, angular_frequency(frequency_hz) * self.inductance))
    }

    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        let z = self.impedance_at(frequency_hz)?;
        recip_at(z, "admittance", &self.name)
    }
}

/// Closed set of everything that can sit inside a [`Network`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Resistor leaf.
    Resistor(Resistor),
    /// Capacitor leaf.
    Capacitor(Capacitor),
    /// Inductor leaf.
    Inductor(Inductor),
    /// Nested network.
    Network(Network),
}

impl Element {
    fn as_component(&self) -> &dyn Component {
        match self {
            Self::Resistor(r) => r,
            Self::Capacitor(c) => c,
            Self::Inductor(l) => l,
            Self::Network(n) => n,
        }
    }
}

impl Component for Element {
    fn name(&self) -> &str {
        self.as_component().name()
    }

    fn impedance(&self) -> Result<Expr> {
        self.as_component().impedance()
    }

    fn admittance(&self) -> Result<Expr> {
        self.as_component().admittance()
    }

    fn symbolic_impedance(&self) -> Result<Expr> {
        self.as_component().symbolic_impedance()
    }

    fn symbolic_admittance(&self) -> Result<Expr> {
        self.as_component().symbolic_admittance()
    }

    fn impedance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        self.as_component().impedance_at(frequency_hz)
    }

    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        self.as_component().admittance_at(frequency_hz)
    }
}

impl From<Resistor> for Element {
    fn from(r: Resistor) -> Self {
        Self::Resistor(r)
    }
}

impl From<Capacitor> for Element {
    fn from(c: Capacitor) -> Self {
        Self::Capacitor(c)
    }
}

impl From<Inductor> for Element {
    fn from(l: Inductor) -> Self {
        Self::Inductor(l)
    }
}

impl From<Network> for Element {
    fn from(n: Network) -> Self {
        Self::Network(n)
    }
}

impl fmt::Display for Resistor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resistor {} = {}", self.name, self.resistance)
    }
}

impl fmt::Display for Capacitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capacitor {} = {}", self.name, self.capacitance)
    }
}

impl fmt::Display for Inductor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Inductor {} = {}", self.name, self.inductance)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resistor(r) => r.fmt(f),
            Self::Capacitor(c) => c.fmt(f),
            Self::Inductor(l) => l.fmt(f),
            Self::Network(n) => n.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::symbolic::Bindings;

    #[test]
    fn resistor_impedance_is_real() {
        let r = Resistor::new("R1", 100.0);
        let z = r.impedance_at(1.0).unwrap();
        assert_relative_eq!(z.re, 100.0);
        assert_relative_eq!(z.im, 0.0);
        assert_relative_eq!(r.admittance_at(1.0).unwrap().re, 0.01);
    }

    #[test]
    fn capacitor_impedance_matches_formula() {
        let c = Capacitor::new("C", 1e-6);
        let z = c.impedance_at(1000.0).unwrap();
        assert_relative_eq!(z.re, 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(z.im, -1.0 / (2.0 * PI * 1000.0 * 1e-6), max_relative = 1.0e-12);
        assert_relative_eq!(z.im, -159.155, max_relative = 1.0e-5);
    }

    #[test]
    fn capacitor_expression_agrees_with_numeric_value() {
        let f = Symbol::new("f");
        let c = Capacitor::with_frequency("C", 1e-6, f.clone());
        let z = c.impedance().unwrap().lambdify(&f).call(1000.0).unwrap();
        assert_relative_eq!(z.im, c.impedance_at(1000.0).unwrap().im, max_relative = 1.0e-12);
    }

    #[test]
    fn inductor_symbolic_forms_are_reciprocal() {
        let f = Symbol::new("f");
        let l = Inductor::with_frequency("L1", 10e-3, f.clone());
        let env = Bindings::new().with(&f, 50.0).with(l.frequency_symbol(), 50.0);
        let env = env.with(&Symbol::new("L1"), 10e-3);
        let z = l.symbolic_impedance().unwrap().eval(&env).unwrap();
        let y = l.symbolic_admittance().unwrap().eval(&env).unwrap();
        assert_relative_eq!((z * y).re, 1.0, epsilon = 1.0e-12);
        assert_relative_eq!((z * y).im, 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn zero_valued_resistor_has_no_admittance() {
        let r = Resistor::new("R0", 0.0);
        assert!(r.admittance().unwrap_err().is_domain());
        assert!(r.admittance_at(10.0).unwrap_err().is_domain());
    }

    #[test]
    fn capacitor_at_dc_has_no_finite_impedance() {
        let c = Capacitor::new("C1", 1e-6);
        assert!(matches!(
            c.impedance_at(0.0),
            Err(ReactanceError::DivisionByZero { .. })
        ));
        assert_relative_eq!(c.admittance_at(0.0).unwrap().norm(), 0.0);
    }

    #[test]
    fn display_names_kind_and_value() {
        assert_eq!(Resistor::new("R1", 100.0).to_string(), "Resistor R1 = 100");
        assert_eq!(Element::from(Inductor::new("L1", 0.5)).to_string(), "Inductor L1 = 0.5");
    }
}
