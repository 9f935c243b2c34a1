use std::fmt;
use std::str::FromStr;

use crate::errors::{ReactanceError, Result};
use crate::math::{checked_recip, CScalar, Scalar};
use crate::symbolic::Expr;

use super::component::{Component, Element};

/// Connection topology for a collection of components.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Series connection (impedances add linearly).
    Series,
    /// Parallel connection (admittances add linearly).
    Parallel,
}

impl ConnectionKind {
    /// Lower-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Parallel => "parallel",
        }
    }

    /// True when `quantity` adds linearly under this connection.
    const fn sums_directly(self, quantity: Quantity) -> bool {
        matches!(
            (self, quantity),
            (Self::Series, Quantity::Impedance) | (Self::Parallel, Quantity::Admittance)
        )
    }
}

impl FromStr for ConnectionKind {
    type Err = ReactanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" | "s" => Ok(Self::Series),
            "parallel" | "p" => Ok(Self::Parallel),
            _ => Err(ReactanceError::InvalidConnection(s.to_owned())),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Impedance,
    Admittance,
}

impl Quantity {
    const fn label(self) -> &'static str {
        match self {
            Self::Impedance => "impedance",
            Self::Admittance => "admittance",
        }
    }
}

/// Series or parallel composition of elements and nested networks.
///
/// Every read folds over the current members; nothing is cached, so editing
/// the members through [`Network::members_mut`] is reflected immediately.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    name: String,
    connection: ConnectionKind,
    members: Vec<Element>,
}

impl Network {
    /// Creates a network from an ordered list of members.
    #[must_use]
    pub fn new<I, E>(name: impl Into<String>, members: I, connection: ConnectionKind) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self {
            name: name.into(),
            connection,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a series network.
    #[must_use]
    pub fn series<I, E>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self::new(name, members, ConnectionKind::Series)
    }

    /// Creates a parallel network.
    #[must_use]
    pub fn parallel<I, E>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self::new(name, members, ConnectionKind::Parallel)
    }

    /// Creates a network from a textual mode (`"series"` or `"parallel"`).
    pub fn with_mode<I, E>(name: impl Into<String>, members: I, mode: &str) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Ok(Self::new(name, members, mode.parse()?))
    }

    /// Appends a member.
    pub fn add_component(&mut self, member: impl Into<Element>) {
        self.members.push(member.into());
    }

    /// Current members, in order.
    #[must_use]
    pub fn members(&self) -> &[Element] {
        &self.members
    }

    /// Mutable access to the members for in-place topology edits.
    pub fn members_mut(&mut self) -> &mut Vec<Element> {
        &mut self.members
    }

    /// Returns the connection topology.
    #[must_use]
    pub fn connection_kind(&self) -> ConnectionKind {
        self.connection
    }

    /// Switches between series and parallel.
    pub fn set_connection_kind(&mut self, connection: ConnectionKind) {
        self.connection = connection;
    }

    /// Returns the number of members in the network.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true when no members are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn combine_expr<F>(&self, quantity: Quantity, read: F) -> Result<Expr>
    where
        F: Fn(&Element) -> Result<Expr>,
    {
        if self.connection.sums_directly(quantity) {
            return self
                .members
                .iter()
                .try_fold(Expr::zero(), |acc, member| Ok(acc + read(member)?));
        }
        let reciprocal_sum = self
            .members
            .iter()
            .try_fold(Expr::zero(), |acc, member| -> Result<Expr> {
                Ok(acc + read(member)?.recip()?)
            })?;
        reciprocal_sum.recip().map_err(|_| self.zero_divisor(quantity))
    }

    fn combine_at<F>(&self, quantity: Quantity, read: F) -> Result<CScalar>
    where
        F: Fn(&Element) -> Result<CScalar>,
    {
        if self.connection.sums_directly(quantity) {
            return self
                .members
                .iter()
                .try_fold(CScalar::default(), |acc, member| Ok(acc + read(member)?));
        }
        let mut reciprocal_sum = CScalar::default();
        for member in &self.members {
            let value = read(member)?;
            reciprocal_sum += checked_recip(value).ok_or_else(|| {
                ReactanceError::division_by_zero(format!(
                    "{} of {} in {}",
                    quantity.label(),
                    member.name(),
                    self.name
                ))
            })?;
        }
        checked_recip(reciprocal_sum).ok_or_else(|| self.zero_divisor(quantity))
    }

    fn zero_divisor(&self, quantity: Quantity) -> ReactanceError {
        ReactanceError::division_by_zero(format!(
            "{} network {} {}",
            self.connection,
            self.name,
            quantity.label()
        ))
    }
}

impl Component for Network {
    fn name(&self) -> &str {
        &self.name
    }

    fn impedance(&self) -> Result<Expr> {
        self.combine_expr(Quantity::Impedance, |m| m.impedance())
    }

    fn admittance(&self) -> Result<Expr> {
        self.combine_expr(Quantity::Admittance, |m| m.admittance())
    }

    fn symbolic_impedance(&self) -> Result<Expr> {
        self.combine_expr(Quantity::Impedance, |m| m.symbolic_impedance())
    }

    fn symbolic_admittance(&self) -> Result<Expr> {
        self.combine_expr(Quantity::Admittance, |m| m.symbolic_admittance())
    }

    fn impedance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        self.combine_at(Quantity::Impedance, |m| m.impedance_at(frequency_hz))
    }

    fn admittance_at(&self, frequency_hz: Scalar) -> Result<CScalar> {
        self.combine_at(Quantity::Admittance, |m| m.admittance_at(frequency_hz))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members.iter().map(ToString::to_string).collect();
        let equation =
            |e: Result<Expr>| e.map_or_else(|err| format!("undefined ({err})"), |e| e.to_string());
        writeln!(f, "Network {} with members [{}]", self.name, members.join(", "))?;
        writeln!(f, "    Configuration = {}", self.connection)?;
        writeln!(f, "    Impedance: {}", equation(self.symbolic_impedance()))?;
        write!(f, "    Admittance: {}", equation(self.symbolic_admittance()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::circuits::component::{Capacitor, Inductor, Resistor};
    use crate::symbolic::{Bindings, Symbol};

    #[test]
    fn series_network_adds_impedances() {
        let network =
            Network::series("Z", [Resistor::new("R1", 100.0), Resistor::new("R2", 100.0)]);
        let z = network.impedance_at(1.0).unwrap();
        assert_relative_eq!(z.re, 200.0);
        assert_eq!(network.impedance().unwrap(), Expr::real(200.0));
    }

    #[test]
    fn parallel_network_combines_admittance() {
        let network =
            Network::parallel("Z", [Resistor::new("R1", 100.0), Resistor::new("R2", 100.0)]);
        assert_relative_eq!(network.impedance_at(1.0).unwrap().re, 50.0, epsilon = 1.0e-12);
        assert_relative_eq!(network.admittance_at(1.0).unwrap().re, 0.02, epsilon = 1.0e-15);
        let z = network.impedance().unwrap().eval_const().unwrap();
        assert_relative_eq!(z.re, 50.0, epsilon = 1.0e-12);
    }

    #[test]
    fn textual_mode_is_validated() {
        let err = Network::with_mode("Z", [Resistor::new("R1", 1.0)], "diagonal").unwrap_err();
        assert!(err.is_configuration());
        let ok = Network::with_mode("Z", [Resistor::new("R1", 1.0)], "Parallel").unwrap();
        assert_eq!(ok.connection_kind(), ConnectionKind::Parallel);
    }

    #[test]
    fn single_member_matches_member_in_either_mode() {
        let c = Capacitor::new("C1", 1e-6);
        for kind in [ConnectionKind::Series, ConnectionKind::Parallel] {
            let network = Network::new("N", [c.clone()], kind);
            let z = network.impedance_at(1.0e3).unwrap();
            let expected = c.impedance_at(1.0e3).unwrap();
            assert_relative_eq!(z.im, expected.im, max_relative = 1.0e-12);
            assert_relative_eq!(z.re, 0.0, epsilon = 1.0e-9);
        }
    }

    #[test]
    fn nested_networks_are_associative() {
        let a = Resistor::new("A", 10.0);
        let b = Inductor::new("B", 1e-3);
        let c = Capacitor::new("C", 1e-6);
        let left = Network::series(
            "L",
            [
                Element::from(Network::series("AB", [Element::from(a.clone()), b.clone().into()])),
                c.clone().into(),
            ],
        );
        let right = Network::series(
            "R",
            [
                Element::from(a.clone()),
                Network::series("BC", [Element::from(b.clone()), c.clone().into()]).into(),
            ],
        );
        let flat = Network::series("F", [Element::from(a), b.into(), c.into()]);
        let z_left = left.impedance_at(2.0e3).unwrap();
        let z_right = right.impedance_at(2.0e3).unwrap();
        let z_flat = flat.impedance_at(2.0e3).unwrap();
        assert_relative_eq!(z_left.re, z_flat.re, max_relative = 1.0e-12);
        assert_relative_eq!(z_left.im, z_flat.im, max_relative = 1.0e-12);
        assert_relative_eq!(z_right.im, z_flat.im, max_relative = 1.0e-12);
    }

    #[test]
    fn member_edits_change_subsequent_reads() {
        let mut network = Network::series("Z", [Resistor::new("R1", 100.0)]);
        assert_relative_eq!(network.impedance_at(0.0).unwrap().re, 100.0);
        network.add_component(Resistor::new("R2", 50.0));
        assert_relative_eq!(network.impedance_at(0.0).unwrap().re, 150.0);
        network.members_mut().remove(0);
        assert_relative_eq!(network.impedance_at(0.0).unwrap().re, 50.0);
        network.set_connection_kind(ConnectionKind::Parallel);
        network.add_component(Resistor::new("R3", 50.0));
        assert_relative_eq!(network.impedance_at(0.0).unwrap().re, 25.0, epsilon = 1.0e-12);
    }

    #[test]
    fn zero_member_in_reciprocal_sum_propagates() {
        let network =
            Network::parallel("Z", [Resistor::new("R1", 100.0), Resistor::new("R0", 0.0)]);
        assert!(network.impedance_at(1.0).unwrap_err().is_domain());
        assert!(network.impedance().unwrap_err().is_domain());
    }

    #[test]
    fn empty_network_reciprocal_sum_is_undefined() {
        let network = Network::parallel("Z", Vec::<Element>::new());
        assert!(network.is_empty());
        assert!(network.impedance_at(1.0).is_err());
        assert_relative_eq!(network.admittance_at(1.0).unwrap().norm(), 0.0);
    }

    #[test]
    fn symbolic_impedance_evaluates_like_numeric() {
        let f = Symbol::new("f");
        let z1 = Network::series(
            "Z1",
            [
                Element::from(Resistor::new("R1", 100.0)),
                Inductor::with_frequency("L1", 10e-3, f.clone()).into(),
                Capacitor::with_frequency("C1", 20e-6, f.clone()).into(),
                Resistor::new("R2", 100.0).into(),
            ],
        );
        let z2 = Network::parallel(
            "Z2",
            [Element::from(Capacitor::with_frequency("C2", 10e-3, f.clone())), z1.into()],
        );
        let env = Bindings::new()
            .with(&f, 120.0)
            .with(&Symbol::new("R1"), 100.0)
            .with(&Symbol::new("R2"), 100.0)
            .with(&Symbol::new("L1"), 10e-3)
            .with(&Symbol::new("C1"), 20e-6)
            .with(&Symbol::new("C2"), 10e-3);
        let symbolic = z2.symbolic_impedance().unwrap().eval(&env).unwrap();
        let numeric = z2.impedance_at(120.0).unwrap();
        let partial = z2.impedance().unwrap().lambdify(&f).call(120.0).unwrap();
        assert_relative_eq!(symbolic.re, numeric.re, max_relative = 1.0e-9);
        assert_relative_eq!(symbolic.im, numeric.im, max_relative = 1.0e-9);
        assert_relative_eq!(partial.im, numeric.im, max_relative = 1.0e-9);
    }

    #[test]
    fn symbolic_forms_of_nested_network_are_reciprocal() {
        let f = Symbol::new("f");
        let inner = Network::series(
            "RL",
            [
                Element::from(Resistor::new("R1", 100.0)),
                Inductor::with_frequency("L1", 10e-3, f.clone()).into(),
            ],
        );
        let outer = Network::parallel(
            "Z",
            [Element::from(Capacitor::with_frequency("C1", 20e-6, f.clone())), inner.into()],
        );
        let env = Bindings::new()
            .with(&f, 300.0)
            .with(&Symbol::new("R1"), 100.0)
            .with(&Symbol::new("L1"), 10e-3)
            .with(&Symbol::new("C1"), 20e-6);
        let z = outer.symbolic_impedance().unwrap().eval(&env).unwrap();
        let y = outer.symbolic_admittance().unwrap().eval(&env).unwrap();
        let product = z * y;
        assert_relative_eq!(product.re, 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(product.im, 0.0, epsilon = 1.0e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn composite_types_are_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<Element>();
        assert_serde::<Network>();
        assert_serde::<crate::circuits::Source>();
    }

    #[test]
    fn display_lists_members_and_equations() {
        let network =
            Network::series("Z1", [Resistor::new("R1", 100.0), Resistor::new("R2", 50.0)]);
        let text = network.to_string();
        assert!(text.contains("Network Z1 with members [Resistor R1 = 100, Resistor R2 = 50]"));
        assert!(text.contains("Configuration = series"));
        assert!(text.contains("Impedance: R1 + R2"));
    }

    fn leaf(kind: u8, value: f64) -> Element {
        match kind % 3 {
            0 => Resistor::new("R", value).into(),
            1 => Capacitor::new("C", value * 1e-9).into(),
            _ => Inductor::new("L", value * 1e-6).into(),
        }
    }

    proptest! {
        #[test]
        fn impedance_times_admittance_is_one(
            kinds in prop::collection::vec(0u8..3, 1..5),
            values in prop::collection::vec(1.0_f64..1.0e3, 5),
            parallel in any::<bool>(),
            hz in 1.0_f64..1.0e6,
        ) {
            let members: Vec<Element> =
                kinds.iter().zip(&values).map(|(&k, &v)| leaf(k, v)).collect();
            let kind = if parallel { ConnectionKind::Parallel } else { ConnectionKind::Series };
            let network = Network::new("N", members, kind);
            if let (Ok(z), Ok(y)) = (network.impedance_at(hz), network.admittance_at(hz)) {
                let product = z * y;
                prop_assert!((product.re - 1.0).abs() < 1.0e-6);
                prop_assert!(product.im.abs() < 1.0e-6);
            }
        }

        #[test]
        fn series_grouping_does_not_matter(
            kinds in prop::collection::vec(0u8..3, 3),
            values in prop::collection::vec(1.0_f64..1.0e3, 3),
            hz in 1.0_f64..1.0e5,
        ) {
            let [a, b, c]: [Element; 3] = [
                leaf(kinds[0], values[0]),
                leaf(kinds[1], values[1]),
                leaf(kinds[2], values[2]),
            ];
            let nested = Network::series(
                "N",
                [Element::from(Network::series("AB", [a.clone(), b.clone()])), c.clone()],
            );
            let flat = Network::series("F", [a, b, c]);
            let (zn, zf) = (nested.impedance_at(hz).unwrap(), flat.impedance_at(hz).unwrap());
            prop_assert!((zn - zf).norm() <= 1.0e-9 * zf.norm().max(1.0));
        }
    }
}
