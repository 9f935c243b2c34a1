//! Two-terminal circuits resolved with the superposition theorem.

use std::fmt;

use tracing::{trace, warn};

use crate::errors::{ReactanceError, Result};
use crate::math::{is_finite, CScalar, Scalar};
use crate::symbolic::{Bindings, Expr, Symbol};

use super::component::Component;
use super::network::Network;
use super::sources::Source;

/// Which terminal an elementary source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Drives current forward through the network.
    First,
    /// Drives current backward through the network.
    Second,
}

impl Terminal {
    const fn sign(self) -> Scalar {
        match self {
            Self::First => 1.0,
            Self::Second => -1.0,
        }
    }
}

/// Current driven by a single elementary source with all others grounded.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialCurrent {
    /// Name of the elementary source.
    pub source: String,
    /// Terminal the source sits on.
    pub terminal: Terminal,
    /// Frequency the network was evaluated at (0 for DC).
    pub frequency: Scalar,
    /// Network admittance at that frequency.
    pub admittance: CScalar,
    /// Signed current as a function of the circuit's time symbol.
    pub current: Expr,
}

/// A network driven by one source at each terminal.
#[derive(Debug, Clone)]
pub struct Circuit {
    source1: Source,
    network: Network,
    source2: Source,
}

impl Circuit {
    /// Connects `network` between `source1` and `source2`.
    #[must_use]
    pub fn new(source1: Source, network: Network, source2: Source) -> Self {
        Self {
            source1,
            network,
            source2,
        }
    }

    /// Source on the first terminal.
    #[must_use]
    pub fn source1(&self) -> &Source {
        &self.source1
    }

    /// Source on the second terminal.
    #[must_use]
    pub fn source2(&self) -> &Source {
        &self.source2
    }

    /// Network between the terminals.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable network access for topology edits.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Time symbol of voltages and currents (that of `source1`).
    #[must_use]
    pub fn time_symbol(&self) -> &Symbol {
        self.source1.time_symbol()
    }

    /// Net driving voltage `v1(t) − v2(t)`.
    #[must_use]
    pub fn voltage(&self) -> Expr {
        self.source1.voltage() - self.source2.voltage_in(self.time_symbol())
    }

    fn base_sources(&self) -> impl Iterator<Item = (Terminal, Source)> + '_ {
        let first = self.source1.base_sources().into_iter().map(|s| (Terminal::First, s));
        let second = self.source2.base_sources().into_iter().map(|s| (Terminal::Second, s));
        first.chain(second)
    }

    /// Distinct frequencies the network is driven at, ascending.
    ///
    /// `[0.0]` when every elementary source is DC; otherwise the AC frequencies only.
    #[must_use]
    pub fn operating_frequencies(&self) -> Vec<Scalar> {
        let mut out: Vec<Scalar> = self
            .base_sources()
            .filter_map(|(_, s)| s.frequency())
            .filter(|&hz| hz > 0.0)
            .collect();
        out.sort_by(Scalar::total_cmp);
        out.dedup();
        if out.is_empty() {
            out.push(0.0);
        }
        out
    }

    /// Per-source currents, one for every elementary source on either terminal.
    ///
    /// At DC a network whose admittance is undefined (a zero-impedance short) or
    /// not finite contributes no current; at any other frequency a division by
    /// zero is returned as an error.
    pub fn partial_currents(&self) -> Result<Vec<PartialCurrent>> {
        let time = self.time_symbol().clone();
        let mut out = Vec::new();
        for (terminal, source) in self.base_sources() {
            let frequency = source.frequency().unwrap_or(0.0);
            let admittance = if frequency == 0.0 {
                match self.network.admittance_at(0.0) {
                    Ok(y) if is_finite(y) => y,
                    Ok(_) | Err(ReactanceError::DivisionByZero { .. }) => {
                        warn!(
                            network = self.network.name(),
                            source = source.name(),
                            "admittance undefined at DC, source contributes no current"
                        );
                        CScalar::default()
                    }
                    Err(other) => return Err(other),
                }
            } else {
                self.network.admittance_at(frequency)?
            };
            let current = Expr::real(terminal.sign()) * source.voltage_in(&time) * admittance;
            trace!(source = source.name(), frequency, %current, "partial current");
            out.push(PartialCurrent {
                source: source.name().to_owned(),
                terminal,
                frequency,
                admittance,
                current,
            });
        }
        Ok(out)
    }

    /// Total current: the sum of all partial currents.
    pub fn current(&self) -> Result<Expr> {
        Ok(self
            .partial_currents()?
            .into_iter()
            .fold(Expr::zero(), |acc, partial| acc + partial.current))
    }

    /// Total current at `t` seconds.
    pub fn current_at(&self, t: Scalar) -> Result<CScalar> {
        self.current()?.eval(&Bindings::new().with(self.time_symbol(), t))
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit")?;
        writeln!(f, "  {}", self.source1)?;
        writeln!(f, "  {}", self.network.to_string().replace('\n', "\n  "))?;
        write!(f, "  {}", self.source2)
    }
}
