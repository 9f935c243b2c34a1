//! Symbolic differentiation with respect to a real-valued symbol.

use super::expr::{Expr, Func, Symbol};

impl Expr {
    /// Derivative of the expression with respect to `var`.
    ///
    /// `var` is treated as real, so `d|u| = re(conj(u)·u') / |u|` and
    /// conjugation, `re` and `im` commute with differentiation. `floor` is
    /// piecewise constant and differentiates to zero.
    #[must_use]
    pub fn diff(&self, var: &Symbol) -> Self {
        if !self.depends_on(var) {
            return Self::zero();
        }
        match self {
            Self::Const(_) | Self::Pi => Self::zero(),
            Self::Var(s) => {
                if s == var {
                    Self::one()
                } else {
                    Self::zero()
                }
            }
            Self::Add(a, b) => Self::sum(a.diff(var), b.diff(var)),
            Self::Mul(a, b) => Self::sum(
                Self::product(a.diff(var), (**b).clone()),
                Self::product((**a).clone(), b.diff(var)),
            ),
            Self::Neg(a) => Self::negate(a.diff(var)),
            Self::Pow(base, exponent) => power_rule(base, exponent, var),
            Self::Func(func, arg) => chain_rule(*func, arg, var),
        }
    }
}

fn power_rule(base: &Expr, exponent: &Expr, var: &Symbol) -> Expr {
    let base = base.clone();
    let exponent = exponent.clone();
    if !exponent.depends_on(var) {
        // n·u^(n-1)·u'
        let lowered = Expr::pow(base.clone(), exponent.clone() - 1.0);
        return exponent * lowered * base.diff(var);
    }
    // u^v·(v'·ln u + v·u'/u)
    let whole = Expr::pow(base.clone(), exponent.clone());
    let log_term = exponent.diff(var) * base.clone().ln();
    let ratio_term = exponent * base.diff(var) / base;
    whole * (log_term + ratio_term)
}

fn chain_rule(func: Func, arg: &Expr, var: &Symbol) -> Expr {
    let inner = arg.diff(var);
    let arg = arg.clone();
    match func {
        Func::Sin => arg.cos() * inner,
        Func::Cos => -(arg.sin()) * inner,
        Func::Abs => (arg.clone().conj() * inner).re() / arg.abs(),
        Func::Floor => Expr::zero(),
        Func::Conj => inner.conj(),
        Func::Re => inner.re(),
        Func::Im => inner.im(),
        Func::Ln => inner / arg,
    }
}
