use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use num_complex::Complex;

use crate::errors::{ReactanceError, Result};
use crate::math::{CScalar, Scalar};

/// Named algebraic variable. Symbols are assumed real and nonzero when differentiated.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Creates a symbol named `name`.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Symbol name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Unary functions available in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Complex magnitude.
    Abs,
    /// Floor of a real argument.
    Floor,
    /// Complex conjugate.
    Conj,
    /// Real part.
    Re,
    /// Imaginary part.
    Im,
    /// Natural logarithm.
    Ln,
}

/// Expression tree. Division and subtraction are encoded as `Pow(_, -1)` and `Neg`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Complex literal.
    Const(CScalar),
    /// The constant π, kept by name for readable equations.
    Pi,
    /// Free variable.
    Var(Symbol),
    /// Sum of two terms.
    Add(Box<Expr>, Box<Expr>),
    /// Product of two factors.
    Mul(Box<Expr>, Box<Expr>),
    /// Base raised to an exponent.
    Pow(Box<Expr>, Box<Expr>),
    /// Negation.
    Neg(Box<Expr>),
    /// Unary function application.
    Func(Func, Box<Expr>),
}

impl Expr {
    /// Complex literal.
    #[must_use]
    pub const fn constant(value: CScalar) -> Self {
        Self::Const(value)
    }

    /// Real literal.
    #[must_use]
    pub const fn real(value: Scalar) -> Self {
        Self::Const(Complex::new(value, 0.0))
    }

    /// Literal zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self::real(0.0)
    }

    /// Literal one.
    #[must_use]
    pub const fn one() -> Self {
        Self::real(1.0)
    }

    /// Imaginary unit `j`.
    #[must_use]
    pub const fn j() -> Self {
        Self::Const(Complex::new(0.0, 1.0))
    }

    /// Variable reference.
    #[must_use]
    pub fn var(symbol: &Symbol) -> Self {
        Self::Var(symbol.clone())
    }

    /// Literal value if the expression is a plain constant.
    #[must_use]
    pub fn as_const(&self) -> Option<CScalar> {
        match self {
            Self::Const(c) => Some(*c),
            Self::Pi => Some(Complex::new(PI, 0.0)),
            _ => None,
        }
    }

    /// True for the literal zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Const(c) if c.re == 0.0 && c.im == 0.0)
    }

    fn is_one(&self) -> bool {
        matches!(self, Self::Const(c) if c.re == 1.0 && c.im == 0.0)
    }

    /// Folded sum.
    #[must_use]
    pub fn sum(a: Self, b: Self) -> Self {
        match (&a, &b) {
            (Self::Const(x), Self::Const(y)) => Self::Const(x + y),
            _ if a.is_zero() => b,
            _ if b.is_zero() => a,
            _ => Self::Add(Box::new(a), Box::new(b)),
        }
    }

    /// Folded product.
    #[must_use]
    pub fn product(a: Self, b: Self) -> Self {
        match (&a, &b) {
            (Self::Const(x), Self::Const(y)) => Self::Const(x * y),
            _ if a.is_zero() || b.is_zero() => Self::zero(),
            _ if a.is_one() => b,
            _ if b.is_one() => a,
            _ => Self::Mul(Box::new(a), Box::new(b)),
        }
    }

    /// Folded power. Literal `0^negative` is left unfolded and fails on evaluation.
    #[must_use]
    pub fn pow(base: Self, exponent: Self) -> Self {
        if exponent.is_zero() {
            return Self::one();
        }
        if exponent.is_one() {
            return base;
        }
        if is_minus_one(&exponent) {
            if let Self::Pow(inner, e) = &base {
                if is_minus_one(e) {
                    return (**inner).clone();
                }
            }
        }
        if let (Self::Const(b), Self::Const(e)) = (&base, &exponent) {
            if let Ok(value) = const_pow(*b, *e) {
                return Self::Const(value);
            }
        }
        Self::Pow(Box::new(base), Box::new(exponent))
    }

    /// Folded negation.
    #[must_use]
    pub fn negate(a: Self) -> Self {
        match a {
            Self::Const(c) => Self::Const(-c),
            Self::Neg(inner) => *inner,
            other => Self::Neg(Box::new(other)),
        }
    }

    /// Applies `func` to `arg`, folding literal arguments.
    #[must_use]
    pub fn apply(func: Func, arg: Self) -> Self {
        if let Self::Const(c) = arg {
            if let Ok(value) = apply_func(func, c) {
                return Self::Const(value);
            }
        }
        Self::Func(func, Box::new(arg))
    }

    /// Reciprocal, rejecting a literal zero.
    pub fn recip(self) -> Result<Self> {
        if self.is_zero() {
            return Err(ReactanceError::division_by_zero(format!("1/({self})")));
        }
        Ok(Self::pow(self, Self::real(-1.0)))
    }

    /// Quotient, rejecting a literal zero divisor.
    pub fn checked_div(self, divisor: Self) -> Result<Self> {
        Ok(Self::product(self, divisor.recip()?))
    }

    /// `sin(self)`.
    #[must_use]
    pub fn sin(self) -> Self {
        Self::apply(Func::Sin, self)
    }

    /// `cos(self)`.
    #[must_use]
    pub fn cos(self) -> Self {
        Self::apply(Func::Cos, self)
    }

    /// `|self|`.
    #[must_use]
    pub fn abs(self) -> Self {
        Self::apply(Func::Abs, self)
    }

    /// `floor(self)`.
    #[must_use]
    pub fn floor(self) -> Self {
        Self::apply(Func::Floor, self)
    }

    /// Complex conjugate.
    #[must_use]
    pub fn conj(self) -> Self {
        Self::apply(Func::Conj, self)
    }

    /// Real part.
    #[must_use]
    pub fn re(self) -> Self {
        Self::apply(Func::Re, self)
    }

    /// Imaginary part.
    #[must_use]
    pub fn im(self) -> Self {
        Self::apply(Func::Im, self)
    }

    /// Natural logarithm.
    #[must_use]
    pub fn ln(self) -> Self {
        Self::apply(Func::Ln, self)
    }

    /// `self^exponent`.
    #[must_use]
    pub fn powf(self, exponent: Scalar) -> Self {
        Self::pow(self, Self::real(exponent))
    }

    /// True when `symbol` occurs anywhere in the expression.
    #[must_use]
    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        match self {
            Self::Const(_) | Self::Pi => false,
            Self::Var(s) => s == symbol,
            Self::Add(a, b) | Self::Mul(a, b) | Self::Pow(a, b) => {
                a.depends_on(symbol) || b.depends_on(symbol)
            }
            Self::Neg(a) | Self::Func(_, a) => a.depends_on(symbol),
        }
    }

    /// All free symbols, ordered by name.
    #[must_use]
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Self::Const(_) | Self::Pi => {}
            Self::Var(s) => {
                out.insert(s.clone());
            }
            Self::Add(a, b) | Self::Mul(a, b) | Self::Pow(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
            Self::Neg(a) | Self::Func(_, a) => a.collect_symbols(out),
        }
    }

    /// Replaces every occurrence of `symbol` with `replacement`, refolding constants.
    #[must_use]
    pub fn subs(&self, symbol: &Symbol, replacement: &Self) -> Self {
        match self {
            Self::Const(_) | Self::Pi => self.clone(),
            Self::Var(s) if s == symbol => replacement.clone(),
            Self::Var(_) => self.clone(),
            Self::Add(a, b) => Self::sum(a.subs(symbol, replacement), b.subs(symbol, replacement)),
            Self::Mul(a, b) => {
                Self::product(a.subs(symbol, replacement), b.subs(symbol, replacement))
            }
            Self::Pow(a, b) => Self::pow(a.subs(symbol, replacement), b.subs(symbol, replacement)),
            Self::Neg(a) => Self::negate(a.subs(symbol, replacement)),
            Self::Func(func, a) => Self::apply(*func, a.subs(symbol, replacement)),
        }
    }

    /// Substitutes a real value for `symbol`.
    #[must_use]
    pub fn subs_value(&self, symbol: &Symbol, value: Scalar) -> Self {
        self.subs(symbol, &Self::real(value))
    }

    /// Evaluates the expression numerically.
    pub fn eval(&self, bindings: &Bindings) -> Result<CScalar> {
        match self {
            Self::Const(c) => Ok(*c),
            Self::Pi => Ok(Complex::new(PI, 0.0)),
            Self::Var(s) => bindings
                .get(s)
                .ok_or_else(|| ReactanceError::UnboundSymbol(s.name().to_owned())),
            Self::Add(a, b) => Ok(a.eval(bindings)? + b.eval(bindings)?),
            Self::Mul(a, b) => Ok(a.eval(bindings)? * b.eval(bindings)?),
            Self::Pow(a, b) => const_pow(a.eval(bindings)?, b.eval(bindings)?),
            Self::Neg(a) => Ok(-a.eval(bindings)?),
            Self::Func(func, a) => apply_func(*func, a.eval(bindings)?),
        }
    }

    /// Evaluates an expression that has no free symbols.
    pub fn eval_const(&self) -> Result<CScalar> {
        self.eval(&Bindings::new())
    }

    /// Turns the expression into a numeric function of `var`.
    #[must_use]
    pub fn lambdify(&self, var: &Symbol) -> Lambda {
        Lambda {
            expr: self.clone(),
            var: var.clone(),
        }
    }
}

pub(super) fn is_minus_one(e: &Expr) -> bool {
    matches!(e, Expr::Const(c) if c.re == -1.0 && c.im == 0.0)
}

fn const_pow(base: CScalar, exponent: CScalar) -> Result<CScalar> {
    if exponent.im == 0.0
        && exponent.re.fract() == 0.0
        && exponent.re.abs() <= f64::from(i32::MAX)
    {
        // Integral exponents stay exact, which keeps (-1)^n free of rounding residue.
        let n = exponent.re as i32;
        if n < 0 && base.re == 0.0 && base.im == 0.0 {
            return Err(ReactanceError::division_by_zero("0 raised to a negative power"));
        }
        return Ok(base.powi(n));
    }
    if base.re == 0.0 && base.im == 0.0 {
        return if exponent.re > 0.0 {
            Ok(Complex::new(0.0, 0.0))
        } else {
            Err(ReactanceError::division_by_zero("0 raised to a non-positive power"))
        };
    }
    if base.im == 0.0 && base.re > 0.0 && exponent.im == 0.0 {
        return Ok(Complex::new(base.re.powf(exponent.re), 0.0));
    }
    Ok(base.powc(exponent))
}

fn apply_func(func: Func, z: CScalar) -> Result<CScalar> {
    Ok(match func {
        Func::Sin => z.sin(),
        Func::Cos => z.cos(),
        Func::Abs => Complex::new(z.norm(), 0.0),
        Func::Floor => {
            if z.im.abs() > 1.0e-12 * z.re.abs().max(1.0) {
                return Err(ReactanceError::NonReal {
                    operation: "floor",
                    value: z.to_string(),
                });
            }
            Complex::new(z.re.floor(), 0.0)
        }
        Func::Conj => z.conj(),
        Func::Re => Complex::new(z.re, 0.0),
        Func::Im => Complex::new(z.im, 0.0),
        Func::Ln => {
            if z.re == 0.0 && z.im == 0.0 {
                return Err(ReactanceError::division_by_zero("log(0)"));
            }
            z.ln()
        }
    })
}

/// Values assigned to symbols for numeric evaluation.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<Symbol, CScalar>,
}

impl Bindings {
    /// Empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding of a real value.
    #[must_use]
    pub fn with(mut self, symbol: &Symbol, value: Scalar) -> Self {
        self.set(symbol, Complex::new(value, 0.0));
        self
    }

    /// Binds (or rebinds) `symbol`.
    pub fn set(&mut self, symbol: &Symbol, value: CScalar) {
        self.values.insert(symbol.clone(), value);
    }

    /// Value bound to `symbol`, if any.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<CScalar> {
        self.values.get(symbol).copied()
    }
}

/// Expression compiled to a function of one variable.
#[derive(Debug, Clone)]
pub struct Lambda {
    expr: Expr,
    var: Symbol,
}

impl Lambda {
    /// Evaluates at `x`.
    pub fn call(&self, x: Scalar) -> Result<CScalar> {
        self.expr.eval(&Bindings::new().with(&self.var, x))
    }

    /// Evaluates the real part at `x`.
    pub fn call_real(&self, x: Scalar) -> Result<Scalar> {
        self.call(x).map(|z| z.re)
    }

    /// Evaluates over every sample, stopping at the first failure.
    pub fn call_many(&self, xs: &[Scalar]) -> Result<Vec<CScalar>> {
        xs.iter().map(|&x| self.call(x)).collect()
    }

    /// Underlying expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl From<Scalar> for Expr {
    fn from(value: Scalar) -> Self {
        Self::real(value)
    }
}

impl From<CScalar> for Expr {
    fn from(value: CScalar) -> Self {
        Self::Const(value)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Self::var(symbol)
    }
}

impl<T: Into<Self>> Add<T> for Expr {
    type Output = Self;

    fn add(self, rhs: T) -> Self {
        Self::sum(self, rhs.into())
    }
}

impl<T: Into<Self>> Sub<T> for Expr {
    type Output = Self;

    fn sub(self, rhs: T) -> Self {
        Self::sum(self, Self::negate(rhs.into()))
    }
}

impl<T: Into<Self>> Mul<T> for Expr {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self::product(self, rhs.into())
    }
}

/// Unchecked quotient; a literal zero divisor surfaces when the result is evaluated.
impl<T: Into<Self>> Div<T> for Expr {
    type Output = Self;

    fn div(self, rhs: T) -> Self {
        Self::product(self, Self::pow(rhs.into(), Self::real(-1.0)))
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::negate(self)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn constants_fold_on_construction() {
        let e = Expr::real(2.0) * 3.0 + 1.0;
        assert_eq!(e, Expr::real(7.0));
        let x = Symbol::new("x");
        assert_eq!(Expr::var(&x) * 0.0, Expr::zero());
        assert_eq!(Expr::var(&x) * 1.0, Expr::var(&x));
    }

    #[test]
    fn recip_of_literal_zero_is_a_domain_error() {
        let err = Expr::zero().recip().unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn unchecked_division_fails_on_evaluation() {
        let e = Expr::one() / Expr::zero();
        assert!(matches!(e.eval_const(), Err(ReactanceError::DivisionByZero { .. })));
    }

    #[test]
    fn eval_reports_unbound_symbols() {
        let x = Symbol::new("x");
        let err = (Expr::var(&x) + 1.0).eval_const().unwrap_err();
        assert_eq!(err, ReactanceError::UnboundSymbol("x".into()));
    }

    #[test]
    fn subs_then_eval_matches_direct_eval() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let e = Expr::var(&x) * Expr::var(&y) + Expr::var(&x).sin();
        let direct = e
            .eval(&Bindings::new().with(&x, 0.5).with(&y, 4.0))
            .unwrap();
        let partial = e.subs_value(&y, 4.0);
        assert!(!partial.depends_on(&y));
        let via_subs = partial.lambdify(&x).call(0.5).unwrap();
        assert_relative_eq!(direct.re, via_subs.re, epsilon = 1.0e-12);
    }

    #[test]
    fn double_reciprocal_collapses() {
        let x = Symbol::new("x");
        let e = Expr::var(&x).recip().unwrap().recip().unwrap();
        assert_eq!(e, Expr::var(&x));
    }

    #[test]
    fn integral_powers_of_minus_one_are_exact() {
        let e = Expr::pow(Expr::real(-1.0), Expr::real(3.0));
        assert_eq!(e, Expr::real(-1.0));
    }

    #[test]
    fn floor_rejects_complex_arguments() {
        let err = Expr::j().floor();
        assert!(matches!(err, Expr::Func(Func::Floor, _)));
        assert!(matches!(err.eval_const(), Err(ReactanceError::NonReal { .. })));
    }

    #[test]
    fn free_symbols_are_collected() {
        let a = Symbol::new("a");
        let b = Symbol::new("b");
        let e = (Expr::var(&a) / Expr::var(&b)).abs();
        let names: Vec<_> = e.free_symbols().into_iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
