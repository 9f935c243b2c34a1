use std::fmt;

use super::expr::{is_minus_one, Expr, Func};
use crate::math::CScalar;

const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Self::Const(c) => const_precedence(*c),
            Self::Pi | Self::Var(_) | Self::Func(..) => PREC_ATOM,
            Self::Add(..) => PREC_SUM,
            Self::Mul(..) => PREC_PRODUCT,
            Self::Pow(_, e) if is_minus_one(e) => PREC_PRODUCT,
            Self::Pow(..) => PREC_POWER,
            Self::Neg(_) => PREC_UNARY,
        }
    }

    fn write_at(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec {
            f.write_str("(")?;
            self.write_bare(f)?;
            f.write_str(")")
        } else {
            self.write_bare(f)
        }
    }

    fn write_bare(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(c) => write_const(f, *c),
            Self::Pi => f.write_str("pi"),
            Self::Var(s) => write!(f, "{s}"),
            Self::Add(a, b) => {
                a.write_at(f, PREC_SUM)?;
                match b.as_ref() {
                    Self::Neg(inner) => {
                        f.write_str(" - ")?;
                        inner.write_at(f, PREC_PRODUCT)
                    }
                    Self::Const(c) if c.im == 0.0 && c.re < 0.0 => write!(f, " - {}", -c.re),
                    _ => {
                        f.write_str(" + ")?;
                        b.write_at(f, PREC_SUM)
                    }
                }
            }
            Self::Mul(a, b) => {
                a.write_at(f, PREC_PRODUCT)?;
                match b.as_ref() {
                    Self::Pow(base, e) if is_minus_one(e) => {
                        f.write_str("/")?;
                        base.write_at(f, PREC_POWER)
                    }
                    _ => {
                        f.write_str("*")?;
                        b.write_at(f, PREC_UNARY)
                    }
                }
            }
            Self::Pow(base, e) if is_minus_one(e) => {
                f.write_str("1/")?;
                base.write_at(f, PREC_POWER)
            }
            Self::Pow(base, e) => {
                base.write_at(f, PREC_ATOM)?;
                f.write_str("**")?;
                e.write_at(f, PREC_ATOM)
            }
            Self::Neg(a) => {
                f.write_str("-")?;
                a.write_at(f, PREC_UNARY)
            }
            Self::Func(func, arg) => {
                write!(f, "{}(", func_name(*func))?;
                arg.write_bare(f)?;
                f.write_str(")")
            }
        }
    }
}

fn const_precedence(c: CScalar) -> u8 {
    if c.re != 0.0 && c.im != 0.0 {
        PREC_SUM
    } else if c.re < 0.0 || c.im < 0.0 {
        PREC_UNARY
    } else {
        PREC_ATOM
    }
}

fn write_const(f: &mut fmt::Formatter<'_>, c: CScalar) -> fmt::Result {
    match (c.re, c.im) {
        (re, im) if im == 0.0 => write!(f, "{re}"),
        (re, im) if re == 0.0 => write_imaginary(f, im),
        (re, im) => {
            write!(f, "{re} ")?;
            f.write_str(if im < 0.0 { "- " } else { "+ " })?;
            write_imaginary(f, im.abs())
        }
    }
}

fn write_imaginary(f: &mut fmt::Formatter<'_>, im: f64) -> fmt::Result {
    if im == 1.0 {
        f.write_str("I")
    } else if im == -1.0 {
        f.write_str("-I")
    } else {
        write!(f, "{im}*I")
    }
}

const fn func_name(func: Func) -> &'static str {
    match func {
        Func::Sin => "sin",
        Func::Cos => "cos",
        Func::Abs => "Abs",
        Func::Floor => "floor",
        Func::Conj => "conjugate",
        Func::Re => "re",
        Func::Im => "im",
        Func::Ln => "log",
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_bare(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;

    #[test]
    fn renders_quotients_and_differences() {
        let r = Symbol::new("R1");
        let c = Symbol::new("C1");
        let f = Symbol::new("f");
        let e = Expr::var(&r) - Expr::j() / (Expr::Pi * 2.0 * Expr::var(&f) * Expr::var(&c));
        assert_eq!(e.to_string(), "R1 - I/(pi*2*f*C1)");
    }

    #[test]
    fn renders_functions_and_powers() {
        let x = Symbol::new("x");
        let e = (Expr::var(&x).powf(2.0) + 1.0).abs();
        assert_eq!(e.to_string(), "Abs(x**2 + 1)");
        assert_eq!(Expr::real(-3.0).to_string(), "-3");
        assert_eq!((Expr::one() / Expr::var(&x)).to_string(), "1/x");
    }
}
