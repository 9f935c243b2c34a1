//! Shared numerical primitives anchored on `num_complex`.

use num_complex::Complex;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Primary complex scalar type used for impedances, admittances and phasors.
pub type CScalar = Complex<Scalar>;

/// Returns the complex exponential `e^(j * theta)` using `Scalar` precision.
#[must_use]
pub fn phasor(theta: Scalar) -> CScalar {
    Complex::from_polar(1.0, theta)
}

/// Returns `1 / z`, or `None` when `z` is exactly zero.
///
/// `num_complex` yields NaN for a zero divisor; callers that must surface a
/// domain error go through this instead of the `/` operator.
#[must_use]
pub fn checked_recip(z: CScalar) -> Option<CScalar> {
    if z.re == 0.0 && z.im == 0.0 {
        None
    } else {
        Some(z.inv())
    }
}

/// Returns true when both parts of `z` are finite.
#[must_use]
pub fn is_finite(z: CScalar) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

/// Returns true when `x` lies within `tol` (relative) of an integer.
#[must_use]
pub fn approx_integer(x: Scalar, tol: Scalar) -> bool {
    let nearest = x.round();
    nearest != 0.0 && (x - nearest).abs() <= tol * nearest.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn checked_recip_rejects_zero() {
        assert!(checked_recip(Complex::new(0.0, 0.0)).is_none());
        let y = checked_recip(Complex::new(0.0, 2.0)).unwrap();
        assert_relative_eq!(y.im, -0.5);
    }

    #[test]
    fn phasor_has_unit_magnitude() {
        assert_relative_eq!(phasor(0.7).norm(), 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn approx_integer_tolerates_rounding() {
        assert!(approx_integer(3.000_000_000_1, 1.0e-9));
        assert!(!approx_integer(1.5, 1.0e-9));
        assert!(!approx_integer(0.0, 1.0e-9));
    }
}
