//! Floating point helpers built on the `approx` crate.

use approx::AbsDiffEq;

/// Targeted accuracy instantiated over `f64`
pub const ACC: f64 = 10e-11;

/// Tolerance on the total population mass of a user supplied state.
pub const MASS_TOLERANCE: f64 = 1e-6;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Numerically stable `ln(1 + e^x)`.
#[must_use]
pub fn ln_1p_exp(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Returns true when `x` is a number in `[0, 1]`.
#[must_use]
pub fn is_fraction(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    #[test]
    fn almost_eq_within_tolerance() {
        let a = 1.0;
        let b = 1.0 + 0.5e-11;
        assert!(almost_eq(a, b, ACC));
    }

    #[test]
    fn almost_eq_outside_tolerance() {
        let a = 1.0;
        let b = 1.0 + 2e-10;
        assert!(!almost_eq(a, b, ACC));
    }

    #[test]
    fn almost_eq_infinities() {
        assert!(almost_eq(f64::INFINITY, f64::INFINITY, ACC));
        assert!(!almost_eq(f64::INFINITY, f64::NEG_INFINITY, ACC));
    }

    #[test]
    fn ln_1p_exp_matches_naive_form_in_safe_range() {
        for x in [-20.0, -1.0, 0.0, 0.5, 3.0, 20.0] {
            let naive = (1.0 + f64::exp(x)).ln();
            assert_almost_eq!(ln_1p_exp(x), naive, 1e-12);
        }
    }

    #[test]
    fn ln_1p_exp_does_not_overflow() {
        // e^1000 overflows, the result is just x
        assert_almost_eq!(ln_1p_exp(1000.0), 1000.0, 1e-9);
        assert_eq!(ln_1p_exp(-1000.0), 0.0);
    }

    #[test]
    fn fractions() {
        assert!(is_fraction(0.0));
        assert!(is_fraction(1.0));
        assert!(!is_fraction(-1e-12));
        assert!(!is_fraction(f64::NAN));
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn assert_almost_eq_macro_panics() {
        assert_almost_eq!(1.0, 1.001, 1e-4);
    }
}
