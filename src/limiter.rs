//! Van Leer (1979) slope limiter, grounded in `original_source`'s
//! `include/algorithms/limiters/van_leer_limiter.hpp`.
//!
//! Used by the GSPH fluid-force stage's MUSCL reconstruction (spec.md §4.8)
//! to keep the piecewise-linear interpolation of density/pressure/velocity
//! TVD across a pair's interface.

/// `φ(dq1, dq2)`: zero when the two gradient estimates disagree in sign
/// (an extremum), otherwise their harmonic mean scaled by two.
pub fn van_leer(dq1: f64, dq2: f64) -> f64 {
    let product = dq1 * dq2;
    if product <= 0.0 {
        return 0.0;
    }
    2.0 * product / (dq1 + dq2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_at_extrema() {
        assert_eq!(van_leer(1.0, -1.0), 0.0);
        assert_eq!(van_leer(0.0, 1.0), 0.0);
    }

    #[test]
    fn symmetric_in_its_arguments() {
        assert_relative_eq!(van_leer(0.3, 0.7), van_leer(0.7, 0.3));
    }

    #[test]
    fn equal_inputs_return_the_input() {
        assert_relative_eq!(van_leer(0.5, 0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn bounded_by_twice_the_smaller_gradient() {
        let dq1 = 0.2;
        let dq2 = 1.0;
        let limited = van_leer(dq1, dq2);
        assert!(limited <= 2.0 * dq1.min(dq2) + 1e-12);
    }
}
