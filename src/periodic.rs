//! Periodic domain wrapping, grounded in `original_source`'s
//! `include/core/periodic.hpp`.
//!
//! Per SPEC_FULL.md section C, this is used *only* for wrapping a particle's
//! position back into the domain after the predictor/corrector integrator
//! moves it, and for the tree-gravity walk's minimum-image node distance.
//! Force-kernel pair distances never go through here: those neighbors are
//! found through ghost particles, whose positions are already the correctly
//! mirrored ones.

use crate::vector::Vector;

#[derive(Debug, Clone, Copy)]
pub struct PeriodicRange {
    pub min: f64,
    pub max: f64,
}

impl PeriodicRange {
    pub fn length(&self) -> f64 {
        self.max - self.min
    }
}

/// Per-axis periodic wrapping. An axis with `ranges[d] = None` is not
/// periodic along that dimension (e.g. a mirror or free-surface boundary).
#[derive(Debug, Clone, Copy)]
pub struct Periodic<const D: usize> {
    ranges: [Option<PeriodicRange>; D],
}

impl<const D: usize> Periodic<D> {
    pub fn new(ranges: [Option<PeriodicRange>; D]) -> Self {
        Periodic { ranges }
    }

    pub fn none() -> Self {
        Periodic { ranges: [None; D] }
    }

    pub fn range(&self, dim: usize) -> Option<PeriodicRange> {
        self.ranges[dim]
    }

    /// Wraps `position` back into `[min, max)` on every periodic axis.
    pub fn apply_periodic_condition(&self, position: Vector<D>) -> Vector<D> {
        let mut out = position;
        for d in 0..D {
            if let Some(r) = self.ranges[d] {
                let len = r.length();
                let mut x = out[d];
                while x < r.min {
                    x += len;
                }
                while x >= r.max {
                    x -= len;
                }
                out[d] = x;
            }
        }
        out
    }

    /// Minimum-image separation `r_i - r_j`, wrapping each periodic axis to
    /// its closest image.
    pub fn calc_r_ij(&self, r_i: Vector<D>, r_j: Vector<D>) -> Vector<D> {
        let mut out = r_i - r_j;
        for d in 0..D {
            if let Some(r) = self.ranges[d] {
                let len = r.length();
                let half = len * 0.5;
                if out[d] > half {
                    out[d] -= len;
                } else if out[d] < -half {
                    out[d] += len;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn periodic_1d(min: f64, max: f64) -> Periodic<1> {
        Periodic::new([Some(PeriodicRange { min, max })])
    }

    #[test]
    fn wraps_positions_into_range() {
        let p = periodic_1d(0.0, 1.0);
        let wrapped = p.apply_periodic_condition(Vector::from_array([1.3]));
        assert_relative_eq!(wrapped[0], 0.3, epsilon = 1e-12);
        let wrapped = p.apply_periodic_condition(Vector::from_array([-0.2]));
        assert_relative_eq!(wrapped[0], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn minimum_image_picks_closer_image() {
        let p = periodic_1d(0.0, 1.0);
        let r_ij = p.calc_r_ij(Vector::from_array([0.05]), Vector::from_array([0.95]));
        // the wrapped separation should be 0.1, not 0.9
        assert_relative_eq!(r_ij[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn non_periodic_axis_passes_through() {
        let p: Periodic<2> = Periodic::new([Some(PeriodicRange { min: 0.0, max: 1.0 }), None]);
        let r_ij = p.calc_r_ij(Vector::from_array([0.1, 5.0]), Vector::from_array([0.9, -3.0]));
        assert_relative_eq!(r_ij[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(r_ij[1], 8.0, epsilon = 1e-12);
    }
}
