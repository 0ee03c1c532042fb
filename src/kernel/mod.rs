//! SPH smoothing kernels.
//!
//! The original only ever instantiates the cubic spline and Wendland C2
//! kernels (`include/algorithms/kernel/*` in `original_source`); both are
//! ported here behind a common [`Kernel`] trait so the pre-interaction and
//! force stages stay kernel-agnostic, exactly as the original's `Module<Dim>`
//! base class stays solver-agnostic.

mod cubic_spline;
mod wendland;

pub use cubic_spline::CubicSpline;
pub use wendland::WendlandC2;

use crate::vector::Vector;

/// A compactly supported SPH smoothing kernel in `D` dimensions.
///
/// `h` is the smoothing length; the kernel support radius is `h *
/// Kernel::support_radius_factor()`.
pub trait Kernel<const D: usize>: Clone + Send + Sync {
    /// Ratio of the compact-support radius to the smoothing length (e.g. `2`
    /// for the cubic spline, `2` for Wendland C2 in this normalization).
    fn support_radius_factor(&self) -> f64;

    /// `W(r, h)`, normalized so that `∫ W dV = 1`.
    fn w(&self, r: f64, h: f64) -> f64;

    /// `dW/dr` at separation `r` with smoothing length `h`.
    fn dwdr(&self, r: f64, h: f64) -> f64;

    /// `∇_i W(|r_i - r_j|, h)`, i.e. the gradient with respect to the
    /// particle-i position, evaluated from the separation vector `r_ij = r_i
    /// - r_j`.
    fn grad_w(&self, r_ij: Vector<D>, r: f64, h: f64) -> Vector<D> {
        if r < 1e-300 {
            return Vector::zero();
        }
        r_ij * (self.dwdr(r, h) / r)
    }

    /// `dW/dh` at fixed `r`, needed by the smoothing-length Newton-Raphson
    /// solver's `∂ρ/∂h` term.
    fn dwdh(&self, r: f64, h: f64) -> f64;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Integrates `4*pi*r^2*W(r,h)` (3D) or the D-specific measure over the
    /// kernel support via a simple Simpson's rule, used by unit tests to
    /// check kernel normalization without pulling in a quadrature crate.
    pub fn integrate_normalization<const D: usize, K: Kernel<D>>(kernel: &K, h: f64) -> f64 {
        let r_max = kernel.support_radius_factor() * h;
        let n = 2000;
        let dr = r_max / n as f64;
        let mut total = 0.0;
        for i in 0..n {
            let r = (i as f64 + 0.5) * dr;
            let measure = match D {
                1 => 2.0,
                2 => 2.0 * std::f64::consts::PI * r,
                3 => 4.0 * std::f64::consts::PI * r * r,
                _ => unreachable!(),
            };
            total += kernel.w(r, h) * measure * dr;
        }
        total
    }
}
