//! M4 cubic spline kernel (Monaghan & Lattanzio 1985), the workhorse kernel
//! of `original_source`'s SSPH/DISPH solvers.

use super::Kernel;

#[derive(Debug, Clone, Copy)]
pub struct CubicSpline<const D: usize>;

impl<const D: usize> CubicSpline<D> {
    pub fn new() -> Self {
        CubicSpline
    }

    fn sigma(&self) -> f64 {
        match D {
            1 => 2.0 / 3.0,
            2 => 10.0 / (7.0 * std::f64::consts::PI),
            3 => 1.0 / std::f64::consts::PI,
            _ => unreachable!("Vector dimension must be 1, 2 or 3"),
        }
    }
}

impl<const D: usize> Default for CubicSpline<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> Kernel<D> for CubicSpline<D> {
    fn support_radius_factor(&self) -> f64 {
        2.0
    }

    fn w(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        let sigma = self.sigma() / h.powi(D as i32);
        let shape = if q < 1.0 {
            1.0 - 1.5 * q * q + 0.75 * q * q * q
        } else if q < 2.0 {
            0.25 * (2.0 - q).powi(3)
        } else {
            0.0
        };
        sigma * shape
    }

    fn dwdr(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        let sigma = self.sigma() / h.powi(D as i32);
        let dshape_dq = if q < 1.0 {
            -3.0 * q + 2.25 * q * q
        } else if q < 2.0 {
            -0.75 * (2.0 - q).powi(2)
        } else {
            0.0
        };
        sigma * dshape_dq / h
    }

    fn dwdh(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        let sigma = self.sigma() / h.powi(D as i32);
        let shape = if q < 1.0 {
            1.0 - 1.5 * q * q + 0.75 * q * q * q
        } else if q < 2.0 {
            0.25 * (2.0 - q).powi(3)
        } else {
            0.0
        };
        let dshape_dq = if q < 1.0 {
            -3.0 * q + 2.25 * q * q
        } else if q < 2.0 {
            -0.75 * (2.0 - q).powi(2)
        } else {
            0.0
        };
        // d/dh [ sigma/h^D * shape(r/h) ] = -D/h * W - sigma/h^D * shape'(q) * r/h^2
        -(D as f64) / h * sigma * shape - sigma * dshape_dq * q / h
    }
}
