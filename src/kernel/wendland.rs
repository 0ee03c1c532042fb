//! Wendland C2 kernel (Wendland 1995, normalization per Dehnen & Aly 2012),
//! the original's alternative to the cubic spline for runs that want to
//! suppress the pairing instability.

use super::Kernel;

#[derive(Debug, Clone, Copy)]
pub struct WendlandC2<const D: usize>;

impl<const D: usize> WendlandC2<D> {
    pub fn new() -> Self {
        WendlandC2
    }

    fn sigma(&self) -> f64 {
        match D {
            1 => 5.0 / 8.0,
            2 => 7.0 / std::f64::consts::PI,
            3 => 21.0 / (2.0 * std::f64::consts::PI),
            _ => unreachable!("Vector dimension must be 1, 2 or 3"),
        }
    }

    fn shape(q: f64) -> f64 {
        if q < 2.0 {
            (1.0 - 0.5 * q).powi(4) * (2.0 * q + 1.0)
        } else {
            0.0
        }
    }

    fn dshape_dq(q: f64) -> f64 {
        if q < 2.0 {
            -5.0 * q * (1.0 - 0.5 * q).powi(3)
        } else {
            0.0
        }
    }
}

impl<const D: usize> Default for WendlandC2<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> Kernel<D> for WendlandC2<D> {
    fn support_radius_factor(&self) -> f64 {
        2.0
    }

    fn w(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        self.sigma() / h.powi(D as i32) * Self::shape(q)
    }

    fn dwdr(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        self.sigma() / h.powi(D as i32 + 1) * Self::dshape_dq(q)
    }

    fn dwdh(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        let sigma = self.sigma() / h.powi(D as i32);
        -(D as f64) / h * sigma * Self::shape(q) - sigma * Self::dshape_dq(q) * q / h
    }
}
