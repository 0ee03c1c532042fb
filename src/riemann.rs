//! HLL (Harten-Lax-van Leer) two-wave Riemann solver, grounded in
//! `original_source`'s `include/algorithms/riemann/hll_solver.hpp` /
//! `src/algorithms/riemann/hll_solver.cpp` (spec.md §4.8.1).
//!
//! Used only by the GSPH fluid-force stage in place of the Monaghan
//! artificial-viscosity term: each pair's reconstructed left/right states
//! are fed through [`hll_solve`] to produce an interface pressure and
//! normal velocity.

/// One side of a reconstructed Riemann problem at a particle-pair
/// interface: normal velocity, density, pressure and sound speed.
#[derive(Debug, Clone, Copy)]
pub struct RiemannState {
    pub velocity: f64,
    pub density: f64,
    pub pressure: f64,
    pub sound_speed: f64,
}

impl RiemannState {
    fn is_valid(&self) -> bool {
        self.density > 0.0 && self.pressure > 0.0 && self.sound_speed > 0.0
    }
}

/// Interface state `(P*, u*)` returned by the solver.
#[derive(Debug, Clone, Copy)]
pub struct RiemannSolution {
    pub pressure: f64,
    pub velocity: f64,
}

/// Solves the Riemann problem at the interface between `left` and `right`
/// using the HLL two-wave approximation with Roe-averaged wave speeds.
///
/// Falls back to the arithmetic mean of both states when either input is
/// non-physical (spec.md §7's `NumericalWarning` fallback for "non-positive
/// ρ/P on entry to a Riemann solver").
pub fn hll_solve(left: RiemannState, right: RiemannState) -> RiemannSolution {
    if !left.is_valid() || !right.is_valid() {
        return RiemannSolution {
            pressure: 0.5 * (left.pressure + right.pressure),
            velocity: 0.5 * (left.velocity + right.velocity),
        };
    }

    let sqrt_rho_l = left.density.sqrt();
    let sqrt_rho_r = right.density.sqrt();
    let inv_sum = 1.0 / (sqrt_rho_l + sqrt_rho_r);
    let roe_velocity = (sqrt_rho_l * left.velocity + sqrt_rho_r * right.velocity) * inv_sum;
    let roe_sound_speed = (sqrt_rho_l * left.sound_speed + sqrt_rho_r * right.sound_speed) * inv_sum;

    let wave_speed_left = (left.velocity - left.sound_speed).min(roe_velocity - roe_sound_speed);
    let wave_speed_right = (right.velocity + right.sound_speed).max(roe_velocity + roe_sound_speed);

    let a_l = left.density * (wave_speed_left - left.velocity);
    let a_r = right.density * (wave_speed_right - right.velocity);
    let inv_diff = 1.0 / (a_l - a_r);

    let delta_l = left.pressure - left.velocity * a_l;
    let delta_r = right.pressure - right.velocity * a_r;

    RiemannSolution {
        velocity: (delta_r - delta_l) * inv_diff,
        pressure: (a_l * delta_r - a_r * delta_l) * inv_diff,
    }
}
