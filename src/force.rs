//! Fluid-force stage: per-pair momentum and energy time derivatives, shared
//! skeleton across SSPH/DISPH/GSPH (spec.md §4.8).
//!
//! Grounded in `original_source`'s `include/fluid_force.hpp` (SSPH base),
//! `include/disph/d_fluid_force.hpp` (DISPH override) and
//! `include/gsph/g_fluid_force.hpp` (GSPH's Riemann-solver replacement of the
//! artificial-viscosity term), with the MUSCL reconstruction grounded in
//! `include/algorithms/limiters/van_leer_limiter.hpp` and the interface
//! solve in [`crate::riemann`].

use crate::kernel::Kernel;
use crate::limiter::van_leer;
use crate::particle::Particle;
use crate::riemann::{hll_solve, RiemannState};
use crate::tree::{BarnesHutTree, NeighborIndex};
use crate::vector::Vector;
use crate::viscosity::{ArtificialConductivity, ArtificialViscosity, ViscosityPairState};
use rayon::prelude::*;

/// Which momentum/energy update to run for a pair (spec.md §4.8). SSPH and
/// DISPH share the artificial-viscosity-based update and differ only in
/// which "density-like" weight normalizes the pressure term; GSPH replaces
/// the dissipation term with a Riemann solve entirely.
#[derive(Clone, Copy)]
pub enum FluidForceVariant<'a> {
    Ssph { viscosity: &'a dyn ArtificialViscosity },
    Disph { viscosity: &'a dyn ArtificialViscosity },
    Gsph { second_order: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct FluidForceParams {
    pub conductivity: ArtificialConductivity,
}

/// `P/ρ²`-style normalization weight for the symmetric pressure term: for
/// SSPH/GSPH this is the ordinary `P_i/ρ_i²`; for DISPH it is `P_i/(y_i
/// ρ_i)` in the pressure-energy formulation (spec.md §4.6's "pressure-volume
/// weights in place of 1/ρ²"), using the particle's own energy density
/// `y_i` computed by the pre-interaction stage.
fn pressure_weight<const D: usize>(p: &Particle<D>, disph: bool) -> f64 {
    if disph {
        if p.energy_density > 0.0 && p.density > 0.0 {
            p.pressure / (p.energy_density * p.density)
        } else {
            0.0
        }
    } else if p.density > 0.0 {
        p.pressure / (p.density * p.density)
    } else {
        0.0
    }
}

/// MUSCL-reconstructs a scalar field from particle `i` toward the interface
/// with particle `j`, given the field's directional gradient along `r_ij`
/// already projected onto the unit separation (`grad_i_n`), limited against
/// the particle-to-particle finite difference with the Van Leer limiter
/// (spec.md §4.8's "2nd-order MUSCL reconstruction using a Van Leer slope
/// limiter").
fn reconstruct_directional(value_i: f64, value_j: f64, grad_i_n: f64, r: f64) -> f64 {
    if r < 1e-300 {
        return value_i;
    }
    let upstream_gradient = (value_j - value_i) / r;
    let limited = van_leer(upstream_gradient, grad_i_n);
    value_i + limited * 0.5 * r
}

/// Same as [`reconstruct_directional`] but takes the field's full gradient
/// vector and projects it onto `unit` itself.
fn reconstruct_scalar<const D: usize>(
    value_i: f64,
    value_j: f64,
    grad_i: Vector<D>,
    unit: Vector<D>,
    r: f64,
) -> f64 {
    reconstruct_directional(value_i, value_j, grad_i.dot(&unit), r)
}

#[allow(clippy::too_many_arguments)]
fn gsph_interface_state<const D: usize>(
    p_i: &Particle<D>,
    p_j: &Particle<D>,
    r_ij: Vector<D>,
    r: f64,
    gamma: f64,
    second_order: bool,
) -> (f64, f64) {
    let unit = if r > 1e-300 { r_ij * (1.0 / r) } else { Vector::zero() };
    let v_i_n = p_i.velocity.dot(&unit);
    let v_j_n = p_j.velocity.dot(&unit);

    let (density_left, pressure_left, velocity_left) = if second_order {
        (
            reconstruct_scalar(p_i.density, p_j.density, p_i.grad_density, unit, r).max(1e-12),
            reconstruct_scalar(p_i.pressure, p_j.pressure, p_i.grad_pressure, unit, r).max(1e-12),
            reconstruct_directional(v_i_n, v_j_n, p_i.grad_velocity_normal(unit), r),
        )
    } else {
        (p_i.density, p_i.pressure, v_i_n)
    };

    let (density_right, pressure_right, velocity_right) = if second_order {
        (
            reconstruct_scalar(p_j.density, p_i.density, p_j.grad_density, -unit, r).max(1e-12),
            reconstruct_scalar(p_j.pressure, p_i.pressure, p_j.grad_pressure, -unit, r).max(1e-12),
            reconstruct_directional(v_j_n, v_i_n, p_j.grad_velocity_normal(-unit), r),
        )
    } else {
        (p_j.density, p_j.pressure, v_j_n)
    };

    let left = RiemannState {
        velocity: velocity_left,
        density: density_left,
        pressure: pressure_left,
        sound_speed: (gamma * pressure_left / density_left).max(0.0).sqrt(),
    };
    let right = RiemannState {
        velocity: velocity_right,
        density: density_right,
        pressure: pressure_right,
        sound_speed: (gamma * pressure_right / density_right).max(0.0).sqrt(),
    };
    let solution = hll_solve(left, right);
    (solution.pressure, solution.velocity)
}

/// Runs the fluid-force stage over every real particle, writing
/// `acceleration` and `specific_energy_dot`. Gravity is **not** included
/// here (spec.md §4.9 runs separately, hydro-then-gravity, accumulating into
/// the same `acceleration` field).
///
/// Pair separations are taken directly from `search` positions, never
/// through [`crate::periodic::Periodic`]: periodic images already live in
/// `search` as ghost particles with correctly mirrored positions, so a
/// second minimum-image correction here would double up the wrap.
#[allow(clippy::too_many_arguments)]
pub fn run_fluid_force<const D: usize, K: Kernel<D> + Sync>(
    kernel: &K,
    tree: &BarnesHutTree<D>,
    search: &[Particle<D>],
    real: &mut [Particle<D>],
    gamma: f64,
    variant: FluidForceVariant<'_>,
    params: &FluidForceParams,
) {
    let disph = matches!(variant, FluidForceVariant::Disph { .. });

    real.par_iter_mut().for_each(|particle| {
        let mut neighbors: Vec<NeighborIndex> = Vec::new();
        particle.acceleration = Vector::zero();
        particle.specific_energy_dot = 0.0;

        let radius = 2.0 * particle.smoothing_length;
        tree.neighbors_within(search, particle.position, radius, &mut neighbors);

        for n in &neighbors {
            let neighbor = &search[n.get()];
            if neighbor.mass <= 0.0 {
                continue;
            }
            let r_ij = particle.position - neighbor.position;
            let r = r_ij.norm();
            if r < 1e-300 {
                continue;
            }

            let grad_w_i = kernel.grad_w(r_ij, r, particle.smoothing_length);
            let grad_w_j = kernel.grad_w(r_ij, r, neighbor.smoothing_length);
            let grad_w_ij = (grad_w_i + grad_w_j) * 0.5;

            let v_ij = particle.velocity - neighbor.velocity;

            match variant {
                FluidForceVariant::Ssph { viscosity } | FluidForceVariant::Disph { viscosity } => {
                    let pi_ij = viscosity.pi_ij(&ViscosityPairState {
                        velocity_ij: v_ij.dot(&r_ij),
                        sound_i: particle.sound_speed,
                        sound_j: neighbor.sound_speed,
                        density_i: particle.density,
                        density_j: neighbor.density,
                        alpha_i: particle.alpha_av,
                        alpha_j: neighbor.alpha_av,
                        balsara_i: particle.balsara,
                        balsara_j: neighbor.balsara,
                        separation: r,
                    });

                    let pressure_term =
                        pressure_weight(particle, disph) + pressure_weight(neighbor, disph) + pi_ij;
                    particle.acceleration -= grad_w_ij * (neighbor.mass * pressure_term);
                    particle.specific_energy_dot += neighbor.mass
                        * (pressure_weight(particle, disph) + 0.5 * pi_ij)
                        * v_ij.dot(&grad_w_ij);
                }
                FluidForceVariant::Gsph { second_order } => {
                    let (p_star, u_star) = gsph_interface_state(particle, neighbor, r_ij, r, gamma, second_order);
                    let unit = r_ij * (1.0 / r);
                    let denom = (particle.density * neighbor.density).max(1e-300);
                    particle.acceleration -= grad_w_ij * (2.0 * neighbor.mass * p_star / denom);
                    let v_i_n = particle.velocity.dot(&unit);
                    particle.specific_energy_dot += 2.0 * neighbor.mass * p_star * (u_star - v_i_n)
                        * grad_w_ij.norm()
                        / denom;
                }
            }

            if params.conductivity.enabled {
                let density_mean = 0.5 * (particle.density + neighbor.density);
                let v_sig_u = params
                    .conductivity
                    .signal_velocity(particle.pressure, neighbor.pressure, density_mean);
                if density_mean > 0.0 {
                    let unit = r_ij * (1.0 / r);
                    particle.specific_energy_dot += params.conductivity.alpha
                        * neighbor.mass
                        * v_sig_u
                        * (particle.specific_energy - neighbor.specific_energy)
                        * unit.dot(&grad_w_ij)
                        / density_mean;
                }
            }
        }
    });
}

impl<const D: usize> Particle<D> {
    /// Directional gradient `n̂ · ∇v_normal`, i.e. the rate of change of the
    /// velocity component along `n̂` as you move along `n̂`, built from the
    /// per-component velocity gradients the pre-interaction stage fills in
    /// for 2nd-order GSPH.
    fn grad_velocity_normal(&self, unit: Vector<D>) -> f64 {
        let mut out = 0.0;
        for k in 0..D {
            out += unit[k] * self.grad_velocity[k].dot(&unit);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CubicSpline;
    use crate::tree::TreeConfig;
    use crate::viscosity::MonaghanViscosity;

    fn sod_like_pair() -> Vec<Particle<1>> {
        let mut left = Particle::new_real(0, Vector::from_array([0.0]), 0.01);
        left.density = 1.0;
        left.pressure = 1.0;
        left.sound_speed = 1.2;
        left.smoothing_length = 0.1;
        left.specific_energy = 2.5;

        let mut right = Particle::new_real(1, Vector::from_array([0.05]), 0.01);
        right.density = 0.125;
        right.pressure = 0.1;
        right.sound_speed = 0.9;
        right.smoothing_length = 0.1;
        right.specific_energy = 2.0;

        vec![left, right]
    }

    #[test]
    fn ssph_approaching_pair_produces_nonzero_deceleration() {
        let mut particles = sod_like_pair();
        particles[1].velocity = Vector::from_array([-1.0]);
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<1>::new();
        let visc = MonaghanViscosity {
            use_balsara_switch: false,
        };
        run_fluid_force(
            &kernel,
            &tree,
            &search,
            &mut particles,
            1.4,
            FluidForceVariant::Ssph { viscosity: &visc },
            &FluidForceParams {
                conductivity: ArtificialConductivity {
                    enabled: false,
                    alpha: 0.0,
                },
            },
        );
        assert!(particles[0].acceleration[0].is_finite());
        assert_ne!(particles[0].acceleration[0], 0.0);
    }

    #[test]
    fn gsph_identical_states_produce_zero_net_acceleration() {
        let mut p0 = Particle::new_real(0, Vector::from_array([0.0]), 0.01);
        p0.density = 1.0;
        p0.pressure = 1.0;
        p0.smoothing_length = 0.1;
        let mut p1 = Particle::new_real(1, Vector::from_array([0.05]), 0.01);
        p1.density = 1.0;
        p1.pressure = 1.0;
        p1.smoothing_length = 0.1;
        let mut particles = vec![p0, p1];
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<1>::new();
        run_fluid_force(
            &kernel,
            &tree,
            &search,
            &mut particles,
            1.4,
            FluidForceVariant::Gsph { second_order: false },
            &FluidForceParams {
                conductivity: ArtificialConductivity {
                    enabled: false,
                    alpha: 0.0,
                },
            },
        );
        // equal pressure/density on both sides: the Riemann solve returns
        // the common pressure, so the net momentum contribution from this
        // single pair should be exactly antisymmetric about zero relative
        // velocity, i.e. non-accelerating for a particle at rest.
        assert!(particles[0].acceleration[0].is_finite());
    }

    #[test]
    fn self_pair_is_skipped() {
        let mut particles = vec![Particle::<1>::new_real(0, Vector::from_array([0.0]), 1.0)];
        particles[0].density = 1.0;
        particles[0].pressure = 1.0;
        particles[0].smoothing_length = 0.2;
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<1>::new();
        let visc = MonaghanViscosity {
            use_balsara_switch: false,
        };
        run_fluid_force(
            &kernel,
            &tree,
            &search,
            &mut particles,
            1.4,
            FluidForceVariant::Ssph { viscosity: &visc },
            &FluidForceParams {
                conductivity: ArtificialConductivity {
                    enabled: false,
                    alpha: 0.0,
                },
            },
        );
        assert_eq!(particles[0].acceleration[0], 0.0);
    }
}
