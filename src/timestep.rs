//! CFL-limited timestep stage (spec.md §4.10), grounded in
//! `original_source`'s `include/timestep.hpp`.
//!
//! Computes `dt` as the minimum, over every real particle, of a sound-speed
//! CFL limit, a force CFL limit, and an optional signal-velocity CFL limit
//! derived from the same neighbor list the fluid-force stage already walked.

use crate::particle::Particle;
use crate::tree::{BarnesHutTree, NeighborIndex};

#[derive(Debug, Clone, Copy)]
pub struct TimestepParams {
    pub cfl_sound: f64,
    pub cfl_force: f64,
    /// Enables the additional `dt_visc` signal-velocity limit (spec.md
    /// §4.10's "optional"). Requires a rebuilt tree to look up each
    /// particle's neighbors' sound speeds.
    pub use_signal_velocity_limit: bool,
}

/// `v_sig_max_i = max_j (c_i + c_j - 3 w_ij)` over `i`'s neighbors, the same
/// quantity the Monaghan-viscosity pair term uses (spec.md §4.8), but here
/// taken as a per-particle maximum rather than summed.
fn max_signal_velocity<const D: usize>(
    particle: &Particle<D>,
    tree: &BarnesHutTree<D>,
    search: &[Particle<D>],
    neighbors: &mut Vec<NeighborIndex>,
) -> f64 {
    tree.neighbors_within(search, particle.position, 2.0 * particle.smoothing_length, neighbors);
    let mut v_sig_max = 0.0f64;
    for n in neighbors.iter() {
        let neighbor = &search[n.get()];
        if neighbor.id == particle.id && neighbor.is_real() {
            continue;
        }
        let r_ij = particle.position - neighbor.position;
        let r = r_ij.norm();
        if r < 1e-300 {
            continue;
        }
        let v_ij = particle.velocity - neighbor.velocity;
        let w_ij = v_ij.dot(&r_ij) / r;
        let v_sig = particle.sound_speed + neighbor.sound_speed - 3.0 * w_ij.min(0.0);
        v_sig_max = v_sig_max.max(v_sig);
    }
    v_sig_max
}

/// Computes the global timestep as the minimum CFL-limited value over every
/// real particle. Returns `f64::INFINITY` if `real` is empty (the caller is
/// expected to clamp against `t_end - t` before using it).
pub fn compute_timestep<const D: usize>(
    real: &[Particle<D>],
    tree: Option<(&BarnesHutTree<D>, &[Particle<D>])>,
    params: &TimestepParams,
) -> f64 {
    let mut dt = f64::INFINITY;
    let mut neighbors = Vec::new();

    for particle in real {
        let speed = particle.velocity.norm();
        let dt_sound = params.cfl_sound * particle.smoothing_length / (particle.sound_speed + speed).max(1e-300);
        dt = dt.min(dt_sound);

        let accel = particle.acceleration.norm();
        if accel > 1e-300 {
            let dt_force = params.cfl_force * (particle.smoothing_length / accel).sqrt();
            dt = dt.min(dt_force);
        }

        if params.use_signal_velocity_limit {
            if let Some((tree, search)) = tree {
                let v_sig_max = max_signal_velocity(particle, tree, search, &mut neighbors);
                if v_sig_max > 1e-300 {
                    let dt_visc = params.cfl_sound * particle.smoothing_length / v_sig_max;
                    dt = dt.min(dt_visc);
                }
            }
        }
    }

    dt
}
