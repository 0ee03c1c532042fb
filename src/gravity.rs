//! Gravity stage (spec.md §4.9): wires [`crate::parameters::GravityConfig`]
//! to the Barnes-Hut tree-code walk in [`crate::tree::gravity`].
//!
//! Runs strictly after the fluid-force stage so `acceleration` accumulates
//! hydro-then-gravity (spec.md: "order is hydro-then-gravity so
//! accelerations sum"); never clears `acceleration` itself.

use crate::parameters::GravityConfig;
use crate::particle::Particle;
use crate::periodic::Periodic;
use crate::tree::BarnesHutTree;
use rayon::prelude::*;

/// Adds gravitational acceleration and potential to every real particle. A
/// no-op when `gravity` is [`GravityConfig::NoGravity`].
pub fn run_gravity<const D: usize>(
    tree: &BarnesHutTree<D>,
    search: &[Particle<D>],
    real: &mut [Particle<D>],
    gravity: GravityConfig,
    periodic: &Periodic<D>,
) {
    let g = match gravity {
        GravityConfig::NoGravity => return,
        GravityConfig::NewtonianGravity { g, .. } => g,
    };

    real.par_iter_mut().for_each(|particle| {
        let softening = particle.smoothing_length;
        let result = tree.calc_gravity(particle.position, Some(particle.id), search, g, softening, periodic);
        particle.acceleration += result.acceleration;
        particle.potential = result.potential;
    });
}
