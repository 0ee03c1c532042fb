//! Adaptive smoothing-length solver: per-particle Newton-Raphson on the
//! mass-in-support equation `m * (eta/h)^D = rho(h)`, with trust-region
//! clamping and a choice of minimum-smoothing-length policy.
//!
//! Grounded in `original_source`'s pre-interaction smoothing-length update
//! (`include/pre_interaction.hpp`) and `include/core/sph_parameters_builder_base.hpp`'s
//! `with_smoothing_length_limits(...)` for the minimum-enforcement policies.

use crate::kernel::Kernel;
use crate::logging::WarnOnce;
use crate::particle::Particle;
use crate::tree::{BarnesHutTree, NeighborIndex};
use crate::vector::Vector;

static NON_CONVERGENCE_WARNING: WarnOnce = WarnOnce::new();

/// Selects the per-neighbor weight the Newton-Raphson residual sums over
/// (spec.md §4.6): SSPH/GSPH solve on ordinary mass-weighted density,
/// DISPH solves on the pressure-energy density `y = Σ m_j u_j W_ij`
/// instead, following Saitoh & Makino (2013)/Hopkins (2013)'s
/// pressure-energy formulation (this crate's resolution of the Open
/// Question spec.md §4.6 leaves unspecified — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DensityWeighting {
    MassWeighted,
    EnergyWeighted,
}

impl DensityWeighting {
    fn weight<const D: usize>(&self, candidate: &Particle<D>) -> f64 {
        match self {
            DensityWeighting::MassWeighted => candidate.mass,
            DensityWeighting::EnergyWeighted => candidate.mass * candidate.specific_energy.max(1e-300),
        }
    }

    fn target(&self, eta: f64, h: f64, dim: i32, mass: f64, specific_energy: f64) -> f64 {
        let base = mass * (eta / h).powi(dim);
        match self {
            DensityWeighting::MassWeighted => base,
            DensityWeighting::EnergyWeighted => base * specific_energy.max(1e-300),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MinSmoothingPolicy {
    /// No floor: the solver's converged `h` is used as-is.
    NoMin,
    /// A single fixed floor applied to every particle.
    ConstantMin(f64),
    /// Floor derived from a fixed expected maximum density rather than the
    /// particle's own (possibly already-collapsed) smoothing length: `h >=
    /// alpha * (m_i / rho_expected_max)^(1/D)` (spec.md §4.6), arresting the
    /// self-gravitating runaway a floor tracking the current `h` could not.
    PhysicsBased { alpha: f64, expected_max_density: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct SmoothingLengthParams {
    /// Neighbor-number shape parameter (`h = eta * (m/rho)^{1/D}` at a
    /// converged solution).
    pub eta: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Newton steps are clamped so `h` changes by no more than this factor
    /// per iteration, preventing the solver from diverging out of the
    /// kernel's valid range.
    pub trust_region_factor: f64,
    pub min_policy: MinSmoothingPolicy,
}

impl Default for SmoothingLengthParams {
    fn default() -> Self {
        SmoothingLengthParams {
            eta: 1.2,
            max_iterations: 30,
            tolerance: 1e-3,
            trust_region_factor: 1.2,
            min_policy: MinSmoothingPolicy::NoMin,
        }
    }
}

pub struct SmoothingLengthResult {
    pub smoothing_length: f64,
    pub density: f64,
    /// Grad-h correction factor `f_i` (spec.md §4.6).
    pub grad_h: f64,
    pub neighbors: Vec<NeighborIndex>,
    pub converged: bool,
}

/// Solves for `position`'s smoothing length by iterating the density sum
/// over whatever is currently within `2h` according to `tree`.
#[allow(clippy::too_many_arguments)]
pub fn solve_smoothing_length<const D: usize, K: Kernel<D>>(
    kernel: &K,
    tree: &BarnesHutTree<D>,
    search_particles: &[Particle<D>],
    position: Vector<D>,
    mass: f64,
    specific_energy: f64,
    initial_guess: f64,
    weighting: DensityWeighting,
    params: &SmoothingLengthParams,
) -> SmoothingLengthResult {
    let mut h = initial_guess.max(1e-12);
    let mut neighbors = Vec::new();
    let mut density = 0.0;
    let mut d_density_dh = 0.0;
    let mut converged = false;
    let mut iterations_used = 0;

    for iteration in 0..params.max_iterations {
        iterations_used = iteration + 1;
        tree.neighbors_within_fixed_radius(search_particles, position, 2.0 * h, &mut neighbors);

        density = 0.0;
        d_density_dh = 0.0;
        for &n in &neighbors {
            let candidate = &search_particles[n.get()];
            let r = position.distance(&candidate.position);
            let weight = weighting.weight(candidate);
            density += weight * kernel.w(r, h);
            d_density_dh += weight * kernel.dwdh(r, h);
        }

        let target = weighting.target(params.eta, h, D as i32, mass, specific_energy);
        let f = target - density;
        if density > 0.0 && (f / density).abs() < params.tolerance {
            converged = true;
            break;
        }

        let d_target_dh = -(D as f64) * target / h;
        let f_prime = d_target_dh - d_density_dh;
        if f_prime.abs() < 1e-300 {
            break;
        }

        let mut h_new = h - f / f_prime;
        let lo = h / params.trust_region_factor;
        let hi = h * params.trust_region_factor;
        h_new = h_new.clamp(lo, hi).max(1e-12);
        h = h_new;
    }

    if !converged {
        NON_CONVERGENCE_WARNING.warn_once(|| {
            format!("smoothing-length solver did not converge after {iterations_used} iterations (h = {h})")
        });
    }

    let grad_h = if d_density_dh.is_finite() && density > 0.0 {
        let omega = 1.0 + (h / (D as f64 * density)) * d_density_dh;
        if omega.abs() > 1e-12 {
            1.0 / omega
        } else {
            1.0
        }
    } else {
        1.0
    };

    let (h, density) = apply_min_policy(
        params.min_policy,
        h,
        density,
        mass,
        weighting,
        kernel,
        tree,
        search_particles,
        position,
        &mut neighbors,
    );

    SmoothingLengthResult {
        smoothing_length: h,
        density,
        grad_h,
        neighbors,
        converged,
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_min_policy<const D: usize, K: Kernel<D>>(
    policy: MinSmoothingPolicy,
    h: f64,
    density: f64,
    mass: f64,
    weighting: DensityWeighting,
    kernel: &K,
    tree: &BarnesHutTree<D>,
    search_particles: &[Particle<D>],
    position: Vector<D>,
    neighbors: &mut Vec<NeighborIndex>,
) -> (f64, f64) {
    let floor = match policy {
        MinSmoothingPolicy::NoMin => return (h, density),
        MinSmoothingPolicy::ConstantMin(min_h) => min_h,
        MinSmoothingPolicy::PhysicsBased { alpha, expected_max_density } => {
            alpha * (mass / expected_max_density).powf(1.0 / D as f64)
        }
    };
    if h >= floor {
        return (h, density);
    }
    tree.neighbors_within_fixed_radius(search_particles, position, 2.0 * floor, neighbors);
    let density_at_floor: f64 = neighbors
        .iter()
        .map(|n| {
            let candidate = &search_particles[n.get()];
            let r = position.distance(&candidate.position);
            weighting.weight(candidate) * kernel.w(r, floor)
        })
        .sum();
    (floor, density_at_floor)
}
