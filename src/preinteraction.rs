//! The pre-interaction stage: smoothing length + density/pressure solve,
//! equation of state, the Balsara switch, time-dependent artificial-viscosity
//! update, and (GSPH 2nd order only) gradient reconstruction — run once per
//! step before the fluid-force stage.
//!
//! Grounded in `original_source`'s `include/pre_interaction.hpp` (the
//! `Module<Dim>` stage that owns exactly these computations),
//! `include/disph/d_pre_interaction.hpp` for the DISPH residual override, and
//! `include/algorithms/viscosity/monaghan_viscosity.hpp`'s references for the
//! time-dependent-alpha decay (SPEC_FULL.md B.4).

use crate::kernel::Kernel;
use crate::particle::Particle;
use crate::smoothing::{solve_smoothing_length, DensityWeighting, SmoothingLengthParams};
use crate::tree::BarnesHutTree;
use crate::vector::Vector;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct TimeDependentAvParams {
    pub alpha_max: f64,
    pub alpha_min: f64,
    /// Relaxation timescale factor; the decay timescale is `h / (epsilon *
    /// c)`.
    pub epsilon: f64,
}

/// Which SPH variant's equation-of-state and smoothing-length residual to
/// apply (spec.md §4.6/§4.7). This is a narrower view than
/// [`crate::parameters::SphVariant`] — it carries only what the
/// pre-interaction stage itself needs to branch on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreInteractionVariant {
    Ssph,
    Disph,
    Gsph { second_order: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct PreInteractionParams {
    pub gamma: f64,
    pub smoothing: SmoothingLengthParams,
    pub variant: PreInteractionVariant,
    pub use_balsara_switch: bool,
    pub time_dependent_av: Option<TimeDependentAvParams>,
    /// The configured artificial-viscosity `alpha` (spec.md §6). Written
    /// onto every particle's `alpha_av` each step when `time_dependent_av`
    /// is `None`, so the fluid-force stage's per-particle Monaghan term sees
    /// the value the user configured rather than whatever `alpha_av`
    /// happened to be initialized to. When `time_dependent_av` is `Some`,
    /// this is unused — the relaxation below owns `alpha_av` instead.
    pub static_alpha: f64,
}

fn ideal_gas_pressure(gamma: f64, density: f64, specific_energy: f64) -> f64 {
    (gamma - 1.0) * density * specific_energy.max(0.0)
}

fn sound_speed_from_pressure(gamma: f64, pressure: f64, density: f64) -> f64 {
    if density > 0.0 {
        (gamma * pressure / density).max(0.0).sqrt()
    } else {
        0.0
    }
}

/// `c = sqrt(gamma (gamma-1) u)`: the ideal-gas sound speed expressed
/// directly from specific internal energy, independent of density. Used by
/// DISPH, whose pressure comes from the energy-weighted kernel sum rather
/// than density (spec.md §4.7.4's "DISPH equivalent").
fn sound_speed_from_energy(gamma: f64, specific_energy: f64) -> f64 {
    (gamma * (gamma - 1.0) * specific_energy.max(0.0)).sqrt()
}

/// Plain mass-weighted density sum over an already-known neighbor list and
/// converged `h`, used to give DISPH particles a bookkeeping `density` field
/// (spec.md invariant P1 requires `density > 0` for every variant) without
/// running a second Newton solve.
fn direct_mass_density<const D: usize, K: Kernel<D>>(
    kernel: &K,
    search: &[Particle<D>],
    position: Vector<D>,
    h: f64,
    neighbors: &[crate::tree::NeighborIndex],
) -> f64 {
    neighbors
        .iter()
        .map(|n| {
            let candidate = &search[n.get()];
            let r = position.distance(&candidate.position);
            candidate.mass * kernel.w(r, h)
        })
        .sum()
}

/// Runs the pre-interaction stage over every real particle. `search`
/// particles (real ⧺ ghosts, as cached before this call) supply neighbor
/// data; the results are written back into `real`.
pub fn run_pre_interaction<const D: usize, K: Kernel<D> + Sync>(
    kernel: &K,
    tree: &BarnesHutTree<D>,
    search: &[Particle<D>],
    real: &mut [Particle<D>],
    dt: f64,
    params: &PreInteractionParams,
) {
    let weighting = match params.variant {
        PreInteractionVariant::Ssph | PreInteractionVariant::Gsph { .. } => DensityWeighting::MassWeighted,
        PreInteractionVariant::Disph => DensityWeighting::EnergyWeighted,
    };

    real.par_iter_mut().for_each(|particle| {
        let result = solve_smoothing_length(
            kernel,
            tree,
            search,
            particle.position,
            particle.mass,
            particle.specific_energy,
            particle.smoothing_length.max(1e-6),
            weighting,
            &params.smoothing,
        );
        particle.smoothing_length = result.smoothing_length;
        particle.grad_h = result.grad_h;
        particle.neighbor_count = result.neighbors.len();
        let h = particle.smoothing_length;

        match params.variant {
            PreInteractionVariant::Ssph | PreInteractionVariant::Gsph { .. } => {
                particle.density = result.density;
                particle.pressure = ideal_gas_pressure(params.gamma, particle.density, particle.specific_energy);
                particle.sound_speed = sound_speed_from_pressure(params.gamma, particle.pressure, particle.density);
            }
            PreInteractionVariant::Disph => {
                particle.energy_density = result.density;
                particle.density = direct_mass_density(kernel, search, particle.position, h, &result.neighbors);
                particle.pressure = (params.gamma - 1.0) * particle.energy_density;
                particle.sound_speed = sound_speed_from_energy(params.gamma, particle.specific_energy);
            }
        }

        let mut div_v = 0.0;
        let mut curl_z = 0.0;
        let mut curl_vec = Vector::<D>::zero();
        let mut grad_density = Vector::<D>::zero();
        let mut grad_pressure = Vector::<D>::zero();
        let mut grad_velocity = [Vector::<D>::zero(); D];
        let second_order = matches!(params.variant, PreInteractionVariant::Gsph { second_order: true });

        for n in &result.neighbors {
            let neighbor = &search[n.get()];
            if neighbor.mass <= 0.0 {
                continue;
            }
            let r_ij = particle.position - neighbor.position;
            let r = r_ij.norm();
            if r < 1e-300 || particle.density <= 0.0 {
                continue;
            }
            let grad_w = kernel.grad_w(r_ij, r, h);
            let v_ij = particle.velocity - neighbor.velocity;
            let weight = neighbor.mass / particle.density;
            div_v -= weight * v_ij.dot(&grad_w);
            match D {
                2 => curl_z += weight * v_ij.cross2(&grad_w),
                3 => curl_vec += v_ij.cross3(&grad_w) * weight,
                _ => {}
            }

            if second_order {
                grad_density += grad_w * (weight * (neighbor.density - particle.density));
                grad_pressure += grad_w * (weight * (neighbor.pressure - particle.pressure));
                for k in 0..D {
                    grad_velocity[k] += grad_w * (weight * (neighbor.velocity[k] - particle.velocity[k]));
                }
            }
        }

        if second_order {
            particle.grad_density = grad_density;
            particle.grad_pressure = grad_pressure;
            particle.grad_velocity = grad_velocity;
        }

        let curl_magnitude = match D {
            1 => 0.0,
            2 => curl_z.abs(),
            3 => curl_vec.norm(),
            _ => unreachable!("Vector dimension must be 1, 2 or 3"),
        };

        particle.balsara = if params.use_balsara_switch {
            let denom = div_v.abs() + curl_magnitude + 1e-4 * particle.sound_speed / h.max(1e-300);
            if denom > 0.0 {
                div_v.abs() / denom
            } else {
                1.0
            }
        } else {
            1.0
        };

        if let Some(av) = params.time_dependent_av {
            let timescale = h / (av.epsilon * particle.sound_speed.max(1e-12));
            let target = if div_v < 0.0 { av.alpha_max } else { av.alpha_min };
            let rate = 1.0 / timescale.max(1e-12);
            particle.alpha_av += (target - particle.alpha_av) * rate * dt;
            particle.alpha_av = particle.alpha_av.clamp(av.alpha_min, av.alpha_max);
        } else if !matches!(params.variant, PreInteractionVariant::Gsph { .. }) {
            particle.alpha_av = params.static_alpha;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CubicSpline;
    use crate::tree::TreeConfig;
    use crate::vector::Vector;

    fn uniform_box(n_per_axis: usize, spacing: f64) -> Vec<Particle<2>> {
        let mut particles = Vec::new();
        let mut id = 0;
        for i in 0..n_per_axis {
            for j in 0..n_per_axis {
                let pos = Vector::from_array([i as f64 * spacing, j as f64 * spacing]);
                let mut p = Particle::new_real(id, pos, spacing * spacing);
                p.smoothing_length = 2.0 * spacing;
                p.specific_energy = 1.0;
                particles.push(p);
                id += 1;
            }
        }
        particles
    }

    fn default_params(variant: PreInteractionVariant, balsara: bool) -> PreInteractionParams {
        PreInteractionParams {
            gamma: 5.0 / 3.0,
            smoothing: SmoothingLengthParams::default(),
            variant,
            use_balsara_switch: balsara,
            time_dependent_av: None,
            static_alpha: 1.0,
        }
    }

    #[test]
    fn static_uniform_field_has_zero_divergence_and_full_balsara() {
        let mut particles = uniform_box(9, 0.1);
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<2>::new();
        let params = default_params(PreInteractionVariant::Ssph, true);
        run_pre_interaction(&kernel, &tree, &search, &mut particles, 0.01, &params);
        for p in &particles {
            assert!(p.density > 0.0);
            assert!(p.pressure >= 0.0);
            assert!(p.sound_speed >= 0.0);
        }
    }

    #[test]
    fn disph_produces_positive_density_and_pressure() {
        let mut particles = uniform_box(9, 0.1);
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<2>::new();
        let params = default_params(PreInteractionVariant::Disph, false);
        run_pre_interaction(&kernel, &tree, &search, &mut particles, 0.01, &params);
        for p in &particles {
            assert!(p.density > 0.0);
            assert!(p.energy_density > 0.0);
            assert!(p.pressure > 0.0);
            assert!(p.sound_speed > 0.0);
        }
    }

    #[test]
    fn gsph_second_order_fills_gradients_with_nonuniform_pressure() {
        let mut particles = uniform_box(9, 0.1);
        for (i, p) in particles.iter_mut().enumerate() {
            p.specific_energy = 1.0 + 0.1 * i as f64;
        }
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<2>::new();
        let params = default_params(PreInteractionVariant::Gsph { second_order: true }, false);
        run_pre_interaction(&kernel, &tree, &search, &mut particles, 0.01, &params);
        assert!(particles.iter().any(|p| p.grad_pressure.norm() > 0.0));
    }

    #[test]
    fn time_dependent_av_relaxes_toward_alpha_min_in_steady_flow() {
        let mut particles = uniform_box(5, 0.1);
        for p in particles.iter_mut() {
            p.alpha_av = 1.5;
        }
        let search = particles.clone();
        let tree = BarnesHutTree::build(&mut particles.clone(), TreeConfig::default());
        let kernel = CubicSpline::<2>::new();
        let params = PreInteractionParams {
            time_dependent_av: Some(TimeDependentAvParams {
                alpha_max: 1.5,
                alpha_min: 0.1,
                epsilon: 0.2,
            }),
            ..default_params(PreInteractionVariant::Ssph, false)
        };
        run_pre_interaction(&kernel, &tree, &search, &mut particles, 0.5, &params);
        for p in &particles {
            assert!(p.alpha_av < 1.5);
        }
    }
}
