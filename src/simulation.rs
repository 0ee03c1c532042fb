//! The integrator driver (spec.md §4.11): a predictor-corrector loop that
//! orchestrates ghost regeneration, tree rebuild, the smoothing-length/density
//! solve, fluid force, gravity, and CFL timestepping in the fixed order
//! spec.md mandates.
//!
//! Grounded in `original_source`'s `include/core/simulation/simulation.hpp`
//! (the `Simulation<Dim>` owner of particles/tree/cache/ghost-manager) and
//! `include/core/plugins/simulation_plugin_v3.hpp`'s division of labor: the
//! plugin supplies *what* to simulate ([`InitialConditionData`]), this
//! driver supplies *how* (all system initialization and the per-step
//! pipeline).

use crate::boundary::BoundaryConfiguration;
use crate::coordinator::TreeCoordinator;
use crate::error::{SphError, SphResult};
use crate::force::{run_fluid_force, FluidForceParams, FluidForceVariant};
use crate::gravity::run_gravity;
use crate::output::{EnergyDiagnostics, ParticleRecord, SnapshotWriter};
use crate::parameters::{KernelImpl, SphParameters, SphVariant};
use crate::particle::Particle;
use crate::periodic::{Periodic, PeriodicRange};
use crate::plugin::InitialConditionData;
use crate::preinteraction::{run_pre_interaction, PreInteractionParams, PreInteractionVariant, TimeDependentAvParams};
use crate::smoothing::SmoothingLengthParams;
use crate::timestep::{compute_timestep, TimestepParams};
use rayon::prelude::*;
use crate::vector::Vector;

/// Converts a target neighbor count into the kernel-bandwidth shape
/// parameter `eta` (`h = eta * (m/rho)^{1/D}` at convergence), following the
/// same `eta` ~ `(N_target)^{1/D}` scaling the original's parameter
/// estimator uses, normalized so `neighbor_number = 32` in 3D recovers the
/// conventional `eta = 1.2`.
fn eta_from_neighbor_number(neighbor_number: f64, dim: usize) -> f64 {
    let reference = match dim {
        1 => 4.0,
        2 => 16.0,
        _ => 32.0,
    };
    1.2 * (neighbor_number / reference).max(1e-3).powf(1.0 / dim as f64)
}

fn periodic_from_boundary<const D: usize>(config: &BoundaryConfiguration<D>) -> Periodic<D> {
    let mut ranges: [Option<PeriodicRange>; D] = [None; D];
    for d in 0..D {
        ranges[d] = config.periodic_ranges[d];
    }
    Periodic::new(ranges)
}

pub struct Simulation<const D: usize> {
    real: Vec<Particle<D>>,
    time: f64,
    dt: f64,
    parameters: SphParameters,
    kernel: KernelImpl<D>,
    coordinator: TreeCoordinator<D>,
    periodic: Periodic<D>,
}

impl<const D: usize> Simulation<D> {
    /// All system initialization (spec.md §6): builds the tree coordinator
    /// and ghost manager, runs the first smoothing-length/density pass so
    /// every real particle has a valid `h`/`density`/`sound_speed` before
    /// the first timestep is proposed.
    pub fn new(ic: InitialConditionData<D>) -> SphResult<Self> {
        if ic.particles.is_empty() {
            return Err(SphError::configuration("particles", "initial condition supplied no particles"));
        }
        ic.boundary_config.validate()?;
        for (i, p) in ic.particles.iter().enumerate() {
            if p.smoothing_length <= 0.0 {
                return Err(SphError::configuration(
                    format!("particles[{i}].smoothing_length"),
                    "smoothing lengths not initialized",
                ));
            }
        }

        let periodic = periodic_from_boundary(&ic.boundary_config);
        let tree_config = ic.parameters.tree_config();
        let kernel = ic.parameters.kernel.build::<D>();
        let mut sim = Simulation {
            real: ic.particles,
            time: ic.parameters.time.start,
            dt: 0.0,
            parameters: ic.parameters,
            kernel,
            coordinator: TreeCoordinator::new(tree_config, ic.boundary_config),
            periodic,
        };

        sim.rebuild()?;
        sim.pre_interaction(0.0);
        sim.sync_cache();
        sim.dt = sim.propose_timestep();
        Ok(sim)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn real_particles(&self) -> &[Particle<D>] {
        &self.real
    }

    fn kernel_support_radius(&self) -> f64 {
        self.real.iter().map(|p| p.smoothing_length).fold(0.0, f64::max)
            * self.kernel.support_radius_factor()
    }

    fn smoothing_params(&self) -> SmoothingLengthParams {
        SmoothingLengthParams {
            eta: eta_from_neighbor_number(self.parameters.physics.neighbor_number, D),
            max_iterations: 50,
            tolerance: 1e-4,
            trust_region_factor: 1.2,
            min_policy: self.parameters.smoothing_length_policy,
        }
    }

    fn pre_interaction_params(&self, dt: f64) -> PreInteractionParams {
        let _ = dt;
        let (variant, use_balsara_switch, time_dependent_av, static_alpha) = match self.parameters.variant {
            SphVariant::Ssph { viscosity } => (
                PreInteractionVariant::Ssph,
                viscosity.use_balsara_switch,
                viscosity.time_dependent.then_some(TimeDependentAvParams {
                    alpha_max: viscosity.alpha_max,
                    alpha_min: viscosity.alpha_min,
                    epsilon: viscosity.epsilon,
                }),
                viscosity.alpha,
            ),
            SphVariant::Disph { viscosity } => (
                PreInteractionVariant::Disph,
                viscosity.use_balsara_switch,
                viscosity.time_dependent.then_some(TimeDependentAvParams {
                    alpha_max: viscosity.alpha_max,
                    alpha_min: viscosity.alpha_min,
                    epsilon: viscosity.epsilon,
                }),
                viscosity.alpha,
            ),
            SphVariant::Gsph { second_order } => (PreInteractionVariant::Gsph { second_order }, false, None, 0.0),
        };
        PreInteractionParams {
            gamma: self.parameters.physics.gamma,
            smoothing: self.smoothing_params(),
            variant,
            use_balsara_switch,
            time_dependent_av,
            static_alpha,
        }
    }

    fn fluid_force_params(&self) -> FluidForceParams {
        FluidForceParams {
            conductivity: self.parameters.artificial_conductivity.to_conductivity(),
        }
    }

    /// Step 1 of spec.md §4.11: predicts half-step velocity/energy, advances
    /// position/velocity/energy over `dt`, estimates a fresh sound speed,
    /// and wraps positions back into periodic domains.
    fn predict(&mut self, dt: f64) {
        let gamma = self.parameters.physics.gamma;
        let periodic = &self.periodic;
        self.real.par_iter_mut().for_each(|p| {
            p.velocity_predicted = p.velocity + p.acceleration * (0.5 * dt);
            p.specific_energy_predicted = p.specific_energy + p.specific_energy_dot * (0.5 * dt);
            p.position += p.velocity_predicted * dt;
            p.velocity += p.acceleration * dt;
            p.specific_energy += p.specific_energy_dot * dt;
            p.sound_speed = (gamma * (gamma - 1.0) * p.specific_energy.max(0.0)).sqrt();
            p.position = periodic.apply_periodic_condition(p.position);
        });
    }

    /// Steps 2-4: regenerates ghosts from the newly predicted positions,
    /// extends the cache, and rebuilds the tree (the atomic sequence lives
    /// in [`TreeCoordinator::rebuild`]).
    fn rebuild(&mut self) -> SphResult<()> {
        let support_radius = self.kernel_support_radius().max(1e-12);
        self.coordinator.ghost_manager_mut().set_kernel_support_radius(support_radius);
        self.coordinator.rebuild(&self.real)
    }

    /// Step 5: adaptive smoothing length, density, pressure, sound speed,
    /// Balsara switch, (GSPH 2nd order) gradients.
    fn pre_interaction(&mut self, dt: f64) {
        let params = self.pre_interaction_params(dt);
        let search = self.coordinator.cache().get_search_particles();
        run_pre_interaction(&self.kernel, self.coordinator.tree(), search.as_slice(), &mut self.real, dt, &params);
    }

    /// Step 6: refresh ghost thermodynamics now that density/pressure/sound
    /// speed changed in the pre-interaction stage, without moving anything.
    fn sync_cache(&mut self) {
        self.coordinator.refresh_properties(&self.real);
    }

    /// Step 7: momentum/energy derivatives for the configured SPH variant.
    fn fluid_force(&mut self) {
        let gamma = self.parameters.physics.gamma;
        let params = self.fluid_force_params();
        let search = self.coordinator.cache().get_search_particles();
        let tree = self.coordinator.tree();
        match self.parameters.variant {
            SphVariant::Ssph { viscosity } => {
                let monaghan = viscosity.to_monaghan();
                run_fluid_force(
                    &self.kernel,
                    tree,
                    search.as_slice(),
                    &mut self.real,
                    gamma,
                    FluidForceVariant::Ssph { viscosity: &monaghan },
                    &params,
                );
            }
            SphVariant::Disph { viscosity } => {
                let monaghan = viscosity.to_monaghan();
                run_fluid_force(
                    &self.kernel,
                    tree,
                    search.as_slice(),
                    &mut self.real,
                    gamma,
                    FluidForceVariant::Disph { viscosity: &monaghan },
                    &params,
                );
            }
            SphVariant::Gsph { second_order } => {
                run_fluid_force(
                    &self.kernel,
                    tree,
                    search.as_slice(),
                    &mut self.real,
                    gamma,
                    FluidForceVariant::Gsph { second_order },
                    &params,
                );
            }
        }
    }

    /// Step 8: tree-code gravity, accumulating into the acceleration the
    /// fluid-force stage already wrote.
    fn gravity(&mut self) {
        let search = self.coordinator.cache().get_search_particles();
        run_gravity(
            self.coordinator.tree(),
            search.as_slice(),
            &mut self.real,
            self.parameters.gravity,
            &self.periodic,
        );
    }

    /// Step 9: corrects velocity/energy from the half-step predictor values
    /// using the just-computed acceleration/energy-derivative, then
    /// recomputes sound speed from the corrected energy.
    fn correct(&mut self, dt: f64) {
        let gamma = self.parameters.physics.gamma;
        self.real.par_iter_mut().for_each(|p| {
            p.velocity = p.velocity_predicted + p.acceleration * (0.5 * dt);
            p.specific_energy = p.specific_energy_predicted + p.specific_energy_dot * (0.5 * dt);
            if p.density > 0.0 {
                p.sound_speed = (gamma * (gamma - 1.0) * p.specific_energy.max(0.0)).sqrt();
            }
        });
    }

    fn timestep_params(&self) -> TimestepParams {
        TimestepParams {
            cfl_sound: self.parameters.cfl.sound,
            cfl_force: self.parameters.cfl.force,
            use_signal_velocity_limit: true,
        }
    }

    fn propose_timestep(&self) -> f64 {
        let search = self.coordinator.cache().get_search_particles();
        compute_timestep(
            &self.real,
            Some((self.coordinator.tree(), search.as_slice())),
            &self.timestep_params(),
        )
    }

    /// Runs exactly one integration step in the order spec.md §4.11
    /// mandates, advancing `self.time` by the current `self.dt` and
    /// proposing the next one.
    pub fn step(&mut self) -> SphResult<()> {
        let dt = self.dt;
        self.predict(dt);
        self.rebuild()?;
        self.pre_interaction(dt);
        self.sync_cache();
        self.fluid_force();
        self.gravity();
        self.correct(dt);
        self.time += dt;
        self.dt = self.propose_timestep();
        Ok(())
    }

    pub fn energy_diagnostics(&self) -> EnergyDiagnostics {
        EnergyDiagnostics::compute(&self.real, self.time)
    }

    fn snapshot_records(&self) -> Vec<ParticleRecord<D>> {
        self.real.iter().map(ParticleRecord::from_particle).collect()
    }

    /// Runs the simulation to `parameters.time.end`, publishing snapshots
    /// and energy diagnostics through `writer` at the configured intervals
    /// (spec.md §6's output contract — the driver only publishes the
    /// particle array, never touches the file format).
    pub fn run(&mut self, writer: &mut impl SnapshotWriter<D>) -> SphResult<()> {
        let end = self.parameters.time.end;
        let output_interval = self.parameters.time.output_interval.max(1e-300);
        let energy_interval = self.parameters.time.energy_output_interval.max(1e-300);
        let mut next_output = self.time + output_interval;
        let mut next_energy = self.time + energy_interval;

        writer.write_snapshot(self.time, &self.snapshot_records());
        writer.write_energy(&self.energy_diagnostics());

        while self.time < end {
            if self.time + self.dt > end {
                self.dt = (end - self.time).max(0.0);
            }
            self.step()?;

            if self.time >= next_output {
                writer.write_snapshot(self.time, &self.snapshot_records());
                next_output += output_interval;
            }
            if self.time >= next_energy {
                writer.write_energy(&self.energy_diagnostics());
                next_energy += energy_interval;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::AxisBoundary;
    use crate::output::NullWriter;
    use crate::parameters::{GravityConfig, KernelKind, SphParametersBuilder, TreeParameters};
    use crate::smoothing::MinSmoothingPolicy;

    fn no_boundary_2d() -> BoundaryConfiguration<2> {
        BoundaryConfiguration {
            lower: [AxisBoundary::none(0.0), AxisBoundary::none(0.0)],
            upper: [AxisBoundary::none(10.0), AxisBoundary::none(10.0)],
            periodic_ranges: [None, None],
        }
    }

    fn uniform_gas_block(n_per_axis: usize, spacing: f64) -> Vec<Particle<2>> {
        let mut particles = Vec::new();
        let mut id = 0;
        for i in 0..n_per_axis {
            for j in 0..n_per_axis {
                let pos = Vector::from_array([1.0 + i as f64 * spacing, 1.0 + j as f64 * spacing]);
                let mut p = Particle::new_real(id, pos, spacing * spacing);
                p.density = 1.0;
                p.specific_energy = 1.0;
                p.smoothing_length = 2.0 * spacing;
                particles.push(p);
                id += 1;
            }
        }
        particles
    }

    fn ssph_params() -> SphParameters {
        SphParametersBuilder::new()
            .with_time(0.0, 0.05, 0.01, 0.01)
            .with_cfl(0.3, 0.25)
            .with_physics(16.0, 1.4)
            .with_kernel(KernelKind::CubicSpline)
            .with_tree_params(TreeParameters::default().max_level, TreeParameters::default().leaf_particle_num)
            .as_ssph()
            .unwrap()
            .with_artificial_viscosity(1.0, true, false, 2.0, 0.1, 0.2)
            .build_ssph()
            .unwrap()
    }

    #[test]
    fn new_rejects_uninitialized_smoothing_length() {
        let mut particles = uniform_gas_block(4, 0.1);
        particles[0].smoothing_length = 0.0;
        let ic = InitialConditionData {
            particles,
            parameters: ssph_params(),
            boundary_config: no_boundary_2d(),
        };
        assert!(Simulation::new(ic).is_err());
    }

    #[test]
    fn initializing_computes_a_positive_timestep() {
        let ic = InitialConditionData {
            particles: uniform_gas_block(6, 0.1),
            parameters: ssph_params(),
            boundary_config: no_boundary_2d(),
        };
        let sim = Simulation::new(ic).unwrap();
        assert!(sim.dt() > 0.0 && sim.dt().is_finite());
        for p in sim.real_particles() {
            assert!(p.density > 0.0);
            assert!(p.sound_speed > 0.0);
        }
    }

    #[test]
    fn stepping_advances_time_and_keeps_invariants() {
        let ic = InitialConditionData {
            particles: uniform_gas_block(6, 0.1),
            parameters: ssph_params(),
            boundary_config: no_boundary_2d(),
        };
        let mut sim = Simulation::new(ic).unwrap();
        let t0 = sim.time();
        sim.step().unwrap();
        assert!(sim.time() > t0);
        for p in sim.real_particles() {
            assert!(p.density > 0.0);
            assert!(p.smoothing_length > 0.0);
            assert!(p.sound_speed > 0.0);
        }
    }

    #[test]
    fn run_reaches_the_configured_end_time() {
        let ic = InitialConditionData {
            particles: uniform_gas_block(5, 0.1),
            parameters: ssph_params(),
            boundary_config: no_boundary_2d(),
        };
        let mut sim = Simulation::new(ic).unwrap();
        let mut writer = NullWriter;
        sim.run(&mut writer).unwrap();
        assert!((sim.time() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn gravity_enabled_run_keeps_finite_state() {
        let mut params = ssph_params();
        params.gravity = GravityConfig::NewtonianGravity { g: 1.0, theta: 0.5 };
        params.smoothing_length_policy = MinSmoothingPolicy::ConstantMin(0.05);
        let ic = InitialConditionData {
            particles: uniform_gas_block(5, 0.1),
            parameters: params,
            boundary_config: no_boundary_2d(),
        };
        let mut sim = Simulation::new(ic).unwrap();
        sim.step().unwrap();
        for p in sim.real_particles() {
            assert!(p.acceleration.norm().is_finite());
            assert!(p.potential.is_finite());
        }
    }
}
