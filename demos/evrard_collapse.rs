//! Evrard collapse (spec.md §8, scenario 3): a self-gravitating 3D sphere
//! with a `rho(r) ~ 1/r` profile, collapsing under Newtonian gravity while
//! SSPH pressure forces resist it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gravisph::boundary::{AxisBoundary, BoundaryConfiguration};
use gravisph::logging::init_logging;
use gravisph::output::{EnergyDiagnostics, ParticleRecord, SnapshotWriter};
use gravisph::parameters::{KernelKind, SphParameters, SphParametersBuilder};
use gravisph::smoothing::MinSmoothingPolicy;
use gravisph::plugin::{InitialConditionData, InitialConditionPlugin};
use gravisph::{Particle, Simulation, Vector};

const GAMMA: f64 = 5.0 / 3.0;
const TOTAL_MASS: f64 = 1.0;
const RADIUS: f64 = 1.0;
const SPECIFIC_ENERGY: f64 = 0.05;
const N: usize = 4000;
const SEED: u64 = 1;

struct EvrardCollapse;

impl EvrardCollapse {
    /// Samples `N` positions from a `rho(r) ~ 1/r` distribution inside a
    /// sphere of radius `RADIUS` by inverting its cumulative mass profile
    /// (`M(<r) ~ r^2`, so `r = R * sqrt(u)` for `u` uniform on `[0, 1]`) and
    /// placing each sample at a uniformly random direction.
    fn particles(&self) -> Vec<Particle<3>> {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mass_per_particle = TOTAL_MASS / N as f64;
        let mut mean_spacing_accumulator = 0.0;

        let mut particles = Vec::with_capacity(N);
        for id in 0..N {
            let u: f64 = rng.gen_range(0.0..1.0);
            let r = RADIUS * u.sqrt();

            let cos_theta: f64 = rng.gen_range(-1.0..1.0);
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let position = Vector::from_array([
                r * sin_theta * phi.cos(),
                r * sin_theta * phi.sin(),
                r * cos_theta,
            ]);

            let mut p = Particle::new_real(id, position, mass_per_particle);
            p.specific_energy = SPECIFIC_ENERGY;
            // local number density ~ N / (4 pi r^2) for this profile; invert
            // to an estimated interparticle spacing as the initial h guess.
            let local_spacing = (mass_per_particle / density_profile(r.max(1e-3))).cbrt();
            p.smoothing_length = 2.0 * local_spacing;
            mean_spacing_accumulator += local_spacing;
            particles.push(p);
        }

        let _ = mean_spacing_accumulator / N as f64;
        particles
    }

    fn parameters(&self) -> SphParameters {
        let mut params = SphParametersBuilder::new()
            .with_time(0.0, 0.8, 0.05, 0.02)
            .with_cfl(0.3, 0.25)
            .with_physics(32.0, GAMMA)
            .with_kernel(KernelKind::CubicSpline)
            .with_gravity(1.0, 0.5)
            .as_ssph()
            .expect("common parameters are set before transitioning to SSPH")
            .with_artificial_viscosity(1.0, true, false, 1.0, 0.1, 0.2)
            .build_ssph()
            .expect("viscosity was supplied");
        params.smoothing_length_policy = MinSmoothingPolicy::PhysicsBased { alpha: 2.0, expected_max_density: 250.0 };
        params
    }

    fn boundary(&self) -> BoundaryConfiguration<3> {
        BoundaryConfiguration {
            lower: [
                AxisBoundary::none(-10.0 * RADIUS),
                AxisBoundary::none(-10.0 * RADIUS),
                AxisBoundary::none(-10.0 * RADIUS),
            ],
            upper: [
                AxisBoundary::none(10.0 * RADIUS),
                AxisBoundary::none(10.0 * RADIUS),
                AxisBoundary::none(10.0 * RADIUS),
            ],
            periodic_ranges: [None, None, None],
        }
    }
}

/// `rho(r) = M / (2 pi R^2 r)`, normalized so `integral_0^R rho * 4 pi r^2
/// dr = M` for the `rho ~ 1/r` profile spec.md's scenario 3 specifies.
fn density_profile(r: f64) -> f64 {
    TOTAL_MASS / (2.0 * std::f64::consts::PI * RADIUS * RADIUS * r)
}

impl InitialConditionPlugin<3> for EvrardCollapse {
    fn name(&self) -> &str {
        "evrard_collapse"
    }

    fn create_initial_condition(&self) -> InitialConditionData<3> {
        InitialConditionData {
            particles: self.particles(),
            parameters: self.parameters(),
            boundary_config: self.boundary(),
        }
    }
}

struct ConsoleWriter;

impl SnapshotWriter<3> for ConsoleWriter {
    fn write_snapshot(&mut self, time: f64, records: &[ParticleRecord<3>]) {
        let max_density = records.iter().map(|r| r.density).fold(0.0, f64::max);
        let com: Vector<3> = records
            .iter()
            .fold(Vector::zero(), |acc, r| acc + r.position * r.mass)
            / TOTAL_MASS;
        println!("t={time:.4}  max(rho)={max_density:.2}  |com|={:.5}", com.norm());
    }

    fn write_energy(&mut self, energy: &EnergyDiagnostics) {
        println!(
            "  energy: t={:.4} kinetic={:.5} thermal={:.5} potential={:.5} total={:.5}",
            energy.time,
            energy.kinetic,
            energy.thermal,
            energy.potential,
            energy.total()
        );
    }
}

fn main() {
    init_logging(log::LevelFilter::Warn);

    let plugin = EvrardCollapse;
    let ic = plugin.create_initial_condition();
    let mut sim = Simulation::new(ic).expect("initial condition builds a valid simulation");

    let mut writer = ConsoleWriter;
    sim.run(&mut writer).expect("run completes without a fatal configuration/invariant error");
}
