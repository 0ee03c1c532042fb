//! Sod shock tube (spec.md §8, scenario 1): a 1D SSPH run through a
//! discontinuous density/pressure jump, driven entirely through the public
//! [`InitialConditionPlugin`] contract the way an external collaborator
//! would use this crate.

use gravisph::boundary::{AxisBoundary, BoundaryConfiguration};
use gravisph::logging::init_logging;
use gravisph::output::{EnergyDiagnostics, ParticleRecord, SnapshotWriter};
use gravisph::parameters::{KernelKind, SphParameters, SphParametersBuilder};
use gravisph::periodic::PeriodicRange;
use gravisph::plugin::{InitialConditionData, InitialConditionPlugin};
use gravisph::{Particle, Simulation, Vector};

const GAMMA: f64 = 1.4;
const N_LEFT: usize = 400;
const N_RIGHT: usize = 50;

struct SodShockTube;

impl SodShockTube {
    fn particles(&self) -> Vec<Particle<1>> {
        let mut particles = Vec::with_capacity(N_LEFT + N_RIGHT);
        let mut id = 0;

        let left_spacing = 1.0 / N_LEFT as f64;
        let (rho_l, p_l) = (1.0, 1.0);
        for i in 0..N_LEFT {
            let x = -0.5 + (i as f64 + 0.5) * left_spacing;
            let mut p = Particle::new_real(id, Vector::from_array([x]), rho_l * left_spacing);
            p.density = rho_l;
            p.pressure = p_l;
            p.specific_energy = p_l / ((GAMMA - 1.0) * rho_l);
            p.smoothing_length = 2.0 * left_spacing;
            particles.push(p);
            id += 1;
        }

        let right_spacing = 1.0 / N_RIGHT as f64;
        let (rho_r, p_r) = (0.125, 0.1);
        for i in 0..N_RIGHT {
            let x = 0.5 + (i as f64 + 0.5) * right_spacing;
            let mut p = Particle::new_real(id, Vector::from_array([x]), rho_r * right_spacing);
            p.density = rho_r;
            p.pressure = p_r;
            p.specific_energy = p_r / ((GAMMA - 1.0) * rho_r);
            p.smoothing_length = 2.0 * right_spacing;
            particles.push(p);
            id += 1;
        }

        particles
    }

    fn parameters(&self) -> SphParameters {
        SphParametersBuilder::new()
            .with_time(0.0, 0.2, 0.02, 0.02)
            .with_cfl(0.3, 0.25)
            .with_physics(4.0, GAMMA)
            .with_kernel(KernelKind::CubicSpline)
            .as_ssph()
            .expect("common parameters are set before transitioning to SSPH")
            .with_artificial_viscosity(1.0, false, false, 1.0, 1.0, 0.2)
            .build_ssph()
            .expect("viscosity was supplied")
    }

    fn boundary(&self) -> BoundaryConfiguration<1> {
        BoundaryConfiguration {
            lower: [AxisBoundary::none(-0.5)],
            upper: [AxisBoundary::none(1.5)],
            periodic_ranges: [Some(PeriodicRange { min: -0.5, max: 1.5 })],
        }
    }
}

impl InitialConditionPlugin<1> for SodShockTube {
    fn name(&self) -> &str {
        "sod_shock_tube"
    }

    fn create_initial_condition(&self) -> InitialConditionData<1> {
        InitialConditionData {
            particles: self.particles(),
            parameters: self.parameters(),
            boundary_config: self.boundary(),
        }
    }
}

/// Prints a one-line summary per snapshot instead of persisting anything;
/// the CSV/Protobuf writer itself is out of scope (spec.md §1/§6).
struct ConsoleWriter;

impl SnapshotWriter<1> for ConsoleWriter {
    fn write_snapshot(&mut self, time: f64, records: &[ParticleRecord<1>]) {
        let max_density = records.iter().map(|r| r.density).fold(0.0, f64::max);
        println!("t={time:.4}  n={}  max(rho)={max_density:.4}", records.len());
    }

    fn write_energy(&mut self, energy: &EnergyDiagnostics) {
        println!(
            "  energy: t={:.4} kinetic={:.5} thermal={:.5} total={:.5}",
            energy.time,
            energy.kinetic,
            energy.thermal,
            energy.total()
        );
    }
}

fn main() {
    init_logging(log::LevelFilter::Warn);

    let plugin = SodShockTube;
    let ic = plugin.create_initial_condition();
    let mut sim = Simulation::new(ic).expect("initial condition builds a valid simulation");

    let mut writer = ConsoleWriter;
    sim.run(&mut writer).expect("run completes without a fatal configuration/invariant error");
}
