//! Output contract (spec.md §6): plain data records the driver publishes
//! between steps. The CSV/Protobuf writers and unit-system conversion layer
//! themselves are out of scope (spec.md §1) — this module defines only the
//! schema an external collaborator writes out, plus the trait the driver
//! calls into, grounded in `original_source`'s output-record shape
//! referenced from `include/core/simulation/simulation.hpp`.

use crate::particle::{Particle, ParticleKind};
use crate::vector::Vector;

/// One particle's contribution to a snapshot (spec.md §6's per-snapshot
/// record schema).
#[derive(Debug, Clone, Copy)]
pub struct ParticleRecord<const D: usize> {
    pub id: usize,
    pub kind: ParticleKind,
    pub position: Vector<D>,
    pub velocity: Vector<D>,
    pub acceleration: Vector<D>,
    pub mass: f64,
    pub density: f64,
    pub pressure: f64,
    pub specific_energy: f64,
    pub sound_speed: f64,
    pub smoothing_length: f64,
}

impl<const D: usize> ParticleRecord<D> {
    pub fn from_particle(p: &Particle<D>) -> Self {
        ParticleRecord {
            id: p.id,
            kind: p.kind,
            position: p.position,
            velocity: p.velocity,
            acceleration: p.acceleration,
            mass: p.mass,
            density: p.density,
            pressure: p.pressure,
            specific_energy: p.specific_energy,
            sound_speed: p.sound_speed,
            smoothing_length: p.smoothing_length,
        }
    }
}

/// One energy dump (spec.md §6): `{time, kinetic, thermal, potential, total}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDiagnostics {
    pub time: f64,
    pub kinetic: f64,
    pub thermal: f64,
    pub potential: f64,
}

impl EnergyDiagnostics {
    pub fn total(&self) -> f64 {
        self.kinetic + self.thermal + self.potential
    }

    /// Computes kinetic/thermal/potential energy over the real particles of
    /// `real`. Potential energy uses each particle's own `potential` field
    /// (already halved by the caller if the convention requires it — this
    /// crate reports `0.5 * sum(m_i * phi_i)`, the standard N-body
    /// double-counting correction for a pairwise potential).
    pub fn compute<const D: usize>(real: &[Particle<D>], time: f64) -> Self {
        let mut kinetic = 0.0;
        let mut thermal = 0.0;
        let mut potential = 0.0;
        for p in real.iter().filter(|p| p.is_real()) {
            kinetic += 0.5 * p.mass * p.velocity.norm_squared();
            thermal += p.mass * p.specific_energy;
            potential += 0.5 * p.mass * p.potential;
        }
        EnergyDiagnostics { time, kinetic, thermal, potential }
    }
}

/// Implemented by an external collaborator that persists snapshots/energy
/// dumps (CSV, Protobuf, ...). The driver only calls this trait; it never
/// inspects how records are serialized or where they land.
pub trait SnapshotWriter<const D: usize> {
    fn write_snapshot(&mut self, time: f64, records: &[ParticleRecord<D>]);

    fn write_energy(&mut self, energy: &EnergyDiagnostics);
}

/// A [`SnapshotWriter`] that discards everything, used by tests and by
/// callers that only want the particle/energy state returned in memory.
pub struct NullWriter;

impl<const D: usize> SnapshotWriter<D> for NullWriter {
    fn write_snapshot(&mut self, _time: f64, _records: &[ParticleRecord<D>]) {}
    fn write_energy(&mut self, _energy: &EnergyDiagnostics) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_totals_sum_components() {
        let e = EnergyDiagnostics {
            time: 1.0,
            kinetic: 2.0,
            thermal: 3.0,
            potential: -1.0,
        };
        assert_eq!(e.total(), 4.0);
    }

    #[test]
    fn static_particle_has_zero_kinetic_energy() {
        let p = Particle::<2>::new_real(0, Vector::zero(), 1.0);
        let energy = EnergyDiagnostics::compute(&[p], 0.0);
        assert_eq!(energy.kinetic, 0.0);
    }
}
