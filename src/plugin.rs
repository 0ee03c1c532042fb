//! The external initial-condition plugin contract (spec.md §6), grounded in
//! `original_source`'s `include/core/plugins/simulation_plugin_v3.hpp`.
//!
//! Per SPEC_FULL.md section C this crate implements only the V3 "pure"
//! interface: a plugin returns plain data, and the driver is solely
//! responsible for all system initialization (tree setup, ghost manager
//! setup, the first smoothing-length pass). There is no V1 mutating
//! interface anywhere in this crate.

use crate::boundary::BoundaryConfiguration;
use crate::parameters::SphParameters;
use crate::particle::Particle;

/// Everything a plugin must supply to start a run: particles, a fully-built
/// parameter set, and the boundary configuration.
pub struct InitialConditionData<const D: usize> {
    pub particles: Vec<Particle<D>>,
    pub parameters: SphParameters,
    pub boundary_config: BoundaryConfiguration<D>,
}

impl<const D: usize> InitialConditionData<D> {
    pub fn is_valid(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }
}

/// Implemented by initial-condition builders (demos, external collaborators
/// per spec.md §1/§6). Intentionally has a single pure method: no lifecycle
/// hooks, no mutable access to driver internals.
pub trait InitialConditionPlugin<const D: usize> {
    fn name(&self) -> &str;

    fn create_initial_condition(&self) -> InitialConditionData<D>;
}
