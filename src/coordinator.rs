//! The tree/cache rebuild protocol, grounded in `original_source`'s
//! `include/core/spatial_tree_coordinator.hpp`: a fixed four-step atomic
//! rebuild run once per step so the tree, the search array and the
//! `next_in_leaf` linked lists never observe each other in a half-updated
//! state (spec.md S1/S4).

use crate::boundary::{BoundaryConfiguration, GhostManager};
use crate::cache::ParticleCache;
use crate::error::SphResult;
use crate::particle::Particle;
use crate::tree::{BarnesHutTree, TreeConfig};

/// Extra capacity reserved in the search array beyond the current real +
/// ghost count, so a step's ghost-count growth (e.g. a particle drifting
/// onto a second boundary) does not force a reallocation mid-step. Mirrors
/// the original's `REALLOCATION_BUFFER` constant.
const REALLOCATION_BUFFER: usize = 100;

pub struct TreeCoordinator<const D: usize> {
    cache: ParticleCache<D>,
    tree: Option<BarnesHutTree<D>>,
    ghost_manager: GhostManager<D>,
    tree_config: TreeConfig,
}

impl<const D: usize> TreeCoordinator<D> {
    pub fn new(tree_config: TreeConfig, boundary_config: BoundaryConfiguration<D>) -> Self {
        TreeCoordinator {
            cache: ParticleCache::new(),
            tree: None,
            ghost_manager: GhostManager::new(boundary_config),
            tree_config,
        }
    }

    pub fn ghost_manager(&self) -> &GhostManager<D> {
        &self.ghost_manager
    }

    pub fn ghost_manager_mut(&mut self) -> &mut GhostManager<D> {
        &mut self.ghost_manager
    }

    pub fn cache(&self) -> &ParticleCache<D> {
        &self.cache
    }

    pub fn tree(&self) -> &BarnesHutTree<D> {
        self.tree.as_ref().expect("TreeCoordinator::rebuild has not been called yet")
    }

    /// Step 1-4 of the atomic rebuild: synchronize the search container with
    /// `real`, regenerate ghosts, clear every `next_in_leaf` pointer, rebuild
    /// the tree, and validate the `id == index` invariant over the real
    /// prefix. Must be called once per step, after the integrator's
    /// `predict` has moved `real`.
    pub fn rebuild(&mut self, real: &[Particle<D>]) -> SphResult<()> {
        // Step 1: synchronize_search_container.
        self.cache.sync_real_particles(real);

        self.ghost_manager.begin_step();
        self.ghost_manager.regenerate(real);
        self.cache.include_ghosts(self.ghost_manager.ghosts());

        // Step 2: clear_linked_list_pointers.
        for p in self.cache.get_search_particles_mut() {
            p.next_in_leaf = None;
        }

        // Step 3: rebuild_spatial_tree.
        let tree = BarnesHutTree::build(self.cache.get_search_particles_mut(), self.tree_config);
        self.tree = Some(tree);

        // Step 4: validate_particle_ids.
        self.cache.validate()
    }

    /// Refreshes ghost and search-array thermodynamic fields (density,
    /// pressure, ...) without moving anything or rebuilding the tree. Valid
    /// between pre-interaction and the fluid-force stage, strictly after
    /// `rebuild` has already run this step.
    pub fn refresh_properties(&mut self, real: &[Particle<D>]) {
        self.cache.sync_real_particles(real);
        self.ghost_manager.refresh_properties(real);
        self.cache.include_ghosts(self.ghost_manager.ghosts());
    }

    pub fn reserve_capacity_hint(&self) -> usize {
        self.cache.size() + REALLOCATION_BUFFER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::AxisBoundary;
    use crate::vector::Vector;

    fn no_boundary() -> BoundaryConfiguration<2> {
        BoundaryConfiguration {
            lower: [AxisBoundary::none(0.0), AxisBoundary::none(0.0)],
            upper: [AxisBoundary::none(1.0), AxisBoundary::none(1.0)],
            periodic_ranges: [None, None],
        }
    }

    #[test]
    fn rebuild_produces_a_valid_tree_and_cache() {
        let real: Vec<Particle<2>> = (0..10)
            .map(|i| {
                let mut p = Particle::new_real(i, Vector::from_array([i as f64 * 0.1, 0.0]), 1.0);
                p.smoothing_length = 0.2;
                p
            })
            .collect();
        let mut coordinator = TreeCoordinator::new(TreeConfig::default(), no_boundary());
        coordinator.ghost_manager_mut().set_kernel_support_radius(0.4);
        coordinator.rebuild(&real).expect("rebuild should succeed on well-formed input");
        assert_eq!(coordinator.cache().real_count(), 10);
        assert!(coordinator.tree().root().mass > 0.0);
    }
}
