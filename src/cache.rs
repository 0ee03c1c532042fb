//! The particle cache, grounded in `original_source`'s
//! `include/core/simulation/particle_cache.hpp`: owns the search array `S =
//! R ⧺ G'` (real particles followed by ghosts) that the tree is built over.
//!
//! [`SearchParticles`] is the `NeighborAccessor`-style wrapper from
//! SPEC_FULL.md B.1: it only ever wraps the search array, and
//! [`crate::tree::NeighborIndex`] values are only produced by tree searches
//! over that same array, so "a neighbor index read from `S` accidentally
//! used to index `R`" cannot type-check.

use crate::error::{SphError, SphResult};
use crate::particle::Particle;
use crate::tree::NeighborIndex;

/// A read-only view over the search array, the only thing a
/// [`NeighborIndex`] may be used to index.
#[derive(Clone, Copy)]
pub struct SearchParticles<'a, const D: usize> {
    particles: &'a [Particle<D>],
}

impl<'a, const D: usize> SearchParticles<'a, D> {
    pub fn get(&self, index: NeighborIndex) -> &'a Particle<D> {
        &self.particles[index.get()]
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &'a [Particle<D>] {
        self.particles
    }
}

/// Owns the search array `S` and the boundary between the real prefix and
/// the ghost suffix.
pub struct ParticleCache<const D: usize> {
    search: Vec<Particle<D>>,
    real_count: usize,
    ghosts_included: bool,
}

impl<const D: usize> ParticleCache<D> {
    pub fn new() -> Self {
        ParticleCache {
            search: Vec::new(),
            real_count: 0,
            ghosts_included: false,
        }
    }

    /// Copies the current real-particle array into the front of `S`,
    /// dropping any previously included ghosts (they refer to stale
    /// positions and must be regenerated after this call).
    pub fn sync_real_particles(&mut self, real: &[Particle<D>]) {
        self.search.clear();
        self.search.extend_from_slice(real);
        self.real_count = real.len();
        self.ghosts_included = false;
    }

    /// Appends freshly generated ghosts after the real prefix.
    pub fn include_ghosts(&mut self, ghosts: &[Particle<D>]) {
        self.search.truncate(self.real_count);
        self.search.extend_from_slice(ghosts);
        self.ghosts_included = true;
    }

    pub fn has_ghosts(&self) -> bool {
        self.ghosts_included
    }

    pub fn size(&self) -> usize {
        self.search.len()
    }

    pub fn real_count(&self) -> usize {
        self.real_count
    }

    pub fn is_initialized(&self) -> bool {
        !self.search.is_empty()
    }

    pub fn get_search_particles(&self) -> SearchParticles<'_, D> {
        SearchParticles {
            particles: &self.search,
        }
    }

    /// Mutable access for the tree build, which threads `next_in_leaf`
    /// through this exact array.
    pub fn get_search_particles_mut(&mut self) -> &mut [Particle<D>] {
        &mut self.search
    }

    /// Checks the `id == index` invariant (spec.md S3) over the real
    /// prefix of `S`.
    pub fn validate(&self) -> SphResult<()> {
        for (index, p) in self.search[..self.real_count].iter().enumerate() {
            if !p.is_real() {
                return Err(SphError::invariant(
                    "S2",
                    format!("entry {index} in the real prefix of S is not a real particle"),
                ));
            }
            if p.id != index {
                return Err(SphError::invariant(
                    "id==index",
                    format!("real particle at slot {index} carries id {}", p.id),
                ));
            }
        }
        Ok(())
    }
}

impl<const D: usize> Default for ParticleCache<D> {
    fn default() -> Self {
        Self::new()
    }
}
