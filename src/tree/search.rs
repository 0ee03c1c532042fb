//! Fixed-radius neighbor search over the Barnes-Hut tree.
//!
//! Grounded in `original_source`'s `BHTree::neighbor_search` (the `is_ij`
//! symmetric variant) and the teacher's `src/quadtree/radius_search.rs`
//! `TreeIter`/`SearchCriterion` shape, adapted from the teacher's "radius
//! search with an explicit criterion object" style into a direct recursive
//! walk since this tree carries a `max_smoothing_length` per node (the
//! original's `kernel_size` field) rather than needing a separate periodic
//! bounding-box overlap test — ghosts already provide the periodic images.

use super::{BarnesHutTree, NeighborIndex, NodeContent, TreeNode};
use crate::particle::Particle;
use crate::vector::Vector;

impl<const D: usize> BarnesHutTree<D> {
    /// All particles (real or ghost) in `search_particles` within
    /// `max(radius_i, radius_j)` of `query_position`, where `radius_i` is
    /// the caller-supplied search radius and `radius_j` is read from each
    /// candidate's own smoothing length. This realizes the "symmetric"
    /// neighbor definition spec.md §4.3 requires (`is_ij`): a pair is a
    /// neighbor if either particle's kernel reaches the other.
    pub fn neighbors_within(
        &self,
        search_particles: &[Particle<D>],
        query_position: Vector<D>,
        query_radius: f64,
        out: &mut Vec<NeighborIndex>,
    ) {
        out.clear();
        self.visit(self.root(), search_particles, query_position, query_radius, out);
    }

    fn visit(
        &self,
        node: &TreeNode<D>,
        search_particles: &[Particle<D>],
        query_position: Vector<D>,
        query_radius: f64,
        out: &mut Vec<NeighborIndex>,
    ) {
        let prune_radius = query_radius.max(2.0 * node.max_smoothing_length);
        if node.extent.distance_to(&query_position) > prune_radius {
            return;
        }
        match &node.content {
            NodeContent::Leaf { .. } => {
                for &i in &node.leaf_members(search_particles) {
                    let candidate = &search_particles[i];
                    let r = query_position.distance(&candidate.position);
                    let effective_radius = query_radius.max(2.0 * candidate.smoothing_length);
                    if r < effective_radius {
                        out.push(NeighborIndex::new(i));
                    }
                }
            }
            NodeContent::Branch { children } => {
                for child in children {
                    self.visit(child, search_particles, query_position, query_radius, out);
                }
            }
        }
    }

    /// Plain (non-symmetrized) radius search, used by the smoothing-length
    /// solver while `h` is still converging and candidates' own smoothing
    /// lengths are not yet trustworthy enough to symmetrize against.
    pub fn neighbors_within_fixed_radius(
        &self,
        search_particles: &[Particle<D>],
        query_position: Vector<D>,
        query_radius: f64,
        out: &mut Vec<NeighborIndex>,
    ) {
        out.clear();
        self.visit_fixed_radius(self.root(), search_particles, query_position, query_radius, out);
    }

    fn visit_fixed_radius(
        &self,
        node: &TreeNode<D>,
        search_particles: &[Particle<D>],
        query_position: Vector<D>,
        query_radius: f64,
        out: &mut Vec<NeighborIndex>,
    ) {
        if node.extent.distance_to(&query_position) > query_radius {
            return;
        }
        match &node.content {
            NodeContent::Leaf { .. } => {
                for &i in &node.leaf_members(search_particles) {
                    if query_position.distance(&search_particles[i].position) < query_radius {
                        out.push(NeighborIndex::new(i));
                    }
                }
            }
            NodeContent::Branch { children } => {
                for child in children {
                    self.visit_fixed_radius(child, search_particles, query_position, query_radius, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeConfig;

    #[test]
    fn finds_all_particles_within_radius() {
        let mut particles = Vec::new();
        for i in 0..20 {
            let pos = Vector::<2>::from_array([i as f64 * 0.1, 0.0]);
            let mut p = Particle::new_real(i, pos, 1.0);
            p.smoothing_length = 0.05;
            particles.push(p);
        }
        let tree = BarnesHutTree::build(&mut particles, TreeConfig::default());
        let mut neighbors = Vec::new();
        tree.neighbors_within(&particles, Vector::from_array([0.5, 0.0]), 0.25, &mut neighbors);

        let expected: Vec<usize> = (0..20)
            .filter(|&i| (i as f64 * 0.1 - 0.5).abs() < 0.25)
            .collect();
        let mut found: Vec<usize> = neighbors.iter().map(|n| n.get()).collect();
        found.sort_unstable();
        assert_eq!(found, expected);
    }

    #[test]
    fn query_radius_is_symmetrized_with_candidate_smoothing_length() {
        let mut particles = Vec::new();
        let mut far = Particle::<1>::new_real(0, Vector::from_array([1.0]), 1.0);
        far.smoothing_length = 10.0; // huge support: should be found even with a tiny query radius
        particles.push(far);
        let mut near_origin = Particle::<1>::new_real(1, Vector::from_array([0.0]), 1.0);
        near_origin.smoothing_length = 0.01;
        particles.push(near_origin);

        let tree = BarnesHutTree::build(&mut particles, TreeConfig::default());
        let mut neighbors = Vec::new();
        tree.neighbors_within(&particles, Vector::from_array([0.0]), 0.01, &mut neighbors);
        let found: Vec<usize> = neighbors.iter().map(|n| n.get()).collect();
        assert!(found.contains(&0));
    }
}
