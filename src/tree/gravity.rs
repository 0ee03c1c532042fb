//! Tree-code self-gravity, grounded in `original_source`'s
//! `BHTree::calc_force` (opening-angle walk with Plummer softening) and the
//! teacher's `src/gravity/mod.rs` (`Solver::calc_gravity_acceleration`,
//! `traverse_tree`).
//!
//! Per SPEC_FULL.md section C, this walk must respect the periodic minimum
//! image when periodicity is enabled — unlike the fluid-force stage, it does
//! not rely on ghost particles, since ghosts only cover the near-boundary
//! band and not the full set of periodic images a long-range force needs.

use super::{BarnesHutTree, NodeContent, TreeNode};
use crate::particle::Particle;
use crate::periodic::Periodic;
use crate::vector::Vector;

pub struct GravityResult<const D: usize> {
    pub acceleration: Vector<D>,
    pub potential: f64,
}

impl<const D: usize> BarnesHutTree<D> {
    /// Newtonian acceleration and potential at `query_position` due to every
    /// real particle in the tree, computed via the Barnes-Hut opening-angle
    /// criterion `node.width / distance < theta`.
    ///
    /// `softening` is the query particle's own smoothing length `h_i`
    /// (spec.md §4.3: "Plummer softening ε = h_i"), not a tree-wide constant
    /// — every particle walks the same tree with its own softening.
    pub fn calc_gravity(
        &self,
        query_position: Vector<D>,
        exclude_id: Option<usize>,
        particles: &[Particle<D>],
        g_constant: f64,
        softening: f64,
        periodic: &Periodic<D>,
    ) -> GravityResult<D> {
        let mut result = GravityResult {
            acceleration: Vector::zero(),
            potential: 0.0,
        };
        self.walk(
            self.root(),
            query_position,
            exclude_id,
            particles,
            g_constant,
            softening,
            periodic,
            &mut result,
        );
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        node: &TreeNode<D>,
        query_position: Vector<D>,
        exclude_id: Option<usize>,
        particles: &[Particle<D>],
        g_constant: f64,
        softening: f64,
        periodic: &Periodic<D>,
        result: &mut GravityResult<D>,
    ) {
        if node.mass <= 0.0 {
            return;
        }
        let r_vec = periodic.calc_r_ij(query_position, node.center_of_mass);
        let r2 = r_vec.norm_squared();
        let width = node.extent.width();

        let is_far_enough = width * width < self.config.opening_angle * self.config.opening_angle * r2;

        match &node.content {
            NodeContent::Leaf { .. } if !is_far_enough => {
                for &i in &node.leaf_members(particles) {
                    let p = &particles[i];
                    if !p.is_real() || Some(p.id) == exclude_id {
                        continue;
                    }
                    self.accumulate_point(query_position, p.position, p.mass, g_constant, softening, periodic, result);
                }
            }
            NodeContent::Branch { children } if !is_far_enough => {
                for child in children {
                    self.walk(child, query_position, exclude_id, particles, g_constant, softening, periodic, result);
                }
            }
            _ => {
                self.accumulate_point(
                    query_position,
                    node.center_of_mass,
                    node.mass,
                    g_constant,
                    softening,
                    periodic,
                    result,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn accumulate_point(
        &self,
        query_position: Vector<D>,
        source_position: Vector<D>,
        source_mass: f64,
        g_constant: f64,
        softening: f64,
        periodic: &Periodic<D>,
        result: &mut GravityResult<D>,
    ) {
        let r_vec = periodic.calc_r_ij(query_position, source_position);
        let r2 = r_vec.norm_squared();
        let eps2 = softening * softening;
        let softened_r2 = r2 + eps2;
        let r = softened_r2.sqrt();
        if r < 1e-300 {
            return;
        }
        result.acceleration -= r_vec * (g_constant * source_mass / (softened_r2 * r));
        result.potential -= g_constant * source_mass / r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeConfig;
    use approx::assert_relative_eq;

    #[test]
    fn matches_direct_sum_for_small_theta() {
        let mut particles = vec![
            Particle::<3>::new_real(0, Vector::from_array([0.0, 0.0, 0.0]), 1.0),
            Particle::<3>::new_real(1, Vector::from_array([1.0, 0.0, 0.0]), 2.0),
            Particle::<3>::new_real(2, Vector::from_array([0.0, 2.0, 0.0]), 0.5),
        ];
        let config = TreeConfig {
            opening_angle: 0.0, // forces exact, leaf-level direct summation
            ..TreeConfig::default()
        };
        let tree = BarnesHutTree::build(&mut particles, config);
        let periodic = Periodic::none();

        let query = Vector::from_array([0.0, 0.0, 0.0]);
        let result = tree.calc_gravity(query, Some(0), &particles, 1.0, 1e-6, &periodic);

        let mut expected = Vector::<3>::zero();
        for p in particles.iter().filter(|p| p.id != 0) {
            let r_vec = query - p.position;
            let r2 = r_vec.norm_squared() + 1e-12;
            let r = r2.sqrt();
            expected -= r_vec * (p.mass / (r2 * r));
        }
        assert_relative_eq!(result.acceleration[0], expected[0], epsilon = 1e-6);
        assert_relative_eq!(result.acceleration[1], expected[1], epsilon = 1e-6);
    }

    #[test]
    fn acceleration_at_source_with_softening_is_finite() {
        let mut particles = vec![Particle::<2>::new_real(0, Vector::from_array([0.0, 0.0]), 1.0)];
        let tree = BarnesHutTree::build(&mut particles, TreeConfig::default());
        let periodic = Periodic::none();
        let result = tree.calc_gravity(Vector::from_array([0.0, 0.0]), None, &particles, 1.0, 1e-3, &periodic);
        assert!(result.acceleration[0].is_finite());
        assert!(result.potential.is_finite());
    }
}
