//! Ghost particle generation, grounded in `original_source`'s
//! `include/core/boundaries/ghost_particle_manager.hpp`.
//!
//! Per SPEC_FULL.md section C this exposes exactly two refresh paths:
//! [`GhostManager::regenerate`] (moves ghosts, must run once per step after
//! `predict`) and [`GhostManager::refresh_properties`] (copies thermodynamic
//! fields only, valid strictly between pre-interaction and the fluid-force
//! stage of the *same* step). The original's deprecated `update_ghosts` path,
//! which updates properties without moving positions and is unsafe to call
//! across steps, is not ported at all.

use crate::boundary::{AxisBoundary, BoundaryConfiguration, BoundaryKind, MirrorType};
use crate::particle::Particle;
use crate::vector::Vector;

#[derive(Debug, Clone, Copy)]
enum AxisImage {
    Periodic(f64),
    Mirror(f64, MirrorType),
}

pub struct GhostManager<const D: usize> {
    config: BoundaryConfiguration<D>,
    support_radius: f64,
    ghosts: Vec<Particle<D>>,
    /// Index, into `ghosts`, of the real particle (by its position in `R`
    /// at the time of the last `regenerate`) each ghost mirrors. Used by
    /// `refresh_properties` to find the right source particle without
    /// regenerating positions.
    source_real_index: Vec<usize>,
    regenerated_this_step: bool,
}

impl<const D: usize> GhostManager<D> {
    pub fn new(config: BoundaryConfiguration<D>) -> Self {
        GhostManager {
            config,
            support_radius: 0.0,
            ghosts: Vec::new(),
            source_real_index: Vec::new(),
            regenerated_this_step: false,
        }
    }

    pub fn set_kernel_support_radius(&mut self, radius: f64) {
        self.support_radius = radius;
    }

    pub fn ghosts(&self) -> &[Particle<D>] {
        &self.ghosts
    }

    pub fn has_ghosts(&self) -> bool {
        !self.ghosts.is_empty()
    }

    /// Marks the step boundary; called by the integrator/coordinator before
    /// `predict` so `refresh_properties`'s debug guard tracks the *current*
    /// step rather than carrying a stale flag from the previous one.
    pub fn begin_step(&mut self) {
        self.regenerated_this_step = false;
    }

    /// Rebuilds every ghost from scratch: positions, velocities (reflected
    /// per the applicable `MirrorType`) and a copy of current thermodynamic
    /// state. Must run after the integrator's `predict` has moved the real
    /// particles for this step.
    pub fn regenerate(&mut self, real: &[Particle<D>]) {
        self.ghosts.clear();
        self.source_real_index.clear();

        for (real_index, p) in real.iter().enumerate() {
            debug_assert!(p.is_real(), "GhostManager::regenerate given a non-real particle");
            for (offset, velocity) in self.generate_images(p) {
                let mirrored_position = p.position + offset;
                self.ghosts.push(p.make_ghost(mirrored_position, velocity));
                self.source_real_index.push(real_index);
            }
        }
        self.regenerated_this_step = true;
    }

    /// Copies only thermodynamic fields (density, pressure, sound speed,
    /// energy, smoothing length, grad-h, balsara, alpha) from `real` onto
    /// the existing ghosts, leaving position/velocity untouched. Valid only
    /// after `regenerate` has run this step.
    pub fn refresh_properties(&mut self, real: &[Particle<D>]) {
        debug_assert!(
            self.regenerated_this_step,
            "refresh_properties called before regenerate this step"
        );
        for (ghost, &source) in self.ghosts.iter_mut().zip(self.source_real_index.iter()) {
            let r = &real[source];
            ghost.mass = r.mass;
            ghost.density = r.density;
            ghost.pressure = r.pressure;
            ghost.specific_energy = r.specific_energy;
            ghost.specific_energy_predicted = r.specific_energy_predicted;
            ghost.sound_speed = r.sound_speed;
            ghost.smoothing_length = r.smoothing_length;
            ghost.grad_h = r.grad_h;
            ghost.balsara = r.balsara;
            ghost.alpha_av = r.alpha_av;
        }
    }

    fn axis_candidates(&self, axis: usize, x: f64) -> Vec<AxisImage> {
        let mut out = Vec::new();
        if let Some(range) = self.config.periodic_ranges[axis] {
            if x - range.min < self.support_radius {
                out.push(AxisImage::Periodic(range.length()));
            }
            if range.max - x < self.support_radius {
                out.push(AxisImage::Periodic(-range.length()));
            }
        }
        let lower: AxisBoundary = self.config.lower[axis];
        if lower.kind == BoundaryKind::Mirror && x - lower.wall_position < self.support_radius {
            out.push(AxisImage::Mirror(lower.reflect(x) - x, lower.mirror));
        }
        let upper: AxisBoundary = self.config.upper[axis];
        if upper.kind == BoundaryKind::Mirror && upper.wall_position - x < self.support_radius {
            out.push(AxisImage::Mirror(upper.reflect(x) - x, upper.mirror));
        }
        out
    }

    /// Returns `(position_offset, reflected_velocity)` for every ghost image
    /// of particle `p`, including combined corner/edge images when `p` is
    /// within the support radius of more than one axis's boundary
    /// simultaneously.
    fn generate_images(&self, p: &Particle<D>) -> Vec<(Vector<D>, Vector<D>)> {
        let mut per_axis: Vec<Vec<Option<AxisImage>>> = Vec::with_capacity(D);
        for d in 0..D {
            let mut candidates: Vec<Option<AxisImage>> = vec![None];
            candidates.extend(self.axis_candidates(d, p.position[d]).into_iter().map(Some));
            per_axis.push(candidates);
        }

        let mut combos: Vec<Vec<Option<AxisImage>>> = vec![Vec::new()];
        for candidates in &per_axis {
            let mut next = Vec::with_capacity(combos.len() * candidates.len());
            for combo in &combos {
                for candidate in candidates {
                    let mut extended = combo.clone();
                    extended.push(*candidate);
                    next.push(extended);
                }
            }
            combos = next;
        }

        let mut images = Vec::new();
        for combo in combos {
            if combo.iter().all(Option::is_none) {
                continue; // the real particle itself, not a ghost
            }
            let mut offset = Vector::zero();
            let mut velocity = p.velocity;
            let mut full_negate = false;
            for (d, candidate) in combo.iter().enumerate() {
                match candidate {
                    None => {}
                    Some(AxisImage::Periodic(shift)) => offset[d] = *shift,
                    Some(AxisImage::Mirror(shift, MirrorType::NoSlip)) => {
                        offset[d] = *shift;
                        full_negate = true;
                    }
                    Some(AxisImage::Mirror(shift, MirrorType::FreeSlip)) => {
                        offset[d] = *shift;
                        velocity[d] = -velocity[d];
                    }
                }
            }
            if full_negate {
                velocity = -velocity;
            }
            images.push((offset, velocity));
        }
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periodic::PeriodicRange;
    use approx::assert_relative_eq;

    fn mirror_box_1d(wall: f64, mirror: MirrorType) -> BoundaryConfiguration<1> {
        BoundaryConfiguration {
            lower: [AxisBoundary::mirror(0.0, mirror)],
            upper: [AxisBoundary::mirror(wall, mirror)],
            periodic_ranges: [None],
        }
    }

    #[test]
    fn mirror_reflects_position_and_no_slip_negates_velocity() {
        let mut manager = GhostManager::new(mirror_box_1d(1.0, MirrorType::NoSlip));
        manager.set_kernel_support_radius(0.5);
        let mut p = Particle::<1>::new_real(0, Vector::from_array([0.1]), 1.0);
        p.velocity = Vector::from_array([2.0]);
        manager.regenerate(&[p]);
        assert_eq!(manager.ghosts().len(), 1);
        let ghost = &manager.ghosts()[0];
        assert_relative_eq!(ghost.position[0], -0.1, epsilon = 1e-12);
        assert_relative_eq!(ghost.velocity[0], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn free_slip_keeps_tangential_flips_normal() {
        let config = BoundaryConfiguration::<2> {
            lower: [AxisBoundary::mirror(0.0, MirrorType::FreeSlip), AxisBoundary::none(0.0)],
            upper: [AxisBoundary::none(1.0), AxisBoundary::none(1.0)],
            periodic_ranges: [None, None],
        };
        let mut manager = GhostManager::new(config);
        manager.set_kernel_support_radius(0.5);
        let mut p = Particle::<2>::new_real(0, Vector::from_array([0.1, 0.5]), 1.0);
        p.velocity = Vector::from_array([2.0, 3.0]);
        manager.regenerate(&[p]);
        let ghost = &manager.ghosts()[0];
        assert_relative_eq!(ghost.velocity[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(ghost.velocity[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn periodic_wraps_without_touching_velocity() {
        let config = BoundaryConfiguration::<1> {
            lower: [AxisBoundary::none(0.0)],
            upper: [AxisBoundary::none(1.0)],
            periodic_ranges: [Some(PeriodicRange { min: 0.0, max: 1.0 })],
        };
        let mut manager = GhostManager::new(config);
        manager.set_kernel_support_radius(0.3);
        let mut p = Particle::<1>::new_real(0, Vector::from_array([0.05]), 1.0);
        p.velocity = Vector::from_array([1.5]);
        manager.regenerate(&[p]);
        let ghost = &manager.ghosts()[0];
        assert_relative_eq!(ghost.position[0], 1.05, epsilon = 1e-12);
        assert_relative_eq!(ghost.velocity[0], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn corner_particle_generates_combined_image() {
        let config = BoundaryConfiguration::<2> {
            lower: [AxisBoundary::none(0.0), AxisBoundary::none(0.0)],
            upper: [AxisBoundary::none(1.0), AxisBoundary::none(1.0)],
            periodic_ranges: [
                Some(PeriodicRange { min: 0.0, max: 1.0 }),
                Some(PeriodicRange { min: 0.0, max: 1.0 }),
            ],
        };
        let mut manager = GhostManager::new(config);
        manager.set_kernel_support_radius(0.2);
        let p = Particle::<2>::new_real(0, Vector::from_array([0.05, 0.05]), 1.0);
        manager.regenerate(&[p]);
        // one image per axis plus the diagonal corner image => 3 ghosts
        assert_eq!(manager.ghosts().len(), 3);
    }

    #[test]
    #[should_panic]
    fn refresh_before_regenerate_panics_in_debug() {
        let mut manager = GhostManager::new(mirror_box_1d(1.0, MirrorType::NoSlip));
        let p = Particle::<1>::new_real(0, Vector::from_array([0.1]), 1.0);
        manager.refresh_properties(&[p]);
    }
}
