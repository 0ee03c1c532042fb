//! Boundary configuration, grounded in `original_source`'s
//! `include/core/boundary_types.hpp` and `boundary_config_helper.hpp`.
//!
//! Only the three boundary kinds spec.md §3 names are implemented; the
//! original's fourth `FREE_SURFACE` tag is deliberately not ported (see
//! SPEC_FULL.md B.3).

pub mod ghost;

pub use ghost::GhostManager;

use crate::error::{SphError, SphResult};
use crate::periodic::PeriodicRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    None,
    Periodic,
    Mirror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorType {
    NoSlip,
    FreeSlip,
}

/// Boundary condition for one axis, one side (lower or upper).
#[derive(Debug, Clone, Copy)]
pub struct AxisBoundary {
    pub kind: BoundaryKind,
    pub mirror: MirrorType,
    pub wall_position: f64,
}

impl AxisBoundary {
    pub fn none(wall_position: f64) -> Self {
        AxisBoundary {
            kind: BoundaryKind::None,
            mirror: MirrorType::FreeSlip,
            wall_position,
        }
    }

    pub fn mirror(wall_position: f64, mirror: MirrorType) -> Self {
        AxisBoundary {
            kind: BoundaryKind::Mirror,
            mirror,
            wall_position,
        }
    }

    /// Morris (1997) ghost position for a particle at `x`, reflected across
    /// this wall.
    pub fn reflect(&self, x: f64) -> f64 {
        2.0 * self.wall_position - x
    }
}

/// Full per-axis, per-side boundary configuration for `D` dimensions.
#[derive(Debug, Clone)]
pub struct BoundaryConfiguration<const D: usize> {
    pub lower: [AxisBoundary; D],
    pub upper: [AxisBoundary; D],
    pub periodic_ranges: [Option<PeriodicRange>; D],
}

impl<const D: usize> BoundaryConfiguration<D> {
    pub fn has_periodic(&self) -> bool {
        self.periodic_ranges.iter().any(|r| r.is_some())
    }

    pub fn has_mirror(&self) -> bool {
        self.lower.iter().chain(self.upper.iter()).any(|b| b.kind == BoundaryKind::Mirror)
    }

    /// Checks for contradictory configuration before the ghost manager ever
    /// runs (SPEC_FULL.md B.2): a periodic axis must have `min < max`, and a
    /// periodic axis cannot simultaneously carry a mirror boundary.
    pub fn validate(&self) -> SphResult<()> {
        for d in 0..D {
            if let Some(range) = self.periodic_ranges[d] {
                if range.min >= range.max {
                    return Err(SphError::configuration(
                        format!("periodic_ranges[{d}]"),
                        format!(
                            "periodic range requires min < max, got [{}, {}]",
                            range.min, range.max
                        ),
                    ));
                }
                if self.lower[d].kind == BoundaryKind::Mirror
                    || self.upper[d].kind == BoundaryKind::Mirror
                {
                    return Err(SphError::configuration(
                        format!("boundary[{d}]"),
                        "axis cannot be both periodic and mirror".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
