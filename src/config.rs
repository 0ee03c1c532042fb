//! YAML configuration loading (SPEC_FULL.md A.3), grounded in the teacher's
//! `ParameterPlugin` / `src/*/parameters.rs` pattern of a `serde`-derived,
//! `#[serde(deny_unknown_fields)]` config struct fed by `serde_yaml`.
//!
//! The builder types in [`crate::parameters`] deliberately do not derive
//! `Deserialize` themselves: their whole purpose is the typestate-enforced
//! "SSPH/DISPH require artificial viscosity, GSPH forbids it" invariant
//! (spec.md §9), which only means anything at compile time. A YAML file is
//! read at runtime, so this module defines a separate, plain-data
//! [`RawSphConfig`] schema and converts it through the same builder chain
//! every other call site uses, rather than relaxing the builder's
//! compile-time guarantee to accommodate deserialization.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SphError, SphResult};
use crate::parameters::{GravityConfig, KernelKind, SphParameters, SphParametersBuilder};
use crate::smoothing::MinSmoothingPolicy;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTime {
    start: f64,
    end: f64,
    output_interval: f64,
    energy_output_interval: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCfl {
    sound: f64,
    force: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPhysics {
    neighbor_number: f64,
    gamma: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTree {
    #[serde(default = "default_max_level")]
    max_level: usize,
    #[serde(default = "default_leaf_particle_num")]
    leaf_particle_num: usize,
}

fn default_max_level() -> usize {
    20
}

fn default_leaf_particle_num() -> usize {
    1
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKernel {
    CubicSpline,
    Wendland,
}

impl From<RawKernel> for KernelKind {
    fn from(raw: RawKernel) -> Self {
        match raw {
            RawKernel::CubicSpline => KernelKind::CubicSpline,
            RawKernel::Wendland => KernelKind::Wendland,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtificialViscosity {
    alpha: f64,
    #[serde(default)]
    use_balsara_switch: bool,
    #[serde(default)]
    time_dependent: bool,
    #[serde(default = "default_alpha_max")]
    alpha_max: f64,
    #[serde(default = "default_alpha_min")]
    alpha_min: f64,
    #[serde(default = "default_epsilon")]
    epsilon: f64,
}

fn default_alpha_max() -> f64 {
    1.0
}
fn default_alpha_min() -> f64 {
    0.1
}
fn default_epsilon() -> f64 {
    0.2
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtificialConductivity {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    alpha: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawGravity {
    NoGravity,
    NewtonianGravity { g: f64, theta: f64 },
}

impl From<RawGravity> for GravityConfig {
    fn from(raw: RawGravity) -> Self {
        match raw {
            RawGravity::NoGravity => GravityConfig::NoGravity,
            RawGravity::NewtonianGravity { g, theta } => GravityConfig::NewtonianGravity { g, theta },
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawSmoothingPolicy {
    NoMin,
    ConstantMin { value: f64 },
    PhysicsBased { alpha: f64, expected_max_density: f64 },
}

impl From<RawSmoothingPolicy> for MinSmoothingPolicy {
    fn from(raw: RawSmoothingPolicy) -> Self {
        match raw {
            RawSmoothingPolicy::NoMin => MinSmoothingPolicy::NoMin,
            RawSmoothingPolicy::ConstantMin { value } => MinSmoothingPolicy::ConstantMin(value),
            RawSmoothingPolicy::PhysicsBased { alpha, expected_max_density } => {
                MinSmoothingPolicy::PhysicsBased { alpha, expected_max_density }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
enum RawVariant {
    Ssph { viscosity: RawArtificialViscosity },
    Disph { viscosity: RawArtificialViscosity },
    Gsph {
        #[serde(default)]
        second_order: bool,
    },
}

/// The on-disk schema for a complete [`SphParameters`] (spec.md §6's
/// Parameters table, as YAML). See the module docs for why this is a
/// separate type from the builder chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSphConfig {
    time: RawTime,
    cfl: RawCfl,
    physics: RawPhysics,
    kernel: RawKernel,
    variant: RawVariant,
    #[serde(default)]
    tree: Option<RawTree>,
    #[serde(default)]
    gravity: Option<RawGravity>,
    #[serde(default)]
    artificial_conductivity: Option<RawArtificialConductivity>,
    #[serde(default)]
    smoothing_length_policy: Option<RawSmoothingPolicy>,
    #[serde(default)]
    iterative_smoothing_length: bool,
}

impl RawSphConfig {
    /// Converts the deserialized schema into a fully built [`SphParameters`],
    /// routing through [`SphParametersBuilder`] so the SSPH/DISPH-requires-
    /// viscosity / GSPH-forbids-it invariant is enforced the same way a
    /// hand-written call site would enforce it.
    pub fn into_parameters(self) -> SphResult<SphParameters> {
        let mut builder = SphParametersBuilder::new()
            .with_time(
                self.time.start,
                self.time.end,
                self.time.output_interval,
                self.time.energy_output_interval,
            )
            .with_cfl(self.cfl.sound, self.cfl.force)
            .with_physics(self.physics.neighbor_number, self.physics.gamma)
            .with_kernel(self.kernel.into())
            .with_iterative_smoothing_length(self.iterative_smoothing_length);

        if let Some(tree) = self.tree {
            builder = builder.with_tree_params(tree.max_level, tree.leaf_particle_num);
        }
        if let Some(GravityConfig::NewtonianGravity { g, theta }) = self.gravity.map(GravityConfig::from) {
            builder = builder.with_gravity(g, theta);
        }
        if let Some(conductivity) = self.artificial_conductivity {
            if conductivity.enabled {
                builder = builder.with_artificial_conductivity(conductivity.alpha);
            }
        }

        let mut params = match self.variant {
            RawVariant::Ssph { viscosity } => builder
                .as_ssph()?
                .with_artificial_viscosity(
                    viscosity.alpha,
                    viscosity.use_balsara_switch,
                    viscosity.time_dependent,
                    viscosity.alpha_max,
                    viscosity.alpha_min,
                    viscosity.epsilon,
                )
                .build_ssph()?,
            RawVariant::Disph { viscosity } => builder
                .as_disph()?
                .with_artificial_viscosity(
                    viscosity.alpha,
                    viscosity.use_balsara_switch,
                    viscosity.time_dependent,
                    viscosity.alpha_max,
                    viscosity.alpha_min,
                    viscosity.epsilon,
                )
                .build_disph()?,
            RawVariant::Gsph { second_order } => builder.as_gsph()?.with_second_order(second_order).build()?,
        };

        if let Some(policy) = self.smoothing_length_policy {
            params.smoothing_length_policy = policy.into();
        }

        Ok(params)
    }
}

/// Parses a YAML document directly into a validated [`SphParameters`].
pub fn from_yaml_str(yaml: &str) -> SphResult<SphParameters> {
    let raw: RawSphConfig = serde_yaml::from_str(yaml)
        .map_err(|e| SphError::configuration("yaml", format!("failed to parse SPH configuration: {e}")))?;
    raw.into_parameters()
}

/// Reads and parses a YAML configuration file into a validated
/// [`SphParameters`].
pub fn from_yaml_file(path: impl AsRef<Path>) -> SphResult<SphParameters> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        SphError::configuration("yaml_path", format!("failed to read {}: {e}", path.display()))
    })?;
    from_yaml_str(&contents)
}
