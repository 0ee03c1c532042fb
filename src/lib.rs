//! `gravisph`: a mesh-free, particle-based compressible-hydrodynamics engine.
//!
//! Smoothed Particle Hydrodynamics (SSPH, DISPH, and GSPH variants) coupled
//! to Barnes-Hut tree-code self-gravity, with ghost-particle boundary
//! handling for periodic and mirror domains. The crate is dimension-generic
//! over `D` (1, 2, or 3) via const generics; the `2d`/`3d` features select
//! which dimensionality a downstream crate's default builds target, but any
//! `Simulation<D>` can be instantiated directly regardless of which feature
//! is active.
//!
//! A run starts from an [`InitialConditionPlugin`], which hands the driver a
//! particle array, a fully-built [`SphParameters`], and a boundary
//! configuration; [`Simulation`] owns everything else: the tree, the ghost
//! manager, the search-array cache, and the fixed per-step pipeline
//! (predict, regenerate ghosts, rebuild the tree, solve for smoothing
//! length/density, compute fluid force, compute gravity, correct, advance
//! time).

pub mod boundary;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod force;
pub mod gravity;
pub mod kernel;
pub mod limiter;
pub mod logging;
pub mod output;
pub mod parameters;
pub mod particle;
pub mod periodic;
pub mod plugin;
pub mod preinteraction;
pub mod riemann;
pub mod simulation;
pub mod smoothing;
pub mod timestep;
pub mod tree;
pub mod vector;
pub mod viscosity;

pub use error::{SphError, SphResult};
pub use particle::{Particle, ParticleKind};
pub use plugin::{InitialConditionData, InitialConditionPlugin};
pub use simulation::Simulation;
pub use vector::Vector;
