//! Error taxonomy for `gravisph` (spec.md §7).
//!
//! `NumericalWarning` is deliberately not a variant here: per spec.md it never
//! aborts a run, so it is raised via `log::warn!` plus the rate limiter in
//! [`crate::logging`] instead of a `Result::Err` path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SphError {
    #[error("configuration error in `{field}`: {message}")]
    Configuration { field: String, message: String },

    #[error("invariant `{invariant}` violated: {message}")]
    InvariantViolation {
        invariant: &'static str,
        message: String,
    },

    #[error("boundary violation for particle {particle_id}: {message}")]
    BoundaryViolation { particle_id: usize, message: String },
}

impl SphError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        SphError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invariant(invariant: &'static str, message: impl Into<String>) -> Self {
        SphError::InvariantViolation {
            invariant,
            message: message.into(),
        }
    }

    pub fn boundary(particle_id: usize, message: impl Into<String>) -> Self {
        SphError::BoundaryViolation {
            particle_id,
            message: message.into(),
        }
    }
}

pub type SphResult<T> = Result<T, SphError>;
