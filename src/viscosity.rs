//! Pluggable artificial-viscosity dissipation, grounded in
//! `original_source`'s `include/algorithms/viscosity/artificial_viscosity.hpp`
//! (the abstract base) and `monaghan_viscosity.hpp` (the one concrete
//! implementation the original ships). Per spec.md's Design Notes this is
//! modeled as a trait object rather than a closed enum, since the set of
//! dissipation schemes is the one place spec.md calls out as "genuinely
//! open" (a Riemann-solver-based GSPH force law plugs in at the same seam,
//! even though it lives in [`crate::force`] rather than behind this trait).

#[derive(Debug, Clone, Copy)]
pub struct ViscosityPairState {
    pub velocity_ij: f64,
    pub sound_i: f64,
    pub sound_j: f64,
    pub density_i: f64,
    pub density_j: f64,
    pub alpha_i: f64,
    pub alpha_j: f64,
    pub balsara_i: f64,
    pub balsara_j: f64,
    /// `r = |r_ij|`.
    pub separation: f64,
}

/// A pluggable pairwise dissipation term `π_ij`, added to the symmetric
/// pressure term in the SSPH/DISPH momentum and energy equations (spec.md
/// §4.8).
pub trait ArtificialViscosity: Send + Sync {
    fn pi_ij(&self, state: &ViscosityPairState) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct MonaghanViscosity {
    pub use_balsara_switch: bool,
}

impl ArtificialViscosity for MonaghanViscosity {
    /// `π_ij = -α_ij v_sig w_ij / (2 ρ_ij)` for approaching pairs
    /// (`v_ij·r_ij < 0`), `0` otherwise; `v_sig = c_i + c_j - 3 w_ij`.
    fn pi_ij(&self, state: &ViscosityPairState) -> f64 {
        if state.velocity_ij >= 0.0 {
            return 0.0;
        }
        let w_ij = state.velocity_ij / state.separation.max(1e-300);
        let alpha = 0.5 * (state.alpha_i + state.alpha_j);
        let balsara = if self.use_balsara_switch {
            0.5 * (state.balsara_i + state.balsara_j)
        } else {
            1.0
        };
        let v_sig = state.sound_i + state.sound_j - 3.0 * w_ij;
        let rho_ij_inv = 2.0 / (state.density_i + state.density_j);
        -0.5 * balsara * alpha * v_sig * w_ij * rho_ij_inv
    }
}

/// Artificial conductivity (spec.md §4.8's optional energy-only term):
/// `α_c m_j v_sig_u (e_i - e_j) n̂·∇W_ij / ρ̄_ij` with `v_sig_u = √(|P_i -
/// P_j| / ρ̄_ij)`.
#[derive(Debug, Clone, Copy)]
pub struct ArtificialConductivity {
    pub enabled: bool,
    pub alpha: f64,
}

impl ArtificialConductivity {
    /// Returns the signal velocity `v_sig_u` for the conductivity term, or
    /// `0.0` when conductivity is disabled.
    pub fn signal_velocity(&self, pressure_i: f64, pressure_j: f64, density_mean: f64) -> f64 {
        if !self.enabled || density_mean <= 0.0 {
            return 0.0;
        }
        ((pressure_i - pressure_j).abs() / density_mean).sqrt()
    }
}
