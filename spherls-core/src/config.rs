//! Read-only inputs the orchestration layer hands to the physics-update
//! engine each step (§6), plus the per-step diagnostics the engine
//! publishes back.
//!
//! These are plain data, not parsed here: following `pineappl::grid`'s habit
//! of deriving `serde` on every boundary-crossing value type (`Order`,
//! `Mu2`, `SubgridParams`), every struct below derives
//! `Serialize`/`Deserialize` so the (out-of-scope) config loader can
//! populate them from whatever file format it parses without this crate
//! knowing about file formats at all.

use serde::{Deserialize, Serialize};

/// Selects which equation of state closes the energy equation (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EosKind {
    /// `P = (γ − 1) ρ E`; temperature and opacity are unused.
    GammaLaw,
    /// Table lookup of `P`, `T`, `κ`, `γ` via Newton iteration on `E(T, ρ)`.
    Tabulated,
}

/// Selects the subgrid turbulence closure (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurbulenceModel {
    /// No subgrid closure; `EddyVisc` stays zero.
    None,
    /// Constant-coefficient closure.
    Constant,
    /// Smagorinsky shear-magnitude closure.
    Smagorinsky,
}

/// What used to be compile-time switches (§6), carried here as runtime
/// configuration per §9's "promote to a runtime ... selector" guidance
/// rather than `#[cfg(...)]` branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Enables the reflective-shock (Sedov) inner-boundary ghost update
    /// path.
    pub sedov: bool,
    /// Raise `SIGINT` in addition to returning an error on negative
    /// density (debugging aid).
    pub sig_neg_den: bool,
    /// Raise `SIGINT` in addition to returning an error on negative
    /// energy.
    pub sig_neg_eng: bool,
    /// Raise `SIGINT` in addition to returning an error on negative
    /// temperature.
    pub sig_neg_temp: bool,
    /// Include the artificial-viscosity terms `Q_d` in the pressure terms
    /// of the energy equation.
    pub viscous_energy_eq: bool,
    /// Compute and retain post-solve absolute residual statistics for the
    /// implicit solve.
    pub track_max_solver_error: bool,
}

/// Physical and numerical constants bound at startup (§6). Values that
/// are *derived* each step (donor fraction, max convective velocity) live in
/// [`Diagnostics`] instead — see §9 on `Parameters.dDonorFrac`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Adiabatic index, gamma-law EOS only.
    pub gamma: f64,
    /// Gravitational constant.
    pub g: f64,
    /// Stefan–Boltzmann constant.
    pub sigma: f64,
    /// π, carried as a parameter so it can be overridden in test fixtures
    /// that check geometric identities against a non-transcendental value.
    pub pi: f64,
    /// Surface mass-shell extension factor used in the outer pressure
    /// gradient denominator.
    pub alpha: f64,
    /// Additional surface extension term.
    pub alpha_extra: f64,
    /// Coefficient `C` in the constant-eddy-viscosity closure.
    pub eddy_viscosity_c: f64,
    /// Compression threshold `τ_AV` for artificial viscosity.
    pub av_threshold: f64,
    /// Turbulent Prandtl number for the LES eddy-conductivity term.
    pub turbulent_prandtl: f64,
    /// Equation of state in use.
    pub eos: EosKind,
    /// Whether radiative diffusion is dropped from the energy equation.
    pub is_adiabatic: bool,
    /// Subgrid turbulence closure in use.
    pub turbulence_model: TurbulenceModel,
    /// Convergence tolerance, shared by the EOS Newton iteration and the
    /// implicit energy solve.
    pub tolerance: f64,
    /// Maximum iteration count, shared by the same two Newton loops.
    pub max_iterations: u32,
    /// Compile-time switches carried as runtime flags.
    pub feature_flags: FeatureFlags,
}

impl Parameters {
    /// Validates the bind-time combination §4.1 rejects immediately:
    /// non-adiabatic evolution requires `T` and `κ`, which the gamma-law
    /// EOS does not supply.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.is_adiabatic && self.eos == EosKind::GammaLaw {
            return Err(crate::error::Error::calculation(
                "non-adiabatic evolution requires a tabulated EOS (gamma-law has no T, kappa)",
                crate::error::Fault::here(file!(), "Parameters::validate", line!()),
                true,
            ));
        }
        Ok(())
    }
}

/// Time-stepping state (§6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Time {
    /// Current simulation time.
    pub t: f64,
    /// Step size centered on the previous half-step, `Δt_{n−½}`.
    pub dt_nm1half: f64,
    /// Step size centered on the next half-step, `Δt_{n+½}`.
    pub dt_np1half: f64,
    /// Full-step size `Δt_n`.
    pub dt_n: f64,
    /// Courant number used to scale the CFL-limited timestep.
    pub courant_factor: f64,
    /// Whether the timestep controller runs at all; `false` selects the
    /// constant-Δt mode of §4.6.
    pub variable_timestep: bool,
    /// The fixed step size used when `variable_timestep` is `false`.
    pub const_timestep_value: f64,
    /// Maximum allowed fractional change per step, denominator of the
    /// fractional-change timestep limiter.
    pub per_change: f64,
    /// Monotonically increasing step counter.
    pub step_index: u64,
}

/// A Jacobian row's off-diagonal derivative slots (§4.7), identified by
/// the original numeric type codes so the mapping stays auditable against
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeType {
    /// Diagonal entry (type code 0).
    Diagonal,
    /// `i+1` neighbour (type code 1).
    IPlus1,
    /// `i−1` neighbour (type code 2).
    IMinus1,
    /// `j+1` neighbour (type code 3).
    JPlus1,
    /// `j−1` neighbour (type code 4).
    JMinus1,
    /// `j+1` and `j−1` folded into a single column (type code 34).
    JPlusMinusFolded,
    /// `k+1` neighbour (type code 5).
    KPlus1,
    /// `k−1` neighbour (type code 6).
    KMinus1,
    /// `k+1` and `k−1` folded into a single column (type code 56).
    KPlusMinusFolded,
}

impl DerivativeType {
    /// The original numeric type code, kept around purely so a reviewer
    /// can check this table against §4.7 without cross-referencing by
    /// hand.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Diagonal => 0,
            Self::IPlus1 => 1,
            Self::IMinus1 => 2,
            Self::JPlus1 => 3,
            Self::JMinus1 => 4,
            Self::JPlusMinusFolded => 34,
            Self::KPlus1 => 5,
            Self::KMinus1 => 6,
            Self::KPlusMinusFolded => 56,
        }
    }
}

/// One row of the implicit plan: the cell whose energy residual this row
/// evaluates, and which neighbours contribute Jacobian columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplicitRow {
    /// Radial index of the residual cell.
    pub i: usize,
    /// Polar index of the residual cell.
    pub j: usize,
    /// Azimuthal index of the residual cell.
    pub k: usize,
    /// Global row index in the distributed linear system.
    pub global_row: usize,
    /// Which neighbour derivatives this row contributes.
    pub derivatives: Vec<DerivativeType>,
    /// Whether this row is the outermost implicit cell, which uses
    /// `F_surface` instead of `F` (§4.7).
    pub is_surface: bool,
}

/// The implicit-solve plan (§6): which radial zones are implicit, and
/// the Newton/Jacobian configuration for them. The distributed sparse
/// matrix/vector handles §6 lists (`matCoeff`, `vecRHS`, ...) are not
/// named here; they are owned by whichever [`crate::implicit::LinearSystem`]
/// implementation is in use (§9: "a portable implementation
/// may retain PETSc or substitute any equivalent ... library").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplicitPlan {
    /// Number of radial zones marked implicit. Zero disables C6 entirely.
    pub num_implicit_zones: usize,
    /// One row per implicit cell.
    pub rows: Vec<ImplicitRow>,
    /// Newton convergence tolerance on the maximum relative `T` correction.
    pub tolerance: f64,
    /// Finite-difference step fraction `ε` for the Jacobian.
    pub derivative_step_fraction: f64,
    /// Maximum Newton iterations before giving up with a warning.
    pub max_iterations: u32,
}

impl ImplicitPlan {
    /// Whether the implicit solve is enabled at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.num_implicit_zones > 0
    }
}

/// Implicit-solve convergence diagnostics (§4.7, §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplicitDiagnostics {
    /// Largest relative `T` correction seen across all Newton iterations.
    pub max_relative_t_correction: f64,
    /// Largest total Newton iteration count seen so far in the run.
    pub max_total_iterations: u32,
    /// Largest absolute solver residual, tracked only when
    /// [`FeatureFlags::track_max_solver_error`] is set.
    pub max_solver_residual: Option<f64>,
    /// Largest Krylov-solver iteration count, tracked only when
    /// [`FeatureFlags::track_max_solver_error`] is set.
    pub max_ksp_iterations: Option<u32>,
}

/// Per-step diagnostics published by the physics-update engine back to the
/// orchestration layer (§6 "Outputs"), including values that used to be
/// stored as mutable fields of `Parameters` (§9: re-expressed here as
/// derived, not configuration).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Donor-fraction weight in `[0.1, 1.0]` for the hybrid
    /// central/upwind stencil.
    pub donor_fraction: f64,
    /// Maximum convective velocity across owned cells this step.
    pub max_convective_velocity: f64,
    /// `max_convective_velocity / c_sound`, published alongside it.
    pub max_convective_velocity_c: f64,
    /// Implicit-solve convergence diagnostics, valid only when C6 ran this
    /// step.
    pub implicit: ImplicitDiagnostics,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            donor_fraction: 0.1,
            max_convective_velocity: 0.0,
            max_convective_velocity_c: 0.0,
            implicit: ImplicitDiagnostics::default(),
        }
    }
}
