//! Dispatch layer (component C1, §4.1, §2): binds one operator per
//! update role to the bind-time configuration, then drives a single
//! timestep through the fixed invocation order.
//!
//! Of the roles §4.1 names, `model_write` and `write_watch_zones` are
//! file-I/O collaborators explicitly out of scope (§1) and have no
//! counterpart here; every other role is either a plain function already
//! exported by [`crate::hydro`]/[`crate::energy`]/[`crate::turbulence`] or,
//! where the original's pointer-to-function table calls for a
//! per-combination operator (§9: "Pointer-to-function dispatch → tagged
//! variant + sum types"), one of the `enum_dispatch` enums below.

use enum_dispatch::enum_dispatch;

use crate::config::{Diagnostics, EosKind, ImplicitPlan, Parameters, Time, TurbulenceModel};
use crate::energy::{calc_new_e, calc_new_eos_vars_gamma_law, calc_new_eos_vars_tabulated, EosTable};
use crate::error::Result;
use crate::grid::exchange::Exchange;
use crate::grid::geometry::GeometricFactors;
use crate::grid::topology::{Dimensionality, ProcTop};
use crate::grid_motion::{calc_new_r, calc_new_u0_1d, calc_new_u0_multi_d};
use crate::hydro::{apply_sedov_inner_boundary, calc_new_d, calc_new_den_ave, calc_new_q0, calc_new_q1, calc_new_q2, calc_new_u, calc_new_v, calc_new_w};
use crate::implicit::implicit_solve;
use crate::state::GridState;
use crate::timestep::{calc_deltat_constant, calc_deltat_variable};
use crate::turbulence::{calc_new_eddy_viscosity_constant, calc_new_eddy_viscosity_smagorinsky};

/// `calc_new_eddy_viscosity`, bound at startup to one of three concrete
/// operators per [`TurbulenceModel`] (§4.5).
#[enum_dispatch]
pub trait TurbulenceOperator {
    /// Updates `EddyVisc.new` in place. A no-op for [`NoTurbulence`].
    fn update(&self, state: &mut GridState, params: &Parameters, diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality);
}

/// No subgrid closure; `EddyVisc` stays at its initialized value (zero).
#[derive(Debug, Clone, Copy)]
pub struct NoTurbulence;

impl TurbulenceOperator for NoTurbulence {
    fn update(&self, _state: &mut GridState, _params: &Parameters, _diag: &Diagnostics, _geom: &GeometricFactors, _dim: Dimensionality) {}
}

/// Constant-coefficient closure (§4.5).
#[derive(Debug, Clone, Copy)]
pub struct ConstantTurbulence;

impl TurbulenceOperator for ConstantTurbulence {
    fn update(&self, state: &mut GridState, params: &Parameters, diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality) {
        calc_new_eddy_viscosity_constant(state, params, diag, geom, dim);
    }
}

/// Smagorinsky shear-magnitude closure (§4.5).
#[derive(Debug, Clone, Copy)]
pub struct SmagorinskyTurbulence;

impl TurbulenceOperator for SmagorinskyTurbulence {
    fn update(&self, state: &mut GridState, params: &Parameters, _diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality) {
        calc_new_eddy_viscosity_smagorinsky(state, params, geom, dim);
    }
}

/// The bound turbulence operator, selected once at startup from
/// [`TurbulenceModel`] (§4.1's "bind one operator per update role").
#[enum_dispatch(TurbulenceOperator)]
#[derive(Debug, Clone, Copy)]
pub enum TurbulenceOperatorEnum {
    /// Bound when [`TurbulenceModel::None`].
    NoTurbulence,
    /// Bound when [`TurbulenceModel::Constant`].
    ConstantTurbulence,
    /// Bound when [`TurbulenceModel::Smagorinsky`].
    SmagorinskyTurbulence,
}

/// `calc_new_grid_velocity`, bound at startup to the 1D area-ratio
/// recurrence or the multi-dimensional flux-balance variant (§4.2).
#[enum_dispatch]
pub trait GridMotionOperator {
    /// Updates `U0.new` in place (and enforces the free-surface invariant
    /// at the outermost rank).
    fn update_u0(&self, state: &mut GridState, geom: &GeometricFactors, proc_top: &ProcTop, exchange: &dyn Exchange) -> Result<()>;
}

/// Bound on rank 0 (always 1D, §3.3) and on any single-dimensional run.
#[derive(Debug, Clone, Copy)]
pub struct OneDGridMotion;

impl GridMotionOperator for OneDGridMotion {
    fn update_u0(&self, state: &mut GridState, geom: &GeometricFactors, proc_top: &ProcTop, exchange: &dyn Exchange) -> Result<()> {
        calc_new_u0_1d(state, geom, proc_top, exchange)
    }
}

/// Bound on ranks evolving 2D or 3D.
#[derive(Debug, Clone, Copy)]
pub struct MultiDGridMotion {
    /// This rank's effective dimensionality.
    pub dim: Dimensionality,
}

impl GridMotionOperator for MultiDGridMotion {
    fn update_u0(&self, state: &mut GridState, geom: &GeometricFactors, proc_top: &ProcTop, exchange: &dyn Exchange) -> Result<()> {
        calc_new_u0_multi_d(state, geom, proc_top, exchange, self.dim)
    }
}

/// The bound grid-motion operator, selected once at startup from the rank's
/// effective dimensionality.
#[enum_dispatch(GridMotionOperator)]
#[derive(Debug, Clone, Copy)]
pub enum GridMotionOperatorEnum {
    /// Bound for [`Dimensionality::OneD`].
    OneDGridMotion,
    /// Bound for [`Dimensionality::TwoD`] or [`Dimensionality::ThreeD`].
    MultiDGridMotion,
}

/// The full per-rank operator table (§4.1's C1): every role this crate
/// needs more than a plain `match` for, bound once at startup.
#[derive(Debug, Clone, Copy)]
pub struct OperatorTable {
    /// Bound turbulence closure (§4.5).
    pub turbulence: TurbulenceOperatorEnum,
    /// Bound grid-motion update (§4.2).
    pub grid_motion: GridMotionOperatorEnum,
}

impl OperatorTable {
    /// Binds one operator per role from `params` and the rank's effective
    /// `dim`, after validating the combination (§4.1: "reject
    /// immediately" on non-adiabatic gamma-law).
    pub fn bind(params: &Parameters, dim: Dimensionality) -> Result<Self> {
        params.validate()?;

        let turbulence = match params.turbulence_model {
            TurbulenceModel::None => TurbulenceOperatorEnum::from(NoTurbulence),
            TurbulenceModel::Constant => TurbulenceOperatorEnum::from(ConstantTurbulence),
            TurbulenceModel::Smagorinsky => TurbulenceOperatorEnum::from(SmagorinskyTurbulence),
        };

        let grid_motion = match dim {
            Dimensionality::OneD => GridMotionOperatorEnum::from(OneDGridMotion),
            Dimensionality::TwoD | Dimensionality::ThreeD => GridMotionOperatorEnum::from(MultiDGridMotion { dim }),
        };

        Ok(Self { turbulence, grid_motion })
    }
}

/// Drives one complete timestep through the fixed invocation order of
/// §2: `C5 → C3 (density, Q) → C4 (P/T/κ/γ) → C3 (velocities) → C2 (U0, R)
/// → C4 (energy) → C6 (implicit, if enabled) → timestep controller`,
/// exchanging ghost zones between stages, then swaps `new` into `old`.
///
/// `table` is the (§6, out-of-scope) tabulated-EOS lookup service;
/// required when `params.eos` is [`EosKind::Tabulated`] or the implicit
/// solve is enabled, unused otherwise.
#[allow(clippy::too_many_arguments)]
pub fn run_step(
    state: &mut GridState,
    operators: &OperatorTable,
    params: &Parameters,
    geom: &GeometricFactors,
    dim: Dimensionality,
    proc_top: &ProcTop,
    exchange: &dyn Exchange,
    time: &Time,
    implicit_plan: &ImplicitPlan,
    table: Option<&dyn EosTable>,
    is_rank_zero: bool,
) -> Result<(Time, Diagnostics)> {
    let mut diag = Diagnostics::default();

    // C5: turbulence closure, using the previous step's velocities.
    operators.turbulence.update(state, params, &diag, geom, dim);
    exchange.update_local_boundaries_new(&mut state.eddy_visc.new, proc_top)?;

    // C3 (density, Q): density, artificial viscosity, angular average.
    calc_new_d(state, geom, dim, time.dt_np1half);
    calc_new_q0(state, params, time.dt_np1half);
    if dim.has_theta() {
        calc_new_q1(state, params, dim, time.dt_np1half);
    }
    if dim.has_phi() {
        calc_new_q2(state, params, dim, time.dt_np1half);
    }
    calc_new_den_ave(state, geom, dim);
    exchange.update_local_boundaries_new(&mut state.d.new, proc_top)?;
    exchange.update_local_boundaries_new(&mut state.den_ave.new, proc_top)?;

    // C4 (pressure/T/kappa/gamma).
    match params.eos {
        EosKind::GammaLaw => calc_new_eos_vars_gamma_law(state, params),
        EosKind::Tabulated => {
            let table = table.expect("tabulated EOS requires an EosTable collaborator");
            calc_new_eos_vars_tabulated(state, table, params)?;
        }
    }
    exchange.update_local_boundaries_new(&mut state.p.new, proc_top)?;
    if matches!(params.eos, EosKind::Tabulated) {
        exchange.update_local_boundaries_new(&mut state.t.new, proc_top)?;
        exchange.update_local_boundaries_new(&mut state.kappa.new, proc_top)?;
    }

    // C3 (velocities).
    calc_new_u(state, params, &diag, time.dt_np1half);
    if dim.has_theta() {
        calc_new_v(state, &diag, dim, time.dt_np1half);
    }
    if dim.has_phi() {
        calc_new_w(state, &diag, geom, dim, time.dt_np1half);
    }
    exchange.update_local_boundaries_new(&mut state.u.new, proc_top)?;
    if dim.has_theta() {
        exchange.update_local_boundaries_new(&mut state.v.new, proc_top)?;
    }
    if dim.has_phi() {
        exchange.update_local_boundaries_new(&mut state.w.new, proc_top)?;
    }
    apply_sedov_inner_boundary(state, params, proc_top);

    // C2 (U0, R).
    operators.grid_motion.update_u0(state, geom, proc_top, exchange)?;
    calc_new_r(state, time.dt_np1half);
    exchange.update_local_boundaries_new(&mut state.r.new, proc_top)?;

    // C4 (energy).
    calc_new_e(state, params, &diag, geom, dim, time.dt_n);
    exchange.update_local_boundaries_new(&mut state.e.new, proc_top)?;

    // C6 (implicit correction, if enabled).
    if implicit_plan.is_enabled() {
        let table = table.expect("the implicit solve requires a tabulated EosTable collaborator");
        diag.implicit = implicit_solve(state, implicit_plan, params, geom, dim, table, exchange, proc_top, time.dt_n, is_rank_zero)?;
    }

    state.check_positivity(matches!(params.eos, EosKind::Tabulated), is_rank_zero)?;

    // Timestep controller.
    let (new_time, timestep_diag) = if time.variable_timestep {
        calc_deltat_variable(state, params, time, dim, exchange, is_rank_zero)?
    } else {
        (calc_deltat_constant(time), Diagnostics::default())
    };
    diag.donor_fraction = timestep_diag.donor_fraction;
    diag.max_convective_velocity = timestep_diag.max_convective_velocity;
    diag.max_convective_velocity_c = timestep_diag.max_convective_velocity_c;

    state.swap_all();

    Ok((new_time, diag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EosKind, FeatureFlags, ImplicitRow, TurbulenceModel};
    use crate::grid::exchange::NullTopology;

    fn params() -> Parameters {
        Parameters {
            gamma: 5.0 / 3.0,
            g: 0.0,
            sigma: 1.0,
            pi: std::f64::consts::PI,
            alpha: 0.5,
            alpha_extra: 0.0,
            eddy_viscosity_c: 0.0,
            av_threshold: 0.1,
            turbulent_prandtl: 1.0,
            eos: EosKind::GammaLaw,
            is_adiabatic: true,
            turbulence_model: TurbulenceModel::None,
            tolerance: 1e-8,
            max_iterations: 20,
            feature_flags: FeatureFlags::default(),
        }
    }

    fn time() -> Time {
        Time {
            t: 0.0,
            dt_nm1half: 0.01,
            dt_np1half: 0.01,
            dt_n: 0.01,
            courant_factor: 0.4,
            variable_timestep: true,
            const_timestep_value: 0.0,
            per_change: 0.1,
            step_index: 0,
        }
    }

    fn empty_plan() -> ImplicitPlan {
        ImplicitPlan {
            num_implicit_zones: 0,
            rows: Vec::<ImplicitRow>::new(),
            tolerance: 1e-6,
            derivative_step_fraction: 1e-6,
            max_iterations: 10,
        }
    }

    #[test]
    fn bind_rejects_non_adiabatic_gamma_law() {
        let mut bad = params();
        bad.is_adiabatic = false;
        assert!(OperatorTable::bind(&bad, Dimensionality::OneD).is_err());
    }

    #[test]
    fn one_full_step_on_a_quiescent_adiabatic_state_keeps_it_quiescent() {
        let dim = Dimensionality::OneD;
        let operators = OperatorTable::bind(&params(), dim).unwrap();
        let geom = GeometricFactors::default();
        let proc_top = ProcTop::single_rank(dim);

        let mut state = GridState::allocate(6, 0, 0, dim, false);
        for i in 0..=6 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64 * 0.1);
            state.r.old.set(i, 0, 0, 1.0 + i as f64 * 0.1);
        }
        for i in 0..6 {
            state.d.new.set(i, 0, 0, 1.0);
            state.d.old.set(i, 0, 0, 1.0);
            state.e.new.set(i, 0, 0, 1.0);
            state.e.old.set(i, 0, 0, 1.0);
            state.den_ave.new.set(i, 0, 0, 1.0);
        }

        let (new_time, diag) = run_step(&mut state, &operators, &params(), &geom, dim, &proc_top, &NullTopology, &time(), &empty_plan(), None, true).unwrap();

        assert!(new_time.dt_n > 0.0);
        assert!(diag.donor_fraction >= 0.1);
        for i in 0..6 {
            assert!(state.d.old.get(i, 0, 0) > 0.0);
        }
    }
}
