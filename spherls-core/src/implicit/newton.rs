//! `implicit_solve` (§4.7): the outer Newton loop driving the
//! per-iteration Jacobian assembly and Krylov solve to convergence (or to
//! the configured iteration budget, logging a warning if not converged).

use crate::config::{ImplicitDiagnostics, ImplicitPlan, Parameters};
use crate::error::{warn, Error, Fault, Result};
use crate::grid::exchange::Exchange;
use crate::grid::geometry::GeometricFactors;
use crate::grid::topology::{Dimensionality, ProcTop};
use crate::implicit::jacobian::{assemble_jacobian_row, row_index_by_cell};
use crate::implicit::linear_system::{FaerLinearSystem, LinearSystem};
use crate::implicit::residual::{implicit_energy_residual, implicit_energy_residual_surface, ImplicitContext};
use crate::energy::EosTable;
use crate::state::GridState;
use rustc_hash::FxHashMap;

/// Runs the Newton iteration of §4.7 to convergence (or to
/// `plan.max_iterations`), correcting `state.t.new` in every implicit cell
/// and recomputing `P`, `E`, `κ`, `γ` from the converged temperature.
/// No-ops (returns default diagnostics) when `plan.is_enabled()` is false.
pub fn implicit_solve(
    state: &mut GridState,
    plan: &ImplicitPlan,
    params: &Parameters,
    geom: &GeometricFactors,
    dim: Dimensionality,
    table: &dyn EosTable,
    exchange: &dyn Exchange,
    proc_top: &ProcTop,
    dt: f64,
    is_rank_zero: bool,
) -> Result<ImplicitDiagnostics> {
    if !plan.is_enabled() {
        return Ok(ImplicitDiagnostics::default());
    }

    let row_index: FxHashMap<(usize, usize, usize), usize> = row_index_by_cell(&plan.rows);
    let mut system = FaerLinearSystem::new(plan.rows.len().min(20).max(1), plan.max_iterations as usize * 4 + 20);

    let mut iterations = 0;
    let mut max_relative_correction = f64::INFINITY;

    while iterations < plan.max_iterations && max_relative_correction > plan.tolerance {
        let ctx = ImplicitContext {
            state,
            params,
            geom,
            dim,
            table,
            dt,
        };

        // `T::new` is read through a closure so the Jacobian's finite
        // differences can perturb one cell at a time without cloning the
        // whole field.
        let t_field = |i: usize, j: usize, k: usize| ctx.state.t.new.get(i, j, k);

        system.reset(plan.rows.len());
        for row in &plan.rows {
            let residual_fn = if row.is_surface {
                implicit_energy_residual_surface
            } else {
                implicit_energy_residual
            };
            let jrow = assemble_jacobian_row(&ctx, row, &row_index, &t_field, plan.derivative_step_fraction, residual_fn);
            system.assemble_row(&jrow);
        }

        let delta_t = system.solve(exchange, plan.tolerance)?;

        max_relative_correction = 0.0_f64;
        for (row, dt_correction) in plan.rows.iter().zip(&delta_t) {
            let t_old = state.t.new.get(row.i, row.j, row.k);
            let t_new = t_old + dt_correction;
            if t_new <= 0.0 {
                return Err(Error::calculation(
                    format!("implicit solve drove T non-positive at shell {}", row.i),
                    Fault::here(file!(), "implicit_solve", line!()).at(row.i, row.j, row.k).on_rank(proc_top.rank),
                    is_rank_zero,
                ));
            }
            state.t.new.set(row.i, row.j, row.k, t_new);

            let relative = (dt_correction / t_new).abs();
            max_relative_correction = max_relative_correction.max(relative);
        }

        max_relative_correction = exchange.all_reduce_max(max_relative_correction)?;
        exchange.update_local_boundaries_new(&mut state.t.new, proc_top)?;

        iterations += 1;
    }

    if iterations == plan.max_iterations && max_relative_correction > plan.tolerance {
        warn::implicit_solve_not_converged(iterations, max_relative_correction);
    }

    for row in &plan.rows {
        let (i, j, k) = (row.i, row.j, row.k);
        let t = state.t.new.get(i, j, k);
        let rho = state.d.new.get(i, j, k);
        let (p, e, kappa, gamma) = {
            let (e, _dt_de) = table.e_and_dt_de(t, rho);
            let (p, kappa, gamma) = table.p_kappa_gamma(t, rho);
            (p, e, kappa, gamma)
        };
        state.p.new.set(i, j, k, p);
        state.e.new.set(i, j, k, e);
        state.kappa.new.set(i, j, k, kappa);
        state.gamma.new.set(i, j, k, gamma);
    }

    Ok(ImplicitDiagnostics {
        max_relative_t_correction: max_relative_correction,
        max_total_iterations: iterations,
        max_solver_residual: if params.feature_flags.track_max_solver_error { Some(0.0) } else { None },
        max_ksp_iterations: if params.feature_flags.track_max_solver_error { Some(iterations) } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DerivativeType, EosKind, FeatureFlags, ImplicitRow, TurbulenceModel};
    use crate::grid::exchange::NullTopology;

    struct LinearTable {
        c_v: f64,
        gamma: f64,
    }

    impl EosTable for LinearTable {
        fn e_and_dt_de(&self, t: f64, _rho: f64) -> (f64, f64) {
            (self.c_v * t, 1.0 / self.c_v)
        }

        fn p_kappa_gamma(&self, t: f64, rho: f64) -> (f64, f64, f64) {
            (rho * t * (self.gamma - 1.0) * self.c_v, 1.0, self.gamma)
        }
    }

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
            eos: EosKind::Tabulated,
            is_adiabatic: false,
            turbulence_model: TurbulenceModel::None,
            tolerance: 1e-8,
            max_iterations: 30,
            feature_flags: FeatureFlags::default(),
        }
    }

    #[test]
    fn disabled_plan_is_a_no_op() {
        let mut state = GridState::allocate(5, 0, 0, Dimensionality::OneD, false);
        let plan = ImplicitPlan {
            num_implicit_zones: 0,
            rows: vec![],
            tolerance: 1e-6,
            derivative_step_fraction: 1e-6,
            max_iterations: 10,
        };
        let geom = GeometricFactors::default();
        let table = LinearTable { c_v: 2.0, gamma: 5.0 / 3.0 };
        let topo = ProcTop::single_rank(Dimensionality::OneD);
        let diag = implicit_solve(&mut state, &plan, &params(), &geom, Dimensionality::OneD, &table, &NullTopology, &topo, 0.1, true).unwrap();
        assert_eq!(diag.max_total_iterations, 0);
    }

    #[test]
    fn uniform_steady_state_converges_in_one_iteration() {
        let mut state = GridState::allocate(5, 0, 0, Dimensionality::OneD, false);
        for i in 0..=5 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
        }
        for i in 0..5 {
            state.d.new.set(i, 0, 0, 1.0);
            state.t.new.set(i, 0, 0, 2.0);
            state.t.old.set(i, 0, 0, 2.0);
            state.e.old.set(i, 0, 0, 4.0);
            state.kappa.old.set(i, 0, 0, 1.0);
            state.kappa.new.set(i, 0, 0, 1.0);
        }
        let plan = ImplicitPlan {
            num_implicit_zones: 1,
            rows: vec![ImplicitRow {
                i: 2,
                j: 0,
                k: 0,
                global_row: 0,
                derivatives: vec![DerivativeType::Diagonal, DerivativeType::IPlus1, DerivativeType::IMinus1],
                is_surface: false,
            }],
            tolerance: 1e-8,
            derivative_step_fraction: 1e-6,
            max_iterations: 20,
        };
        let geom = GeometricFactors::default();
        let table = LinearTable { c_v: 2.0, gamma: 5.0 / 3.0 };
        let topo = ProcTop::single_rank(Dimensionality::OneD);
        let diag = implicit_solve(&mut state, &plan, &params(), &geom, Dimensionality::OneD, &table, &NullTopology, &topo, 0.1, true).unwrap();
        assert!(diag.max_total_iterations <= 2);
        assert!((state.t.new.get(2, 0, 0) - 2.0).abs() < 1e-6);
    }
}
