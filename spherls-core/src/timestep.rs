//! Adaptive timestep controller (component C2.5, §4.6): a CFL limit
//! combined with a per-variable fractional-change limit, plus the
//! constant-`Δt` mode that bypasses both.

use crate::config::{Diagnostics, Parameters, Time};
use crate::error::{Error, Fault, Result};
use crate::grid::exchange::Exchange;
use crate::grid::field::Region;
use crate::grid::geometry::GeometricFactors;
use crate::grid::topology::{Dimensionality, ProcTop};
use crate::state::GridState;

/// Growth cap on successive timesteps (§4.6: "The 1.02 cap limits
/// growth to 2% per step").
const MAX_GROWTH_FACTOR: f64 = 1.02;

/// Floor on the fractional-change denominator so `|Δv|/|v|` cannot explode
/// near a zero-crossing (§9 "Numerical safety rails": "clamped to a
/// floor of `1e4`" — i.e. `|v|` is never treated as smaller than `1/1e4`).
const FRACTIONAL_CHANGE_DENOM_FLOOR: f64 = 1e-4;

/// Local sound speed, gamma-law or tabulated (both have `P`, `D`, `Gamma`
/// populated by the time the controller runs, per the §2 invocation order).
fn sound_speed(state: &GridState, i: usize, j: usize, k: usize) -> f64 {
    let p = state.p.new.get(i, j, k);
    let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
    let gamma = state.gamma.new.get(i, j, k);
    (gamma * p / rho).max(0.0).sqrt()
}

/// Per-cell local grid spacing along the radial direction, the smallest
/// length scale (and hence tightest CFL constraint) on a radially moving
/// mesh.
fn local_dr(state: &GridState, i: usize, j: usize, k: usize) -> f64 {
    (state.r.new.get(i + 1, j, k) - state.r.new.get(i, j, k)).abs()
}

/// Relative fractional change `|new - old| / max(|old|, floor)`.
fn fractional_change(new: f64, old: f64) -> f64 {
    (new - old).abs() / old.abs().max(FRACTIONAL_CHANGE_DENOM_FLOOR)
}

/// `calc_deltat`, variable-timestep branch (§4.6): computes the CFL
/// time and the fractional-change estimate over every owned cell, combines
/// them (and the previous step's `Δt`, growth-capped) into the next `Δt`,
/// and publishes the donor fraction and maximum convective velocity as a
/// side effect.
///
/// Returns the new [`Time`] and [`Diagnostics`]; does not mutate `state`.
#[allow(clippy::too_many_arguments)]
pub fn calc_deltat_variable(
    state: &GridState,
    params: &Parameters,
    time: &Time,
    dim: Dimensionality,
    exchange: &dyn Exchange,
    is_rank_zero: bool,
) -> Result<(Time, Diagnostics)> {
    let mut min_dt_cfl = f64::INFINITY;
    let mut offending_cell: Option<(usize, usize, usize)> = None;
    let mut max_frac_change = 0.0_f64;
    let mut max_convective_velocity = 0.0_f64;

    let cells: Vec<_> = state.d.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let c = sound_speed(state, i, j, k);
        let u_rel = state.u.new.get(i, j, k) - state.u0.new.get(i, 0, 0);
        let v = if dim.has_theta() { state.v.new.get(i, j, k) } else { 0.0 };
        let w = if dim.has_phi() { state.w.new.get(i, j, k) } else { 0.0 };

        let speed_sq = c * c + u_rel * u_rel;
        let dr = local_dr(state, i, j, k);
        let dt_cfl_r = if speed_sq > 0.0 { dr / speed_sq.sqrt() } else { f64::INFINITY };

        if dt_cfl_r < min_dt_cfl {
            min_dt_cfl = dt_cfl_r;
            offending_cell = Some((i, j, k));
        }

        let convective = (u_rel * u_rel + v * v + w * w).sqrt();
        if convective > max_convective_velocity {
            max_convective_velocity = convective;
        }

        let d_frac = fractional_change(state.d.new.get(i, j, k), state.d.old.get(i, j, k));
        let e_frac = fractional_change(state.e.new.get(i, j, k), state.e.old.get(i, j, k));
        let u_frac = fractional_change(u_rel, state.u.old.get(i, j, k) - state.u0.old.get(i, 0, 0));
        let v_frac = if dim.has_theta() { fractional_change(v, state.v.old.get(i, j, k)) } else { 0.0 };
        let w_frac = if dim.has_phi() { fractional_change(w, state.w.old.get(i, j, k)) } else { 0.0 };

        max_frac_change = max_frac_change.max(d_frac).max(e_frac).max(u_frac).max(v_frac).max(w_frac);
    }

    min_dt_cfl = exchange.all_reduce_min(min_dt_cfl)?;
    max_frac_change = exchange.all_reduce_max(max_frac_change)?;
    max_convective_velocity = exchange.all_reduce_max(max_convective_velocity)?;

    if min_dt_cfl <= 0.0 {
        let (i, j, k) = offending_cell.unwrap_or((0, 0, 0));
        return Err(Error::input(
            format!("non-positive CFL timestep at shell {i}"),
            Fault::here(file!(), "calc_deltat_variable", line!()).at(i, j, k),
            is_rank_zero,
        ));
    }

    let c_ref = {
        // A representative sound speed for publishing max_convective_velocity/c:
        // the cell that set the tightest CFL constraint is the natural choice.
        let (i, j, k) = offending_cell.unwrap_or((0, 0, 0));
        sound_speed(state, i, j, k).max(f64::MIN_POSITIVE)
    };

    let dt_from_cfl = min_dt_cfl * time.courant_factor;
    let dt_from_frac = if max_frac_change > 0.0 {
        time.dt_n * (time.per_change / max_frac_change)
    } else {
        f64::INFINITY
    };
    let dt_from_growth = time.dt_n * MAX_GROWTH_FACTOR;

    let dt_next = dt_from_cfl.min(dt_from_frac).min(dt_from_growth);

    let donor_fraction = (max_convective_velocity / c_ref).clamp(0.1, 1.0);

    let new_time = Time {
        t: time.t + time.dt_n,
        dt_nm1half: time.dt_np1half,
        dt_np1half: 0.5 * (time.dt_n + dt_next),
        dt_n: dt_next,
        courant_factor: time.courant_factor,
        variable_timestep: time.variable_timestep,
        const_timestep_value: time.const_timestep_value,
        per_change: time.per_change,
        step_index: time.step_index + 1,
    };

    let diagnostics = Diagnostics {
        donor_fraction,
        max_convective_velocity,
        max_convective_velocity_c: max_convective_velocity / c_ref,
        implicit: crate::config::ImplicitDiagnostics::default(),
    };

    Ok((new_time, diagnostics))
}

/// `calc_deltat`, constant-timestep branch (§4.6): simply advances
/// simulation time by the configured constant, skipping the CFL and
/// fractional-change computations entirely.
#[must_use]
pub fn calc_deltat_constant(time: &Time) -> Time {
    Time {
        t: time.t + time.const_timestep_value,
        dt_nm1half: time.dt_np1half,
        dt_np1half: time.const_timestep_value,
        dt_n: time.const_timestep_value,
        courant_factor: time.courant_factor,
        variable_timestep: time.variable_timestep,
        const_timestep_value: time.const_timestep_value,
        per_change: time.per_change,
        step_index: time.step_index + 1,
    }
}

/// Also used by geometric factors in tests that only need a φ-independent
/// default angular table.
#[must_use]
pub fn default_geometry() -> GeometricFactors {
    GeometricFactors::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EosKind, FeatureFlags, TurbulenceModel};
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
            tolerance: 1e-6,
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
            courant_factor: 0.5,
            variable_timestep: true,
            const_timestep_value: 0.0,
            per_change: 0.1,
            step_index: 0,
        }
    }

    fn quiescent_state(n_r: usize) -> GridState {
        let mut state = GridState::allocate(n_r, 0, 0, Dimensionality::OneD, false);
        for i in 0..=n_r {
            state.r.new.set(i, 0, 0, 1.0 + i as f64 * 0.1);
        }
        for i in 0..n_r {
            state.d.new.set(i, 0, 0, 1.0);
            state.d.old.set(i, 0, 0, 1.0);
            state.e.new.set(i, 0, 0, 1.0);
            state.e.old.set(i, 0, 0, 1.0);
            state.p.new.set(i, 0, 0, 1.0);
            state.gamma.new.set(i, 0, 0, 5.0 / 3.0);
        }
        state
    }

    #[test]
    fn quiescent_state_caps_growth_at_1_02() {
        let state = quiescent_state(10);
        let (new_time, _diag) = calc_deltat_variable(&state, &params(), &time(), Dimensionality::OneD, &NullTopology, true).unwrap();
        assert!(new_time.dt_n <= time().dt_n * MAX_GROWTH_FACTOR + 1e-15);
    }

    #[test]
    fn injected_convective_velocity_sets_donor_fraction_near_injected_ratio() {
        let mut state = quiescent_state(10);
        // c_sound = sqrt(gamma * P / rho) = sqrt(5/3) ~= 1.29; inject u_rel = 0.9 * c.
        let c = (5.0_f64 / 3.0).sqrt();
        state.u.new.set(3, 0, 0, 0.9 * c);
        state.u0.new.set(3, 0, 0, 0.0);
        let (_new_time, diag) = calc_deltat_variable(&state, &params(), &time(), Dimensionality::OneD, &NullTopology, true).unwrap();
        assert!((diag.donor_fraction - 0.9).abs() < 0.05);
    }

    #[test]
    fn constant_mode_ignores_cfl_and_uses_fixed_value() {
        let mut t = time();
        t.variable_timestep = false;
        t.const_timestep_value = 0.05;
        let new_time = calc_deltat_constant(&t);
        assert_eq!(new_time.dt_n, 0.05);
        assert_eq!(new_time.t, 0.05);
    }

    #[test]
    fn non_positive_cfl_is_rejected_as_input_error() {
        let mut state = quiescent_state(5);
        for i in 0..5 {
            state.r.new.set(i, 0, 0, 1.0);
            state.r.new.set(i + 1, 0, 0, 1.0); // zero-width cell -> dt_cfl = 0
        }
        let err = calc_deltat_variable(&state, &params(), &time(), Dimensionality::OneD, &NullTopology, true);
        assert!(err.is_err());
        match err {
            Err(Error::Input { .. }) => {}
            _ => panic!("expected Error::Input"),
        }
    }
}
