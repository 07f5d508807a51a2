//! Grid motion (component C2, §4.2): the new grid velocity `U0` and the
//! advected mesh radius `R`.

use crate::error::Result;
use crate::grid::exchange::Exchange;
use crate::grid::field::Region;
use crate::grid::geometry::{radial_face_area, GeometricFactors};
use crate::grid::topology::{Dimensionality, ProcTop};
use crate::state::GridState;

/// `calc_new_U0`, 1D variant: a pure area-ratio recurrence (§4.2).
///
/// ```text
/// U0[i] = (U0[i-1] - U_new[i-1]) * (A[i-1]/A[i]) * (rho[i-1/2]/rho[i+1/2]) + U_new[i]
/// ```
pub fn calc_new_u0_1d(
    state: &mut GridState,
    geom: &GeometricFactors,
    proc_top: &ProcTop,
    exchange: &dyn Exchange,
) -> Result<()> {
    let dim = Dimensionality::OneD;
    let r_range = state.r.new.extent().r;
    let n_r = r_range.end;

    let inner_u0 = exchange.recv_inner_u0(proc_top)?;
    let mut prev_u0 = inner_u0;
    let mut prev_u_new = state.u.new.get(r_range.start, 0, 0);

    for i in r_range.start..r_range.end {
        let r_here = state.r.new.get(i, 0, 0);
        let area_here = radial_face_area(r_here, geom, 0, dim);
        let area_prev = if i == r_range.start {
            area_here
        } else {
            radial_face_area(state.r.new.get(i - 1, 0, 0), geom, 0, dim)
        };

        let rho_inner = if i == 0 { state.den_ave.new.get(0, 0, 0) } else { state.den_ave.new.get(i - 1, 0, 0) };
        let rho_outer = state.den_ave.new.get(i.min(n_r - 1), 0, 0);
        let rho_ratio = if rho_outer.abs() > 0.0 { rho_inner / rho_outer } else { 1.0 };

        let u_new_here = state.u.new.get(i, 0, 0);
        let u0_here = (prev_u0 - prev_u_new) * (area_prev / area_here) * rho_ratio + u_new_here;

        state.u0.new.set(i, 0, 0, u0_here);
        prev_u0 = u0_here;
        prev_u_new = u_new_here;
    }

    finish_u0_sweep(state, proc_top, exchange)
}

/// `calc_new_U0`, 2D/3D variant: balances the mass flux through the cell's
/// outer radial face against the θ/φ fluxes of the same ring (§4.2).
///
/// `U0` stays angle-independent, so every `(j, k)` in the ring at radius `i`
/// contributes to one shared balance before `U0[i]` is set.
pub fn calc_new_u0_multi_d(
    state: &mut GridState,
    geom: &GeometricFactors,
    proc_top: &ProcTop,
    exchange: &dyn Exchange,
    dim: Dimensionality,
) -> Result<()> {
    let r_range = state.r.new.extent().r;
    let theta_range = state.d.new.extent().theta;
    let phi_range = state.d.new.extent().phi;
    let theta_len = theta_range.len().max(1);
    let phi_len = phi_range.len().max(1);

    let _inner_u0 = exchange.recv_inner_u0(proc_top)?;

    for i in r_range.start..r_range.end {
        let r_here = state.r.new.get(i, 0, 0);
        let mut c_sum = 0.0;
        let mut sum_a_rho = 0.0;

        for j in 0..theta_len {
            for k in 0..phi_len {
                let rho = state.den_ave.new.get(i.min(state.d.new.extent().r.end - 1), 0, 0);
                let area_r = radial_face_area(r_here, geom, j.min(geom.d_cos_theta.len().saturating_sub(1)), dim);
                sum_a_rho += area_r * rho;

                if dim.has_theta() {
                    let v_outer = state.v.new.get(i.min(state.v.new.extent().r.end.saturating_sub(1)), j + 1, k.min(phi_len.saturating_sub(1)));
                    let v_inner = state.v.new.get(i.min(state.v.new.extent().r.end.saturating_sub(1)), j, k.min(phi_len.saturating_sub(1)));
                    c_sum += rho * (v_outer - v_inner) * area_r;
                }
                if dim.has_phi() {
                    let w_outer = state.w.new.get(i.min(state.w.new.extent().r.end.saturating_sub(1)), j, k + 1);
                    let w_inner = state.w.new.get(i.min(state.w.new.extent().r.end.saturating_sub(1)), j, k);
                    c_sum += rho * (w_outer - w_inner) * area_r;
                }
            }
        }

        let u0_here = if sum_a_rho.abs() > 0.0 { -c_sum / sum_a_rho } else { 0.0 };
        state.u0.new.set(i, 0, 0, u0_here);
    }

    finish_u0_sweep(state, proc_top, exchange)
}

/// Sends the outer-boundary `U0`, posts the next round's exchange, and
/// enforces the free-surface invariant `U0_surface == U_surface` at the
/// outermost rank (§3.3, §4.2).
fn finish_u0_sweep(state: &mut GridState, proc_top: &ProcTop, exchange: &dyn Exchange) -> Result<()> {
    let r_range = state.r.new.extent().r;
    let outer_u0 = state.u0.new.get(r_range.end - 1, 0, 0);
    exchange.send_outer_u0(proc_top, outer_u0)?;
    exchange.post_next_u0_exchange(proc_top, state.u0.new.get(r_range.start, 0, 0))?;

    if proc_top.is_outermost() {
        let surface_u = state.u.new.get(r_range.end - 1, 0, 0);
        state.u0.new.set(r_range.end - 1, 0, 0, surface_u);
        for (i, j, k) in state.u0.new.indices(Region::ROuter) {
            state.u.new.set(i, j, k, surface_u);
            state.u0.new.set(i, j, k, surface_u);
        }
    }

    Ok(())
}

/// `calc_new_R`: advects every owned and ghost radial interface by the new
/// grid velocity (§4.2). Exact to round-off, as required by §8.
pub fn calc_new_r(state: &mut GridState, dt_np1half: f64) {
    let regions = std::iter::once(Region::Interior).chain(Region::GHOSTS.iter().copied());
    for region in regions {
        let cells: Vec<_> = state.r.new.indices(region).collect();
        for (i, j, k) in cells {
            let r_old = state.r.old.get(i, j, k);
            let u0 = state.u0.new.get(i, 0, 0);
            state.r.new.set(i, j, k, r_old + dt_np1half * u0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::exchange::NullTopology;

    fn setup_1d(n_r: usize) -> (GridState, GeometricFactors, ProcTop) {
        let mut state = GridState::allocate(n_r, 0, 0, Dimensionality::OneD, false);
        for i in 0..=n_r {
            state.r.new.set(i, 0, 0, 1.0 + i as f64 * 0.1);
            state.r.old.set(i, 0, 0, 1.0 + i as f64 * 0.1);
        }
        for i in 0..n_r {
            state.den_ave.new.set(i, 0, 0, 1.0);
        }
        let geom = GeometricFactors::default();
        let topo = ProcTop::single_rank(Dimensionality::OneD);
        (state, geom, topo)
    }

    #[test]
    fn uniform_state_has_zero_grid_velocity() {
        let (mut state, geom, topo) = setup_1d(5);
        calc_new_u0_1d(&mut state, &geom, &topo, &NullTopology).unwrap();
        for i in 0..5 {
            assert!((state.u0.new.get(i, 0, 0)).abs() < 1e-10);
        }
    }

    #[test]
    fn calc_new_r_matches_closed_form_to_round_off() {
        let (mut state, _geom, _topo) = setup_1d(5);
        for i in 0..=5 {
            state.u0.new.set(i, 0, 0, 0.25);
        }
        let dt = 0.4;
        calc_new_r(&mut state, dt);
        for i in 0..=5 {
            let expected = state.r.old.get(i, 0, 0) + dt * 0.25;
            assert_eq!(state.r.new.get(i, 0, 0), expected);
        }
    }

    #[test]
    fn zero_timestep_leaves_r_unchanged() {
        let (mut state, _geom, _topo) = setup_1d(5);
        for i in 0..=5 {
            state.u0.new.set(i, 0, 0, 1.3);
        }
        calc_new_r(&mut state, 0.0);
        for i in 0..=5 {
            assert_eq!(state.r.new.get(i, 0, 0), state.r.old.get(i, 0, 0));
        }
    }
}
