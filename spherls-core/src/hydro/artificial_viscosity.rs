//! Artificial viscosity `Q0`/`Q1`/`Q2` (§4.3): a compression-triggered
//! pressure-like term that broadens shocks over a few zones.

use crate::config::Parameters;
use crate::grid::field::Region;
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// One direction's artificial-viscosity coefficient `A` (named alongside the
/// threshold `tau_AV` as a configuration constant); kept a local constant
/// rather than added to [`Parameters`], since only one value per direction
/// is ever needed and `pineappl::grid::SubgridParams` shows the same
/// restraint for closely-related scalars that never vary independently.
const AV_COEFFICIENT: f64 = 2.0;

/// `calc_new_Q0`: radial artificial viscosity, computed on the main grid and
/// the outer surface ghost ring (§4.3).
pub fn calc_new_q0(state: &mut GridState, params: &Parameters, dt_np1half: f64) {
    let regions = [Region::Interior, Region::ROuter];
    for region in regions {
        let cells: Vec<_> = state.q0.new.indices(region).collect();
        for (i, j, k) in cells {
            let u_outer = state.u.new.get(i + 1, j, k);
            let u_inner = state.u.new.get(i, j, k);
            let dv_dt = (u_outer - u_inner) / dt_np1half.max(f64::EPSILON);
            let rho = state.d.new.get(i, j, k);
            let c_sound = sound_speed(state, params, i, j, k);
            let q = compression_q(dv_dt, rho, c_sound, params.av_threshold);
            state.q0.new.set(i, j, k, q);
        }
    }
}

/// `calc_new_Q1`: polar artificial viscosity, active only at 2D/3D.
pub fn calc_new_q1(state: &mut GridState, params: &Parameters, dim: Dimensionality, dt_np1half: f64) {
    if !dim.has_theta() {
        return;
    }
    let cells: Vec<_> = state.q1.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let v_outer = state.v.new.get(i, j + 1, k);
        let v_inner = state.v.new.get(i, j, k);
        let dv_dt = (v_outer - v_inner) / dt_np1half.max(f64::EPSILON);
        let rho = state.d.new.get(i, j, k);
        let c_sound = sound_speed(state, params, i, j, k);
        let q = compression_q(dv_dt, rho, c_sound, params.av_threshold);
        state.q1.new.set(i, j, k, q);
    }
}

/// `calc_new_Q2`: azimuthal artificial viscosity, active only at 3D.
pub fn calc_new_q2(state: &mut GridState, params: &Parameters, dim: Dimensionality, dt_np1half: f64) {
    if !dim.has_phi() {
        return;
    }
    let cells: Vec<_> = state.q2.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let w_outer = state.w.new.get(i, j, k + 1);
        let w_inner = state.w.new.get(i, j, k);
        let dv_dt = (w_outer - w_inner) / dt_np1half.max(f64::EPSILON);
        let rho = state.d.new.get(i, j, k);
        let c_sound = sound_speed(state, params, i, j, k);
        let q = compression_q(dv_dt, rho, c_sound, params.av_threshold);
        state.q2.new.set(i, j, k, q);
    }
}

fn compression_q(dv_dt: f64, rho: f64, c_sound: f64, tau_av: f64) -> f64 {
    let threshold = tau_av * c_sound;
    if dv_dt < -threshold {
        AV_COEFFICIENT * AV_COEFFICIENT * rho * (dv_dt + threshold).powi(2)
    } else {
        0.0
    }
}

fn sound_speed(state: &GridState, params: &Parameters, i: usize, j: usize, k: usize) -> f64 {
    let p = state.p.new.get(i, j, k);
    let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
    (params.gamma * p / rho).max(0.0).sqrt()
}
