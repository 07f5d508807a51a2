//! `calc_new_DenAve` (§4.3): the volume-weighted angular average of
//! `D` over the cell ring at each radius, the effective density that keeps
//! mass flux and pressure gradients consistent across the 1D/2D/3D
//! boundary between ranks.

use crate::grid::geometry::{cell_volume, GeometricFactors};
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// 1D ranks copy `D` directly; 2D/3D ranks take the cell-volume-weighted
/// mean of `D` over every `(j, k)` in the ring at radius `i`.
pub fn calc_new_den_ave(state: &mut GridState, geom: &GeometricFactors, dim: Dimensionality) {
    let r_range = state.den_ave.new.extent().r;

    if !dim.has_theta() {
        for i in r_range.iter() {
            let d = state.d.new.get(i, 0, 0);
            state.den_ave.new.set(i, 0, 0, d);
        }
        return;
    }

    let theta_range = state.d.new.extent().theta;
    let phi_range = state.d.new.extent().phi;
    let phi_len = phi_range.len().max(1);

    for i in r_range.iter() {
        let r_inner = state.r.new.get(i, 0, 0);
        let r_outer = state.r.new.get(i + 1, 0, 0);
        let mut weighted_sum = 0.0;
        let mut volume_sum = 0.0;

        for j in theta_range.iter() {
            let vol = cell_volume(r_inner, r_outer, geom, j, dim);
            for k in 0..phi_len {
                let d = state.d.new.get(i, j, k);
                weighted_sum += d * vol;
                volume_sum += vol;
            }
        }

        let ave = if volume_sum > 0.0 { weighted_sum / volume_sum } else { 0.0 };
        state.den_ave.new.set(i, 0, 0, ave);
    }
}
