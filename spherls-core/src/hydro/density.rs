//! Density update (§4.3): finite-volume mass-flux balance on the
//! staggered grid, one variant per dimensionality.

use crate::grid::field::Region;
use crate::grid::geometry::{azimuthal_face_area, cell_volume, polar_face_area, radial_face_area, GeometricFactors};
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// `calc_new_D`: advances density in every owned cell (and the outer ghost
/// ring, which drops its outward-face flux per the free-surface policy)
/// using the signed face mass fluxes of §4.3.
///
/// ```text
/// V_new * D_new = V_old * D_old + dt * sum_faces(rho_face * (u_fluid - u_grid) * A_face)
/// ```
pub fn calc_new_d(state: &mut GridState, geom: &GeometricFactors, dim: Dimensionality, dt_np1half: f64) {
    let regions = [Region::Interior, Region::ROuter];
    for region in regions {
        let is_outer_ghost = region == Region::ROuter;
        let cells: Vec<_> = state.d.new.indices(region).collect();
        for (i, j, k) in cells {
            let r_inner = state.r.new.get(i, j, k);
            let r_outer = state.r.new.get(i + 1, j, k);
            let v_old = cell_volume(state.r.old.get(i, j, k), state.r.old.get(i + 1, j, k), geom, j, dim);
            let v_new = cell_volume(r_inner, r_outer, geom, j, dim);
            let d_old = state.d.old.get(i, j, k);

            let rho_inner_face = 0.5 * (state.d.old.get(i.saturating_sub(1), j, k) + d_old);
            let rho_outer_face = 0.5 * (d_old + state.d.old.get(i + 1, j, k));

            let u_rel_inner = state.u.new.get(i, j, k) - state.u0.new.get(i, 0, 0);
            let u_rel_outer = state.u.new.get(i + 1, j, k) - state.u0.new.get(i + 1, 0, 0);

            let area_inner = radial_face_area(r_inner, geom, j, dim);
            let area_outer = radial_face_area(r_outer, geom, j, dim);

            // Inward flux is a gain (positive u carries mass outward across
            // the inner face into the cell); outward flux is a loss.
            let mut flux = rho_inner_face * u_rel_inner * area_inner;
            if !is_outer_ghost {
                flux -= rho_outer_face * u_rel_outer * area_outer;
            }

            if dim.has_theta() {
                let r_mid_inner = 0.5 * (r_inner + r_outer);
                let sin_theta_jp1half = geom.sin_theta_interface[j.min(geom.sin_theta_interface.len() - 1)];
                let d_phi = if dim.has_phi() { geom.d_phi[k.min(geom.d_phi.len().max(1) - 1)] } else { 1.0 };
                let area_theta = polar_face_area(r_inner, r_outer, sin_theta_jp1half, d_phi, dim);
                let rho_jp1 = 0.5 * (d_old + state.d.old.get(i, j + 1, k));
                let rho_jm1 = 0.5 * (d_old + state.d.old.get(i, j.saturating_sub(1), k));
                let v_jp1 = state.v.new.get(i, j + 1, k);
                let v_jm1 = state.v.new.get(i, j, k);
                flux += rho_jm1 * v_jm1 * area_theta - rho_jp1 * v_jp1 * area_theta;
                let _ = r_mid_inner;
            }

            if dim.has_phi() {
                let d_theta = geom.d_theta[j.min(geom.d_theta.len() - 1)];
                let area_phi = azimuthal_face_area(r_inner, r_outer, d_theta, dim);
                let rho_kp1 = 0.5 * (d_old + state.d.old.get(i, j, k + 1));
                let rho_km1 = 0.5 * (d_old + state.d.old.get(i, j, k.saturating_sub(1)));
                let w_kp1 = state.w.new.get(i, j, k + 1);
                let w_km1 = state.w.new.get(i, j, k);
                flux += rho_km1 * w_km1 * area_phi - rho_kp1 * w_kp1 * area_phi;
            }

            let d_new = (v_old * d_old + dt_np1half * flux) / v_new;
            state.d.new.set(i, j, k, d_new);
        }
    }
}
