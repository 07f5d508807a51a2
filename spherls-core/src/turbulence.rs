//! Subgrid turbulence closure (component C5, §4.5): constant-coefficient
//! and Smagorinsky eddy viscosity, run once per step before the velocity and
//! energy updates.

use crate::config::{Diagnostics, Parameters};
use crate::grid::field::Region;
use crate::grid::geometry::{cell_volume, GeometricFactors};
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// `calc_new_eddy_viscosity`, constant-coefficient branch:
/// `mu_t = C * L^2 * max_convective_velocity * 1e-6`, `L` the cube root of
/// the local cell volume (or its 1D/2D simplification).
pub fn calc_new_eddy_viscosity_constant(state: &mut GridState, params: &Parameters, diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality) {
    let cells: Vec<_> = state.eddy_visc.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let r_inner = state.r.new.get(i, j, k);
        let r_outer = state.r.new.get(i + 1, j, k);
        let vol = cell_volume(r_inner, r_outer, geom, j, dim);
        let length = vol.max(0.0).cbrt();
        let mu_t = params.eddy_viscosity_c * length * length * diag.max_convective_velocity * 1e-6;
        state.eddy_visc.new.set(i, j, k, mu_t);
    }
}

/// `calc_new_eddy_viscosity`, Smagorinsky branch:
/// `mu_t = C^2 / sqrt(2) * L^2 * rho * |S|`, with `|S|^2` the sum of
/// strain-rate-tensor component-squared terms (one in 1D: `s_rr`; four in
/// 2D: adding `s_theta_theta` and twice `s_r_theta`; nine in 3D: adding
/// `s_phi_phi` and twice each of `s_r_phi`, `s_theta_phi`, per §4.5).
pub fn calc_new_eddy_viscosity_smagorinsky(state: &mut GridState, params: &Parameters, geom: &GeometricFactors, dim: Dimensionality) {
    let cells: Vec<_> = state.eddy_visc.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let r_inner = state.r.new.get(i, j, k);
        let r_outer = state.r.new.get(i + 1, j, k);
        let vol = cell_volume(r_inner, r_outer, geom, j, dim);
        let length = vol.max(0.0).cbrt();
        let r_mid = 0.5 * (r_inner + r_outer).max(f64::MIN_POSITIVE);

        let du_dr = (state.u.new.get(i + 1, j, k) - state.u.new.get(i, j, k)) / (r_outer - r_inner).max(f64::EPSILON);
        let mut s_squared = du_dr * du_dr;

        if dim.has_theta() {
            let d_theta = geom.d_theta[j.min(geom.d_theta.len().saturating_sub(1))];
            let dv_dtheta = (state.v.new.get(i, j + 1, k) - state.v.new.get(i, j, k)) / d_theta.max(f64::EPSILON);
            let v_over_r = state.v.new.get(i, j, k) / r_mid;
            let s_theta_theta = dv_dtheta / r_mid + v_over_r;
            let du_dtheta = (state.u.new.get(i, j + 1, k) - state.u.new.get(i, j.saturating_sub(1), k)) / (2.0 * d_theta.max(f64::EPSILON));
            let dv_dr = (state.v.new.get(i + 1, j, k) - state.v.new.get(i, j, k)) / (r_outer - r_inner).max(f64::EPSILON);
            let s_r_theta = 0.5 * (du_dtheta / r_mid + dv_dr - v_over_r);
            s_squared += s_theta_theta * s_theta_theta + 2.0 * s_r_theta * s_r_theta;
        }

        if dim.has_phi() {
            let d_phi = geom.d_phi[k.min(geom.d_phi.len().saturating_sub(1))];
            let sin_theta = geom.sin_theta_center[j.min(geom.sin_theta_center.len().saturating_sub(1))].max(f64::EPSILON);
            let w_here = state.w.new.get(i, j, k);
            let dw_dphi = (state.w.new.get(i, j, k + 1) - w_here) / d_phi.max(f64::EPSILON);
            let w_term = w_here / r_mid;
            let s_phi_phi = dw_dphi / (r_mid * sin_theta) + w_term;
            s_squared += s_phi_phi * s_phi_phi;

            let du_dphi = (state.u.new.get(i, j, k + 1) - state.u.new.get(i, j, k.saturating_sub(1))) / (2.0 * d_phi.max(f64::EPSILON));
            let dw_dr = (state.w.new.get(i + 1, j, k) - w_here) / (r_outer - r_inner).max(f64::EPSILON);
            let s_r_phi = 0.5 * (du_dphi / (r_mid * sin_theta) + dw_dr - w_term);
            s_squared += 2.0 * s_r_phi * s_r_phi;

            let d_theta = geom.d_theta[j.min(geom.d_theta.len().saturating_sub(1))];
            let cot_theta = geom.cot_theta_center[j.min(geom.cot_theta_center.len().saturating_sub(1))];
            let dv_dphi = (state.v.new.get(i, j, k + 1) - state.v.new.get(i, j, k.saturating_sub(1))) / (2.0 * d_phi.max(f64::EPSILON));
            let dw_dtheta = (state.w.new.get(i, j + 1, k) - w_here) / d_theta.max(f64::EPSILON);
            let s_theta_phi = 0.5 * (dv_dphi / (r_mid * sin_theta) + dw_dtheta / r_mid - w_term * cot_theta);
            s_squared += 2.0 * s_theta_phi * s_theta_phi;
        }

        let rho = state.d.new.get(i, j, k);
        let c = params.eddy_viscosity_c;
        let mu_t = c * c / std::f64::consts::SQRT_2 * length * length * rho * s_squared.max(0.0).sqrt();
        state.eddy_visc.new.set(i, j, k, mu_t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EosKind, FeatureFlags, TurbulenceModel};

    fn params() -> Parameters {
        Parameters {
            gamma: 5.0 / 3.0,
            g: 0.0,
            sigma: 1.0,
            pi: std::f64::consts::PI,
            alpha: 0.5,
            alpha_extra: 0.0,
            eddy_viscosity_c: 0.1,
            av_threshold: 0.1,
            turbulent_prandtl: 1.0,
            eos: EosKind::GammaLaw,
            is_adiabatic: true,
            turbulence_model: TurbulenceModel::Constant,
            tolerance: 1e-6,
            max_iterations: 20,
            feature_flags: FeatureFlags::default(),
        }
    }

    #[test]
    fn zero_convective_velocity_gives_zero_constant_eddy_viscosity() {
        let mut state = GridState::allocate(3, 0, 0, Dimensionality::OneD, false);
        for i in 0..=3 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
        }
        let geom = GeometricFactors::default();
        let diag = Diagnostics::default();
        calc_new_eddy_viscosity_constant(&mut state, &params(), &diag, &geom, Dimensionality::OneD);
        for i in 0..3 {
            assert_eq!(state.eddy_visc.new.get(i, 0, 0), 0.0);
        }
    }

    #[test]
    fn uniform_radial_velocity_gives_zero_smagorinsky_strain() {
        let mut state = GridState::allocate(3, 0, 0, Dimensionality::OneD, false);
        for i in 0..=3 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
            state.u.new.set(i, 0, 0, 0.5);
        }
        for i in 0..3 {
            state.d.new.set(i, 0, 0, 1.0);
        }
        let geom = GeometricFactors::default();
        calc_new_eddy_viscosity_smagorinsky(&mut state, &params(), &geom, Dimensionality::OneD);
        for i in 0..3 {
            assert_eq!(state.eddy_visc.new.get(i, 0, 0), 0.0);
        }
    }

    #[test]
    fn phi_cross_shear_alone_produces_nonzero_3d_strain() {
        // Every diagonal and theta-cross term is built to vanish at the
        // evaluated cell (u, v, and w at (0,0,0)/(0,0,1) are all zero): only
        // w's radial and polar neighbours are nonzero, so any eddy viscosity
        // here can only have come from s_r_phi/s_theta_phi.
        let mut state = GridState::allocate(1, 1, 2, Dimensionality::ThreeD, false);
        state.r.new.set(0, 0, 0, 1.0);
        state.r.new.set(1, 0, 0, 2.0);
        state.d.new.set(0, 0, 0, 1.0);
        state.w.new.set(1, 0, 0, 2.0);
        state.w.new.set(0, 1, 0, 2.0);

        let geom = GeometricFactors::precompute(&[0.1, 1.0], &[0.0, 1.0, 2.0], Dimensionality::ThreeD);
        calc_new_eddy_viscosity_smagorinsky(&mut state, &params(), &geom, Dimensionality::ThreeD);
        assert!(state.eddy_visc.new.get(0, 0, 0) > 0.0);
    }
}
