//! Momentum updates `calc_new_U`/`calc_new_V`/`calc_new_W` (§4.3):
//! advection, pressure-gradient/artificial-viscosity source, monopole
//! gravity (radial only), and an LES viscous-stress-divergence term.

use crate::config::{Diagnostics, Parameters};
use crate::grid::field::Region;
use crate::grid::geometry::GeometricFactors;
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// Blends a centered and an upwind one-sided difference by the donor
/// fraction published in [`Diagnostics::donor_fraction`] (§4.3).
fn hybrid_gradient(upwind: f64, central: f64, donor_fraction: f64) -> f64 {
    (1.0 - donor_fraction) * central + donor_fraction * upwind
}

/// `calc_new_U`: radial momentum. Interior cells only — the surface ghost
/// value is fixed to `U0` by [`crate::grid_motion::finish_u0_sweep`]-style
/// boundary handling, not recomputed here.
pub fn calc_new_u(state: &mut GridState, params: &Parameters, diag: &Diagnostics, dt_np1half: f64) {
    let cells: Vec<_> = state.u.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        if i == 0 {
            continue; // innermost interface: U is a boundary value, not evolved here.
        }
        let rho_face = 0.5 * (state.d.new.get(i - 1, j, k) + state.d.new.get(i, j, k));
        let u_here = state.u.old.get(i, j, k);
        let u_outer = state.u.old.get(i + 1, j, k);
        let u_inner = state.u.old.get(i.saturating_sub(1), j, k);

        let central = 0.5 * (u_outer - u_inner);
        let upwind = if u_here >= 0.0 { u_here - u_inner } else { u_outer - u_here };
        let advection = hybrid_gradient(upwind, central, diag.donor_fraction);

        let dm = state.dm.new.get(i - 1, j, k).max(f64::MIN_POSITIVE);
        let p_outer = state.p.new.get(i, j, k) + state.q0.new.get(i, j, k);
        let p_inner = state.p.new.get(i - 1, j, k) + state.q0.new.get(i - 1, j, k);
        let pressure_source = -(p_outer - p_inner) / dm;

        let r = state.r.new.get(i, j, k).max(f64::MIN_POSITIVE);
        let m_enc = state.m.new.get(i, j, k);
        let gravity = -params.g * m_enc / (r * r);

        let viscous = eddy_stress_u(state, i, j, k);

        let u_new = u_here + dt_np1half * (-u_here * advection / r.max(f64::MIN_POSITIVE) + pressure_source / rho_face.max(f64::MIN_POSITIVE) + gravity + viscous);
        state.u.new.set(i, j, k, u_new);
    }
}

/// `calc_new_V`: polar momentum, active only at 2D/3D.
pub fn calc_new_v(state: &mut GridState, diag: &Diagnostics, dim: Dimensionality, dt_np1half: f64) {
    if !dim.has_theta() {
        return;
    }
    let cells: Vec<_> = state.v.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        if j == 0 {
            continue;
        }
        let v_here = state.v.old.get(i, j, k);
        let v_outer = state.v.old.get(i, j + 1, k);
        let v_inner = state.v.old.get(i, j.saturating_sub(1), k);
        let central = 0.5 * (v_outer - v_inner);
        let upwind = if v_here >= 0.0 { v_here - v_inner } else { v_outer - v_here };
        let advection = hybrid_gradient(upwind, central, diag.donor_fraction);

        let r = state.r.new.get(i, j, k).max(f64::MIN_POSITIVE);
        let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
        let p_outer = state.p.new.get(i, j, k) + state.q1.new.get(i, j, k);
        let p_inner = state.p.new.get(i, j.saturating_sub(1), k) + state.q1.new.get(i, j.saturating_sub(1), k);
        let pressure_source = -(p_outer - p_inner) / (r * rho);

        let viscous = eddy_stress_v(state, i, j, k);

        state.v.new.set(i, j, k, v_here + dt_np1half * (pressure_source - v_here * advection / r + viscous));
    }
}

/// `calc_new_W`: azimuthal momentum, active only at 3D.
pub fn calc_new_w(state: &mut GridState, diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality, dt_np1half: f64) {
    if !dim.has_phi() {
        return;
    }
    let cells: Vec<_> = state.w.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        if k == 0 {
            continue;
        }
        let w_here = state.w.old.get(i, j, k);
        let w_outer = state.w.old.get(i, j, k + 1);
        let w_inner = state.w.old.get(i, j, k.saturating_sub(1));
        let central = 0.5 * (w_outer - w_inner);
        let upwind = if w_here >= 0.0 { w_here - w_inner } else { w_outer - w_here };
        let advection = hybrid_gradient(upwind, central, diag.donor_fraction);

        let r = state.r.new.get(i, j, k).max(f64::MIN_POSITIVE);
        // The azimuthal ring radius at cell j is `r * sin(theta)`; falls back to 1
        // (a flat-equator approximation) when the precomputed table is empty, e.g.
        // a test fixture built without `GeometricFactors::precompute`.
        let sin_theta = geom.sin_theta_center.get(j).copied().unwrap_or(1.0).max(f64::MIN_POSITIVE);
        let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
        let p_outer = state.p.new.get(i, j, k) + state.q2.new.get(i, j, k);
        let p_inner = state.p.new.get(i, j, k.saturating_sub(1)) + state.q2.new.get(i, j, k.saturating_sub(1));
        let pressure_source = -(p_outer - p_inner) / (r * sin_theta * rho);

        let viscous = eddy_stress_w(state, i, j, k);

        state.w.new.set(i, j, k, w_here + dt_np1half * (pressure_source - w_here * advection / r + viscous));
    }
}

/// Simplified LES viscous-stress-divergence terms for the three momentum
/// equations: a Laplacian-like diffusion of the respective velocity
/// component along its own direction, weighted by the local eddy viscosity,
/// in the spirit of the stress-tensor divergence of §4.3 without expanding
/// the full nine-term spherical stress tensor.
fn eddy_stress_u(state: &GridState, i: usize, j: usize, k: usize) -> f64 {
    let nu = state.eddy_visc.new.get(i.min(state.eddy_visc.new.extent().r.end.saturating_sub(1)), j, k);
    if nu == 0.0 {
        return 0.0;
    }
    let u_outer = state.u.old.get(i + 1, j, k);
    let u_here = state.u.old.get(i, j, k);
    let u_inner = state.u.old.get(i.saturating_sub(1), j, k);
    nu * (u_outer - 2.0 * u_here + u_inner)
}

fn eddy_stress_v(state: &GridState, i: usize, j: usize, k: usize) -> f64 {
    let nu = state.eddy_visc.new.get(i, j.min(state.eddy_visc.new.extent().theta.end.saturating_sub(1)), k);
    if nu == 0.0 {
        return 0.0;
    }
    let v_outer = state.v.old.get(i, j + 1, k);
    let v_here = state.v.old.get(i, j, k);
    let v_inner = state.v.old.get(i, j.saturating_sub(1), k);
    nu * (v_outer - 2.0 * v_here + v_inner)
}

fn eddy_stress_w(state: &GridState, i: usize, j: usize, k: usize) -> f64 {
    let nu = state.eddy_visc.new.get(i, j, k.min(state.eddy_visc.new.extent().phi.end.saturating_sub(1)));
    if nu == 0.0 {
        return 0.0;
    }
    let w_outer = state.w.old.get(i, j, k + 1);
    let w_here = state.w.old.get(i, j, k);
    let w_inner = state.w.old.get(i, j, k.saturating_sub(1));
    nu * (w_outer - 2.0 * w_here + w_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag() -> Diagnostics {
        Diagnostics::default()
    }

    #[test]
    fn zero_timestep_leaves_velocities_unchanged() {
        let mut state = GridState::allocate(4, 0, 0, Dimensionality::OneD, false);
        for i in 0..=4 {
            state.u.old.set(i, 0, 0, 0.3);
            state.u.new.set(i, 0, 0, 0.3);
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
        }
        for i in 0..4 {
            state.d.new.set(i, 0, 0, 1.0);
            state.dm.new.set(i, 0, 0, 1.0);
        }
        let params = Parameters {
            gamma: 5.0 / 3.0,
            g: 0.0,
            sigma: 1.0,
            pi: std::f64::consts::PI,
            alpha: 0.5,
            alpha_extra: 0.0,
            eddy_viscosity_c: 0.0,
            av_threshold: 0.1,
            turbulent_prandtl: 1.0,
            eos: crate::config::EosKind::GammaLaw,
            is_adiabatic: true,
            turbulence_model: crate::config::TurbulenceModel::None,
            tolerance: 1e-6,
            max_iterations: 20,
            feature_flags: crate::config::FeatureFlags::default(),
        };
        calc_new_u(&mut state, &params, &diag(), 0.0);
        for i in 1..4 {
            assert_eq!(state.u.new.get(i, 0, 0), 0.3);
        }
    }

    #[test]
    fn innermost_interface_is_left_untouched() {
        let mut state = GridState::allocate(4, 0, 0, Dimensionality::OneD, false);
        state.u.new.set(0, 0, 0, 9.9);
        let params = Parameters {
            gamma: 5.0 / 3.0,
            g: 0.0,
            sigma: 1.0,
            pi: std::f64::consts::PI,
            alpha: 0.5,
            alpha_extra: 0.0,
            eddy_viscosity_c: 0.0,
            av_threshold: 0.1,
            turbulent_prandtl: 1.0,
            eos: crate::config::EosKind::GammaLaw,
            is_adiabatic: true,
            turbulence_model: crate::config::TurbulenceModel::None,
            tolerance: 1e-6,
            max_iterations: 20,
            feature_flags: crate::config::FeatureFlags::default(),
        };
        calc_new_u(&mut state, &params, &diag(), 0.1);
        assert_eq!(state.u.new.get(0, 0, 0), 9.9);
    }

    #[test]
    fn nonzero_eddy_viscosity_diffuses_v() {
        let mut state = GridState::allocate(2, 4, 0, Dimensionality::TwoD, false);
        for i in 0..2 {
            for j in 0..=4 {
                state.r.new.set(i, j, 0, 2.0);
                state.v.old.set(i, j, 0, if j == 2 { 1.0 } else { 0.0 });
            }
            for j in 0..4 {
                state.d.new.set(i, j, 0, 1.0);
                state.p.new.set(i, j, 0, 1.0);
                state.eddy_visc.new.set(i, j, 0, 0.5);
            }
        }
        calc_new_v(&mut state, &diag(), Dimensionality::TwoD, 1.0);
        // The Laplacian-like viscous term damps the spike at j = 2 and spreads
        // it onto its neighbours, so it must no longer sit at the bare 1.0
        // the advection/pressure terms alone would leave it at.
        assert!(state.v.new.get(0, 2, 0) < 1.0);
        assert!(state.v.new.get(0, 1, 0) > 0.0);
    }

    #[test]
    fn nonzero_eddy_viscosity_diffuses_w() {
        let mut state = GridState::allocate(2, 1, 4, Dimensionality::ThreeD, false);
        let geom = GeometricFactors::default();
        for i in 0..2 {
            for k in 0..=4 {
                state.r.new.set(i, 0, k, 2.0);
                state.w.old.set(i, 0, k, if k == 2 { 1.0 } else { 0.0 });
            }
            for k in 0..4 {
                state.d.new.set(i, 0, k, 1.0);
                state.p.new.set(i, 0, k, 1.0);
                state.eddy_visc.new.set(i, 0, k, 0.5);
            }
        }
        calc_new_w(&mut state, &diag(), &geom, Dimensionality::ThreeD, 1.0);
        assert!(state.w.new.get(0, 0, 2) < 1.0);
        assert!(state.w.new.get(0, 0, 1) > 0.0);
    }
}
