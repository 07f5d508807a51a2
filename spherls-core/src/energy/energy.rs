//! `calc_new_E_*` (§4.4): the energy equation, with an optional
//! Rosseland flux-limited radiative-diffusion term and an optional LES
//! eddy-conductivity term.

use crate::config::{Diagnostics, Parameters};
use crate::grid::field::Region;
use crate::grid::geometry::{cell_volume, radial_face_area, GeometricFactors};
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// Harmonic-mean-weighted face opacity, weighted by `T^4` (§4.4): the
/// correct interpolation for optically-thin/thick transitions, unlike a
/// plain arithmetic mean.
pub(crate) fn face_opacity(t4_inner: f64, t4_outer: f64, kappa_inner: f64, kappa_outer: f64) -> f64 {
    let denom = t4_inner / kappa_inner.max(f64::MIN_POSITIVE) + t4_outer / kappa_outer.max(f64::MIN_POSITIVE);
    if denom <= 0.0 {
        return 0.0;
    }
    (t4_inner + t4_outer) / denom
}

/// Rosseland flux-limited diffusive flux through the radial face at `r`
/// (§4.4): `-(16 pi^2 rho r^4 / 3 sigma) * (1/(kappa rho)) * dT^4/dr`.
pub(crate) fn radiative_flux(r: f64, rho_face: f64, kappa_face: f64, t4_inner: f64, t4_outer: f64, dr: f64, sigma: f64, pi: f64) -> f64 {
    if dr.abs() < f64::EPSILON || kappa_face <= 0.0 {
        return 0.0;
    }
    let coefficient = 16.0 * pi * pi * rho_face * r.powi(4) / (3.0 * sigma);
    -(coefficient / (kappa_face * rho_face)) * (t4_outer - t4_inner) / dr
}

/// `calc_new_E`: advances specific internal energy in every owned cell.
/// Adiabatic runs (`params.is_adiabatic`) skip the radiative-diffusion term
/// entirely; LES runs (`params.turbulence_model != None`) add an
/// eddy-conductivity term scaled by the turbulent Prandtl number.
pub fn calc_new_e(state: &mut GridState, params: &Parameters, diag: &Diagnostics, geom: &GeometricFactors, dim: Dimensionality, dt_n: f64) {
    let cells: Vec<_> = state.e.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let e_old = state.e.old.get(i, j, k);
        let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
        let p = state.p.old.get(i, j, k);

        let r_inner = state.r.new.get(i, j, k);
        let r_outer = state.r.new.get(i + 1, j, k);
        let v_cell = cell_volume(r_inner, r_outer, geom, j, dim).max(f64::MIN_POSITIVE);

        let u_outer = state.u.new.get(i + 1, j, k) - state.u0.new.get(i + 1, 0, 0);
        let u_inner = state.u.new.get(i, j, k) - state.u0.new.get(i, 0, 0);
        let area_outer = radial_face_area(r_outer, geom, j, dim);
        let area_inner = radial_face_area(r_inner, geom, j, dim);
        let div_u_rel = (u_outer * area_outer - u_inner * area_inner) / v_cell;

        let e_here = state.e.old.get(i, j, k);
        let e_outer_index = (i + 1).min(state.e.old.extent().r.end.saturating_sub(1));
        let e_outer = state.e.old.get(e_outer_index, j, k);
        let e_inner = state.e.old.get(i.saturating_sub(1), j, k);
        let central = 0.5 * (e_outer - e_inner);
        let u_mid = 0.5 * (u_outer + u_inner);
        let upwind = if u_mid >= 0.0 { e_here - e_inner } else { e_outer - e_here };
        let advection = u_mid * ((1.0 - diag.donor_fraction) * central + diag.donor_fraction * upwind);

        let mut rhs = -advection - (p / rho) * div_u_rel;

        if params.feature_flags.viscous_energy_eq {
            let q_outer = state.q0.new.get(i, j, k);
            rhs -= (q_outer / rho) * div_u_rel;
        }

        if !params.is_adiabatic {
            let t_here = state.t.old.get(i, j, k);
            let t_outer = state.t.old.get(i + 1, j, k);
            let t_inner = state.t.old.get(i.saturating_sub(1), j, k);
            let kappa_here = state.kappa.old.get(i, j, k);
            let kappa_outer = state.kappa.old.get(i + 1, j, k);
            let kappa_inner = state.kappa.old.get(i.saturating_sub(1), j, k);

            let t4_here = t_here.powi(4);
            let t4_outer = t_outer.powi(4);
            let t4_inner = t_inner.powi(4);

            let rho_outer_face = 0.5 * (rho + state.d.new.get(i + 1, j, k));
            let rho_inner_face = 0.5 * (rho + state.d.new.get(i.saturating_sub(1), j, k));

            let kappa_face_outer = face_opacity(t4_here, t4_outer, kappa_here, kappa_outer);
            let kappa_face_inner = face_opacity(t4_inner, t4_here, kappa_inner, kappa_here);

            let flux_outer = if i + 1 == state.e.new.extent().r.end {
                // Surface-boundary ghost: radiative flux-out (Stefan-Boltzmann outflow).
                -3.0 / (8.0 * params.pi) * r_outer * r_outer * t4_here
            } else {
                radiative_flux(r_outer, rho_outer_face, kappa_face_outer, t4_here, t4_outer, r_outer - r_inner, params.sigma, params.pi)
            };
            let flux_inner = radiative_flux(r_inner, rho_inner_face, kappa_face_inner, t4_inner, t4_here, r_inner - state.r.new.get(i.saturating_sub(1), j, k).min(r_inner), params.sigma, params.pi);

            let diffusion = (flux_outer * area_outer - flux_inner * area_inner) / (rho * v_cell);
            rhs -= diffusion;

            if !matches!(params.turbulence_model, crate::config::TurbulenceModel::None) {
                let nu_t = state.eddy_visc.new.get(i, j, k);
                let conductive = nu_t / params.turbulent_prandtl * (t_outer - 2.0 * t_here + t_inner);
                rhs += conductive;
            }
        }

        state.e.new.set(i, j, k, e_old + dt_n * rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EosKind, FeatureFlags, TurbulenceModel};

    fn params(is_adiabatic: bool) -> Parameters {
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
            eos: if is_adiabatic { EosKind::GammaLaw } else { EosKind::Tabulated },
            is_adiabatic,
            turbulence_model: TurbulenceModel::None,
            tolerance: 1e-6,
            max_iterations: 20,
            feature_flags: FeatureFlags::default(),
        }
    }

    #[test]
    fn zero_velocity_adiabatic_state_is_unchanged() {
        let mut state = GridState::allocate(4, 0, 0, Dimensionality::OneD, false);
        for i in 0..=4 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
        }
        for i in 0..4 {
            state.d.new.set(i, 0, 0, 1.0);
            state.e.old.set(i, 0, 0, 2.0);
            state.e.new.set(i, 0, 0, 2.0);
            state.p.old.set(i, 0, 0, 1.0);
        }
        let geom = GeometricFactors::default();
        let diag = Diagnostics::default();
        calc_new_e(&mut state, &params(true), &diag, &geom, Dimensionality::OneD, 0.1);
        for i in 0..4 {
            assert!((state.e.new.get(i, 0, 0) - 2.0).abs() < 1e-10);
        }
    }

    #[test]
    fn zero_timestep_is_identity() {
        let mut state = GridState::allocate(4, 0, 0, Dimensionality::OneD, false);
        for i in 0..=4 {
            state.r.new.set(i, 0, 0, 1.0 + i as f64);
            state.u.new.set(i, 0, 0, 0.5);
        }
        for i in 0..4 {
            state.d.new.set(i, 0, 0, 1.0);
            state.e.old.set(i, 0, 0, 2.0);
            state.e.new.set(i, 0, 0, 2.0);
            state.p.old.set(i, 0, 0, 1.0);
        }
        let geom = GeometricFactors::default();
        let diag = Diagnostics::default();
        calc_new_e(&mut state, &params(true), &diag, &geom, Dimensionality::OneD, 0.0);
        for i in 0..4 {
            assert!((state.e.new.get(i, 0, 0) - 2.0).abs() < 1e-10);
        }
    }
}
