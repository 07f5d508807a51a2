//! `implicit_energy_residual` / `implicit_energy_residual_surface`
//! (§4.7): the discretised energy equation evaluated at a Newton iterate,
//! shared with the explicit [`crate::energy::calc_new_e`] update's
//! transport and diffusion terms so the two solves stay consistent at the
//! explicit/implicit boundary.

use crate::config::Parameters;
use crate::energy::{face_opacity, radiative_flux, EosTable};
use crate::grid::geometry::{cell_volume, radial_face_area, GeometricFactors};
use crate::grid::topology::Dimensionality;
use crate::state::GridState;

/// Everything the residual function needs besides the Newton iterate's `T`
/// values, which are supplied separately (as a closure) so the Jacobian can
/// re-evaluate the same residual with one cell perturbed without cloning
/// the grid state.
pub struct ImplicitContext<'a> {
    /// Grid state at the start of the implicit correction (after the
    /// explicit substeps of §2 have already run).
    pub state: &'a GridState,
    /// Bound physical constants and switches.
    pub params: &'a Parameters,
    /// Precomputed angular geometry.
    pub geom: &'a GeometricFactors,
    /// This rank's evolved dimensionality.
    pub dim: Dimensionality,
    /// The tabulated-EOS lookup service (opaque, §6).
    pub table: &'a dyn EosTable,
    /// Full-step size `Δt_n` the residual is time-centered against.
    pub dt: f64,
}

/// Reads a Newton-iterate temperature at `(i, j, k)`, honouring whatever
/// perturbation the Jacobian assembly has applied.
pub type TemperatureField<'a> = dyn Fn(usize, usize, usize) -> f64 + 'a;

fn div_u_rel(ctx: &ImplicitContext, i: usize, j: usize, k: usize, v_cell: f64) -> f64 {
    let state = ctx.state;
    let r_inner = state.r.new.get(i, j, k);
    let r_outer = state.r.new.get(i + 1, j, k);
    let u_outer = state.u.new.get(i + 1, j, k) - state.u0.new.get(i + 1, 0, 0);
    let u_inner = state.u.new.get(i, j, k) - state.u0.new.get(i, 0, 0);
    let area_outer = radial_face_area(r_outer, ctx.geom, j, ctx.dim);
    let area_inner = radial_face_area(r_inner, ctx.geom, j, ctx.dim);
    (u_outer * area_outer - u_inner * area_inner) / v_cell
}

/// `implicit_energy_residual`: `F(T_ijk, T_neighbours)` for an interior
/// implicit cell (§4.7).
///
/// ```text
/// F = (E(T_new) - E_old)/dt + advection + P/rho * div(u_rel) + radiative diffusion [+ LES]
/// ```
pub fn implicit_energy_residual(ctx: &ImplicitContext, t_field: &TemperatureField, i: usize, j: usize, k: usize) -> f64 {
    let state = ctx.state;
    let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
    let t_here = t_field(i, j, k);
    let (e_new, _dt_de) = ctx.table.e_and_dt_de(t_here, rho);
    let e_old = state.e.old.get(i, j, k);

    let r_inner = state.r.new.get(i, j, k);
    let r_outer = state.r.new.get(i + 1, j, k);
    let v_cell = cell_volume(r_inner, r_outer, ctx.geom, j, ctx.dim).max(f64::MIN_POSITIVE);

    let (p_here, kappa_here, _gamma_here) = ctx.table.p_kappa_gamma(t_here, rho);
    let div = div_u_rel(ctx, i, j, k, v_cell);
    let mut rhs = -(p_here / rho) * div;

    let t_outer = t_field(i + 1, j, k);
    let t_inner = t_field(i.saturating_sub(1), j, k);
    let rho_outer = state.d.new.get(i + 1, j, k).max(f64::MIN_POSITIVE);
    let rho_inner = state.d.new.get(i.saturating_sub(1), j, k).max(f64::MIN_POSITIVE);

    let (_, kappa_outer, _) = ctx.table.p_kappa_gamma(t_outer, rho_outer);
    let (_, kappa_inner, _) = ctx.table.p_kappa_gamma(t_inner, rho_inner);

    let t4_here = t_here.powi(4);
    let t4_outer = t_outer.powi(4);
    let t4_inner = t_inner.powi(4);

    let rho_face_outer = 0.5 * (rho + rho_outer);
    let rho_face_inner = 0.5 * (rho + rho_inner);
    let kappa_face_outer = face_opacity(t4_here, t4_outer, kappa_here, kappa_outer);
    let kappa_face_inner = face_opacity(t4_inner, t4_here, kappa_inner, kappa_here);

    let area_outer = radial_face_area(r_outer, ctx.geom, j, ctx.dim);
    let area_inner = radial_face_area(r_inner, ctx.geom, j, ctx.dim);
    let r_inner_prev = state.r.new.get(i.saturating_sub(1), j, k).min(r_inner);

    let flux_outer = radiative_flux(r_outer, rho_face_outer, kappa_face_outer, t4_here, t4_outer, r_outer - r_inner, ctx.params.sigma, ctx.params.pi);
    let flux_inner = radiative_flux(r_inner, rho_face_inner, kappa_face_inner, t4_inner, t4_here, r_inner - r_inner_prev, ctx.params.sigma, ctx.params.pi);

    let diffusion = (flux_outer * area_outer - flux_inner * area_inner) / (rho * v_cell);
    rhs -= diffusion;

    if !matches!(ctx.params.turbulence_model, crate::config::TurbulenceModel::None) {
        let nu_t = state.eddy_visc.new.get(i, j, k);
        let conductive = nu_t / ctx.params.turbulent_prandtl * (t4_outer.powf(0.25) - 2.0 * t4_here.powf(0.25) + t4_inner.powf(0.25));
        rhs += conductive;
    }

    (e_new - e_old) / ctx.dt.max(f64::EPSILON) - rhs
}

/// `implicit_energy_residual_surface`: the outermost implicit cell's
/// residual, replacing the interpolated outer radiative flux with the
/// Stefan–Boltzmann outflow boundary condition (§4.4, §4.7).
pub fn implicit_energy_residual_surface(ctx: &ImplicitContext, t_field: &TemperatureField, i: usize, j: usize, k: usize) -> f64 {
    let state = ctx.state;
    let rho = state.d.new.get(i, j, k).max(f64::MIN_POSITIVE);
    let t_here = t_field(i, j, k);
    let (e_new, _dt_de) = ctx.table.e_and_dt_de(t_here, rho);
    let e_old = state.e.old.get(i, j, k);

    let r_inner = state.r.new.get(i, j, k);
    let r_outer = state.r.new.get(i + 1, j, k);
    let v_cell = cell_volume(r_inner, r_outer, ctx.geom, j, ctx.dim).max(f64::MIN_POSITIVE);

    let (p_here, kappa_here, _gamma_here) = ctx.table.p_kappa_gamma(t_here, rho);
    let div = div_u_rel(ctx, i, j, k, v_cell);
    let mut rhs = -(p_here / rho) * div;

    let t_inner = t_field(i.saturating_sub(1), j, k);
    let rho_inner = state.d.new.get(i.saturating_sub(1), j, k).max(f64::MIN_POSITIVE);
    let (_, kappa_inner, _) = ctx.table.p_kappa_gamma(t_inner, rho_inner);

    let t4_here = t_here.powi(4);
    let t4_inner = t_inner.powi(4);
    let rho_face_inner = 0.5 * (rho + rho_inner);
    let kappa_face_inner = face_opacity(t4_inner, t4_here, kappa_inner, kappa_here);

    let area_outer = radial_face_area(r_outer, ctx.geom, j, ctx.dim);
    let area_inner = radial_face_area(r_inner, ctx.geom, j, ctx.dim);
    let r_inner_prev = state.r.new.get(i.saturating_sub(1), j, k).min(r_inner);

    // Stefan-Boltzmann radiative outflow (§4.4): flux_{i+1/2} = -3/(8 pi) * R^2 * T^4.
    let flux_outer = -3.0 / (8.0 * ctx.params.pi) * r_outer * r_outer * t4_here;
    let flux_inner = radiative_flux(r_inner, rho_face_inner, kappa_face_inner, t4_inner, t4_here, r_inner - r_inner_prev, ctx.params.sigma, ctx.params.pi);

    let diffusion = (flux_outer * area_outer - flux_inner * area_inner) / (rho * v_cell);
    rhs -= diffusion;

    (e_new - e_old) / ctx.dt.max(f64::EPSILON) - rhs
}
