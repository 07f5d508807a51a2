//! Equation-of-state closure (§4.4): the gamma-law branch computed
//! in-crate, and the tabulated branch's Newton inversion of `E(T, rho)`
//! against the (out-of-scope, §6) table lookup service.

use crate::config::Parameters;
use crate::error::{warn, Result};
use crate::grid::field::Region;
use crate::state::GridState;

/// The tabulated-EOS lookup service of §6, consumed as an opaque
/// external collaborator. Bicubic interpolation against the model's opacity
/// and energy tables happens on the other side of this trait.
pub trait EosTable {
    /// `E(T, rho)` and `dT/dE|_rho` at the current iterate, used by the
    /// Newton step.
    fn e_and_dt_de(&self, t: f64, rho: f64) -> (f64, f64);

    /// Pressure, opacity, and adiabatic index at the converged `(T, rho)`.
    fn p_kappa_gamma(&self, t: f64, rho: f64) -> (f64, f64, f64);
}

/// Inverts `E(T, rho) = E_target` for `T` by Newton iteration (§4.4).
/// Returns the converged temperature, the iteration count used, and the
/// final relative residual; logs (does not fail on) non-convergence.
pub fn invert_temperature(
    table: &dyn EosTable,
    e_target: f64,
    rho: f64,
    t_guess: f64,
    tolerance: f64,
    max_iterations: u32,
    cell: (usize, usize, usize),
) -> (f64, u32, f64) {
    let mut t = t_guess;
    let mut relative_residual = f64::INFINITY;
    let mut iterations = 0;

    while iterations < max_iterations {
        let (e_current, dt_de) = table.e_and_dt_de(t, rho);
        let residual = e_target - e_current;
        relative_residual = (residual / e_target.abs().max(f64::MIN_POSITIVE)).abs();
        if relative_residual < tolerance {
            break;
        }
        t += residual * dt_de;
        iterations += 1;
    }

    if relative_residual >= tolerance {
        warn::eos_newton_not_converged(cell, relative_residual, max_iterations);
    }

    (t, iterations, relative_residual)
}

/// `calc_new_EOS_vars`, gamma-law branch: `P = (gamma - 1) rho E` directly;
/// `T`, `Kappa` are left untouched (unused in this branch per §4.4).
pub fn calc_new_eos_vars_gamma_law(state: &mut GridState, params: &Parameters) {
    let cells: Vec<_> = state.p.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let rho = state.d.new.get(i, j, k);
        let e = state.e.new.get(i, j, k);
        state.p.new.set(i, j, k, (params.gamma - 1.0) * rho * e);
        state.gamma.new.set(i, j, k, params.gamma);
    }
}

/// `calc_new_EOS_vars`, tabulated branch: recovers `T` from the new `D`, `E`
/// by Newton iteration, then looks up `P`, `Kappa`, `Gamma` (§4.4).
pub fn calc_new_eos_vars_tabulated(state: &mut GridState, table: &dyn EosTable, params: &Parameters) -> Result<()> {
    let cells: Vec<_> = state.p.new.indices(Region::Interior).collect();
    for (i, j, k) in cells {
        let rho = state.d.new.get(i, j, k);
        let e_target = state.e.new.get(i, j, k);
        let t_guess = state.t.old.get(i, j, k);

        let (t, _iterations, _residual) = invert_temperature(table, e_target, rho, t_guess, params.tolerance, params.max_iterations, (i, j, k));
        let (p, kappa, gamma) = table.p_kappa_gamma(t, rho);

        state.t.new.set(i, j, k, t);
        state.p.new.set(i, j, k, p);
        state.kappa.new.set(i, j, k, kappa);
        state.gamma.new.set(i, j, k, gamma);
    }
    Ok(())
}
