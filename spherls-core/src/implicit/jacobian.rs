//! Finite-difference Jacobian assembly (§4.7): one diagonal entry plus
//! up to six off-diagonals per row, each a one-sided finite-difference
//! derivative of the residual with respect to a neighbour's temperature.

use crate::config::{DerivativeType, ImplicitRow};
use crate::implicit::residual::{ImplicitContext, TemperatureField};
use rustc_hash::FxHashMap;

/// One assembled Jacobian row: the diagonal value, and `(local_column,
/// value)` pairs for every neighbour that is itself a Newton unknown (owned
/// by a row in this rank's [`crate::config::ImplicitPlan`]). A neighbour
/// that is not itself an implicit unknown (a fixed boundary value, or a
/// ghost cell outside this rank's marked subshell) contributes to the
/// residual already evaluated at `local_row` but needs no Jacobian column:
/// it is not one of Newton's free variables.
pub struct JacobianRow {
    /// Row index into the local dense system (`ImplicitRow::global_row`
    /// narrowed to this rank's own implicit rows, see `DESIGN.md`).
    pub local_row: usize,
    /// Diagonal entry `∂F_i/∂T_i`.
    pub diagonal: f64,
    /// Off-diagonal `(local_column, value)` pairs, one per neighbour that is
    /// also a Newton unknown.
    pub off_diagonals: Vec<(usize, f64)>,
    /// The residual value `F_i` at the current iterate (reused as `-b` when
    /// assembling the RHS, so the residual need not be recomputed twice).
    pub residual: f64,
}

/// Maps an implicit row's `(i, j, k)` to its position in the local dense
/// system, so neighbour lookups during Jacobian assembly can tell a Newton
/// unknown from a fixed boundary value.
#[must_use]
pub fn row_index_by_cell(rows: &[ImplicitRow]) -> FxHashMap<(usize, usize, usize), usize> {
    rows.iter().enumerate().map(|(local_row, row)| ((row.i, row.j, row.k), local_row)).collect()
}

/// The radial/angular offset(s) a [`DerivativeType`] perturbs, relative to
/// the row's own `(i, j, k)`. Folded types return both offsets; every other
/// type returns exactly one.
fn offsets_for(kind: DerivativeType) -> &'static [(isize, isize, isize)] {
    match kind {
        DerivativeType::Diagonal => &[(0, 0, 0)],
        DerivativeType::IPlus1 => &[(1, 0, 0)],
        DerivativeType::IMinus1 => &[(-1, 0, 0)],
        DerivativeType::JPlus1 => &[(0, 1, 0)],
        DerivativeType::JMinus1 => &[(0, -1, 0)],
        DerivativeType::JPlusMinusFolded => &[(0, 1, 0), (0, -1, 0)],
        DerivativeType::KPlus1 => &[(0, 0, 1)],
        DerivativeType::KMinus1 => &[(0, 0, -1)],
        DerivativeType::KPlusMinusFolded => &[(0, 0, 1), (0, 0, -1)],
    }
}

fn offset_cell(row: &ImplicitRow, offset: (isize, isize, isize)) -> (usize, usize, usize) {
    let apply = |base: usize, delta: isize| (base as isize + delta).max(0) as usize;
    (apply(row.i, offset.0), apply(row.j, offset.1), apply(row.k, offset.2))
}

/// Assembles one [`JacobianRow`] by perturbing each neighbour named in
/// `row.derivatives` by `ε · T_neighbour` and taking the one-sided
/// difference against the unperturbed residual (§4.7). Folded
/// derivative types sum both one-sided derivatives into a single column
/// (see `DESIGN.md`'s resolution of the corresponding Open Question).
pub fn assemble_jacobian_row(
    ctx: &ImplicitContext,
    row: &ImplicitRow,
    row_index: &FxHashMap<(usize, usize, usize), usize>,
    current_t: &TemperatureField,
    epsilon: f64,
    residual_fn: impl Fn(&ImplicitContext, &TemperatureField, usize, usize, usize) -> f64,
) -> JacobianRow {
    let f_current = residual_fn(ctx, current_t, row.i, row.j, row.k);
    let mut diagonal = 0.0;
    let mut off_diagonals = Vec::with_capacity(row.derivatives.len());

    for &kind in &row.derivatives {
        let offsets = offsets_for(kind);
        let mut combined = 0.0;
        let mut target_cell = None;

        for &offset in offsets {
            let (ti, tj, tk) = offset_cell(row, offset);
            let t_neighbor = current_t(ti, tj, tk);
            let step = epsilon * t_neighbor.abs().max(f64::MIN_POSITIVE);
            let perturbed = move |pi: usize, pj: usize, pk: usize| {
                if (pi, pj, pk) == (ti, tj, tk) {
                    t_neighbor + step
                } else {
                    current_t(pi, pj, pk)
                }
            };
            let f_perturbed = residual_fn(ctx, &perturbed, row.i, row.j, row.k);
            combined += (f_perturbed - f_current) / step;

            if offset != (0, 0, 0) {
                target_cell = Some((ti, tj, tk));
            }
        }

        if kind == DerivativeType::Diagonal {
            diagonal = combined;
        } else if let Some(cell) = target_cell {
            if let Some(&local_col) = row_index.get(&cell) {
                off_diagonals.push((local_col, combined));
            }
            // A neighbour outside this rank's implicit subshell is a fixed
            // boundary value, not a Newton unknown: its contribution is
            // already folded into `f_current` and needs no column.
        }
    }

    JacobianRow {
        local_row: row_index[&(row.i, row.j, row.k)],
        diagonal,
        off_diagonals,
        residual: f_current,
    }
}
