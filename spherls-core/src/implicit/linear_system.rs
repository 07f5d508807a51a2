//! The abstract distributed sparse matrix / Krylov solver service of
//! §6 and §9: `{assemble_row, assemble_rhs, solve,
//! scatter_to_local}`. Implemented here with `faer` for the local
//! dense/sparse-row storage and a hand-rolled restarted GMRES whose dot
//! products and norms are combined across ranks via
//! [`Exchange::all_reduce_sum`] — PETSc's `KSP` substituted per §9 ("a
//! portable implementation may ... substitute any equivalent
//! distributed-linear-algebra library").
//!
//! Row ownership is block-row-distributed: each rank assembles only the
//! rows of its own [`crate::config::ImplicitPlan`]; a Jacobian entry whose
//! column belongs to another rank's unknown does not appear here (§4.7's
//! neighbour stencil never reaches past one ghost layer, so such
//! coupling is resolved by the ordinary ghost-exchange of `T` before
//! assembly, not by an explicit off-process matrix entry — see
//! `DESIGN.md`). The global Krylov recurrence stays mathematically
//! consistent across ranks because every scalar it depends on (inner
//! products, norms) is combined via all-reduce before any rank advances.

use crate::error::Result;
use crate::grid::exchange::Exchange;
use crate::implicit::jacobian::JacobianRow;
use faer::Mat;

/// The abstract linear-system service a Newton iteration assembles into and
/// solves each iteration (§4.7, §6).
pub trait LinearSystem {
    /// Clears the system and reallocates for `n` local unknowns.
    fn reset(&mut self, n: usize);

    /// Inserts one assembled Jacobian row (diagonal, off-diagonals, and the
    /// RHS value `-F_i` derived from its residual).
    fn assemble_row(&mut self, row: &JacobianRow);

    /// Solves `J · δT = −F` and returns the correction vector, local-row
    /// ordered (the `scatter_to_local` role of §6: the caller maps local
    /// rows back onto `(i, j, k)` cells via the same
    /// [`crate::config::ImplicitRow`] list used to assemble).
    fn solve(&mut self, exchange: &dyn Exchange, tolerance: f64) -> Result<Vec<f64>>;
}

/// A `faer`-backed dense local system solved by restarted GMRES.
pub struct FaerLinearSystem {
    matrix: Mat<f64>,
    rhs: Vec<f64>,
    n: usize,
    restart: usize,
    max_iterations: usize,
}

impl FaerLinearSystem {
    /// Builds an empty system sized for `n` local unknowns. `restart`
    /// bounds the Krylov subspace dimension per GMRES cycle (Jacobian rows
    /// carry at most 7 nonzeros, so a small restart already captures the
    /// stencil's effective bandwidth).
    #[must_use]
    pub fn new(restart: usize, max_iterations: usize) -> Self {
        Self {
            matrix: Mat::zeros(0, 0),
            rhs: Vec::new(),
            n: 0,
            restart,
            max_iterations,
        }
    }

    fn matvec(&self, v: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for i in 0..self.n {
            let mut sum = 0.0;
            for j in 0..self.n {
                let a_ij = self.matrix.read(i, j);
                if a_ij != 0.0 {
                    sum += a_ij * v[j];
                }
            }
            out[i] = sum;
        }
        out
    }
}

impl LinearSystem for FaerLinearSystem {
    fn reset(&mut self, n: usize) {
        self.matrix = Mat::zeros(n, n);
        self.rhs = vec![0.0; n];
        self.n = n;
    }

    fn assemble_row(&mut self, row: &JacobianRow) {
        self.matrix.write(row.local_row, row.local_row, row.diagonal);
        for &(col, value) in &row.off_diagonals {
            self.matrix.write(row.local_row, col, value);
        }
        self.rhs[row.local_row] = -row.residual;
    }

    fn solve(&mut self, exchange: &dyn Exchange, tolerance: f64) -> Result<Vec<f64>> {
        if self.n == 0 {
            return Ok(Vec::new());
        }
        gmres(self, &self.rhs.clone(), exchange, tolerance, self.restart, self.max_iterations)
    }
}

fn global_dot(exchange: &dyn Exchange, a: &[f64], b: &[f64]) -> Result<f64> {
    let local: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    exchange.all_reduce_sum(local)
}

fn global_norm(exchange: &dyn Exchange, a: &[f64]) -> Result<f64> {
    Ok(global_dot(exchange, a, a)?.sqrt())
}

fn axpy(out: &mut [f64], alpha: f64, x: &[f64]) {
    for (o, xi) in out.iter_mut().zip(x) {
        *o += alpha * xi;
    }
}

/// Restarted GMRES(m) with modified Gram-Schmidt and Givens-rotation
/// least-squares solve, the "parallel Krylov method" of §4.7. Scalars
/// (inner products, norms) are combined across ranks via
/// [`Exchange::all_reduce_sum`]/derived so the recurrence stays globally
/// consistent even though the matrix itself is locally block-diagonal.
fn gmres(system: &FaerLinearSystem, b: &[f64], exchange: &dyn Exchange, tolerance: f64, restart: usize, max_iterations: usize) -> Result<Vec<f64>> {
    let n = system.n;
    let mut x = vec![0.0; n];
    let b_norm = global_norm(exchange, b)?.max(f64::MIN_POSITIVE);

    let mut total_iterations = 0;
    while total_iterations < max_iterations {
        let ax = system.matvec(&x);
        let mut r: Vec<f64> = b.iter().zip(&ax).map(|(bi, axi)| bi - axi).collect();
        let r_norm = global_norm(exchange, &r)?;
        if r_norm / b_norm < tolerance {
            break;
        }

        let m = restart.min(max_iterations - total_iterations).max(1);
        let mut v: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
        for ri in &mut r {
            *ri /= r_norm;
        }
        v.push(r);

        let mut h = vec![vec![0.0; m]; m + 1];
        let mut g = vec![0.0; m + 1];
        g[0] = r_norm;
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut used = 0;

        for k in 0..m {
            let mut w = system.matvec(&v[k]);
            for (i, vi) in v.iter().enumerate().take(k + 1) {
                let h_ik = global_dot(exchange, &w, vi)?;
                h[i][k] = h_ik;
                axpy(&mut w, -h_ik, vi);
            }
            let w_norm = global_norm(exchange, &w)?;
            h[k + 1][k] = w_norm;

            for i in 0..k {
                let (c, s) = (cs[i], sn[i]);
                let h_ik = h[i][k];
                let h_i1k = h[i + 1][k];
                h[i][k] = c * h_ik + s * h_i1k;
                h[i + 1][k] = -s * h_ik + c * h_i1k;
            }
            let denom = (h[k][k] * h[k][k] + h[k + 1][k] * h[k + 1][k]).sqrt();
            let (c, s) = if denom > 0.0 { (h[k][k] / denom, h[k + 1][k] / denom) } else { (1.0, 0.0) };
            cs[k] = c;
            sn[k] = s;
            h[k][k] = c * h[k][k] + s * h[k + 1][k];
            h[k + 1][k] = 0.0;
            g[k + 1] = -s * g[k];
            g[k] = c * g[k];

            used = k + 1;
            total_iterations += 1;

            if w_norm > f64::MIN_POSITIVE {
                for wi in &mut w {
                    *wi /= w_norm;
                }
                v.push(w);
            } else {
                break;
            }

            if g[k + 1].abs() / b_norm < tolerance || total_iterations >= max_iterations {
                break;
            }
        }

        // Back-substitute the upper-triangular least-squares system for the
        // coefficients of the Krylov basis, then update x.
        let mut y = vec![0.0; used];
        for i in (0..used).rev() {
            let mut sum = g[i];
            for j in (i + 1)..used {
                sum -= h[i][j] * y[j];
            }
            y[i] = if h[i][i].abs() > f64::MIN_POSITIVE { sum / h[i][i] } else { 0.0 };
        }
        for (i, yi) in y.iter().enumerate() {
            axpy(&mut x, *yi, &v[i]);
        }
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::exchange::NullTopology;

    #[test]
    fn solves_diagonal_system_exactly() {
        let mut system = FaerLinearSystem::new(5, 50);
        system.reset(3);
        system.assemble_row(&JacobianRow { local_row: 0, diagonal: 2.0, off_diagonals: vec![], residual: -4.0 });
        system.assemble_row(&JacobianRow { local_row: 1, diagonal: 3.0, off_diagonals: vec![], residual: -9.0 });
        system.assemble_row(&JacobianRow { local_row: 2, diagonal: 1.0, off_diagonals: vec![], residual: -2.0 });
        let x = system.solve(&NullTopology, 1e-10).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-8);
        assert!((x[1] - 3.0).abs() < 1e-8);
        assert!((x[2] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn solves_tridiagonal_system() {
        // [[2,-1,0],[-1,2,-1],[0,-1,2]] x = [1,0,1] -> x = [1,1,1]
        let mut system = FaerLinearSystem::new(5, 100);
        system.reset(3);
        system.assemble_row(&JacobianRow { local_row: 0, diagonal: 2.0, off_diagonals: vec![(1, -1.0)], residual: -1.0 });
        system.assemble_row(&JacobianRow { local_row: 1, diagonal: 2.0, off_diagonals: vec![(0, -1.0), (2, -1.0)], residual: 0.0 });
        system.assemble_row(&JacobianRow { local_row: 2, diagonal: 2.0, off_diagonals: vec![(1, -1.0)], residual: -1.0 });
        let x = system.solve(&NullTopology, 1e-10).unwrap();
        for xi in x {
            assert!((xi - 1.0).abs() < 1e-6);
        }
    }
}
