//! Crate-wide error type and the fault context attached to it.
//!
//! The two kinds mirror the two error kinds of the physics-update engine:
//! a broken numerical invariant or an ill-posed bind-time combination
//! (`CALCULATION`), and a non-positive computed timestep (`INPUT`). Both are
//! unrecoverable at the point they are raised; the caller (the excluded
//! orchestration loop) decides whether to unwind or abort.

use thiserror::Error;

/// Where in the owned grid (and on which rank) a fault was detected.
///
/// Carried alongside every [`Error`] so that a multi-rank run can report
/// which shell, and which rank, broke an invariant, per §7
/// ("propagated out of the kernel as a structured exception carrying file,
/// function, line, rank, and indices where available").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fault {
    /// Source file the fault was raised from.
    pub file: &'static str,
    /// Function (or kernel role) the fault was raised from.
    pub function: &'static str,
    /// Source line the fault was raised from.
    pub line: u32,
    /// MPI rank that detected the fault, if known.
    pub rank: Option<i32>,
    /// Radial, polar, and azimuthal indices of the offending cell, if known.
    pub indices: Option<(usize, usize, usize)>,
}

impl Fault {
    /// Constructs a [`Fault`] with only the source-location fields filled in.
    #[must_use]
    pub const fn here(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
            rank: None,
            indices: None,
        }
    }

    /// Attaches the cell indices at which the fault was detected.
    #[must_use]
    pub const fn at(mut self, i: usize, j: usize, k: usize) -> Self {
        self.indices = Some((i, j, k));
        self
    }

    /// Attaches the rank that detected the fault.
    #[must_use]
    pub const fn on_rank(mut self, rank: i32) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// Captures a source location as a [`Fault`] with no rank/index context yet.
macro_rules! fault_here {
    () => {
        $crate::error::Fault::here(file!(), "", line!())
    };
    ($function:expr) => {
        $crate::error::Fault::here(file!(), $function, line!())
    };
}

pub(crate) use fault_here;

/// Catch-all error for the physics-update engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A numerical invariant (positive density/energy/temperature) was
    /// broken, or the operator table was bound with an ill-posed
    /// combination (non-adiabatic with a gamma-law equation of state).
    #[error("calculation error in {}: {} (rank {:?}, cell {:?})", .fault.function, .message, .fault.rank, .fault.indices)]
    Calculation {
        /// Human-readable description of what broke.
        message: String,
        /// Where it broke.
        fault: Fault,
    },
    /// A rank computed a non-positive CFL timestep.
    #[error("invalid timestep in {}: {} (rank {:?}, cell {:?})", .fault.function, .message, .fault.rank, .fault.indices)]
    Input {
        /// Human-readable description of the offending shell/value.
        message: String,
        /// Where it was detected.
        fault: Fault,
    },
    /// An error from a lower-level dependency (the EOS table service, the
    /// linear-algebra backend) that this crate does not attempt to wrap.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Builds a [`Error::Calculation`] and, on rank 0, emits the
    /// human-readable message via `tracing::error!` before returning it —
    /// the "rank-0 emits the message; other ranks re-throw empty" policy of
    /// §7.
    pub fn calculation(message: impl Into<String>, fault: Fault, is_rank_zero: bool) -> Self {
        let message = message.into();
        if is_rank_zero {
            tracing::error!(function = fault.function, indices = ?fault.indices, "{message}");
            Self::Calculation { message, fault }
        } else {
            Self::Calculation {
                message: String::new(),
                fault,
            }
        }
    }

    /// Builds a [`Error::Input`] following the same rank-0 surfacing policy.
    pub fn input(message: impl Into<String>, fault: Fault, is_rank_zero: bool) -> Self {
        let message = message.into();
        if is_rank_zero {
            tracing::error!(function = fault.function, indices = ?fault.indices, "{message}");
            Self::Input { message, fault }
        } else {
            Self::Input {
                message: String::new(),
                fault,
            }
        }
    }
}

/// Result type used throughout the physics-update engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Emits the two non-fatal warnings named in §7, once per occurrence.
pub mod warn {
    /// The EOS Newton iteration for `T` did not converge within the
    /// configured iteration budget.
    pub fn eos_newton_not_converged(cell: (usize, usize, usize), relative_residual: f64, max_iterations: u32) {
        tracing::warn!(
            cell = ?cell,
            relative_residual,
            max_iterations,
            "EOS temperature Newton iteration did not converge"
        );
    }

    /// The outer implicit energy solve did not converge within the
    /// configured Newton iteration budget.
    pub fn implicit_solve_not_converged(iterations: u32, max_relative_correction: f64) {
        tracing::warn!(
            iterations,
            max_relative_correction,
            "implicit energy solve did not converge"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_display_carries_context() {
        let fault = Fault::here("grid_motion.rs", "calc_new_u0", 42).at(3, 0, 0).on_rank(1);
        let err = Error::Input {
            message: "non-positive CFL timestep".to_string(),
            fault,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("calc_new_u0"));
        assert!(rendered.contains("non-positive CFL timestep"));
    }

    #[test]
    fn non_rank_zero_calculation_error_has_empty_message() {
        let fault = Fault::here("energy.rs", "calc_new_e", 7);
        let err = Error::calculation("negative temperature", fault, false);
        match err {
            Error::Calculation { message, .. } => assert!(message.is_empty()),
            _ => panic!("expected Calculation variant"),
        }
    }
}
