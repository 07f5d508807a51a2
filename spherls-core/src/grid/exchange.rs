//! The ghost-zone exchange contract (§4.8) and the message-passing
//! service it is built on (§6).
//!
//! Kernels never call an MPI binding directly. They call [`Exchange`]
//! methods, which keeps every kernel testable single-rank (via
//! [`NullTopology`]) and keeps the one real MPI backend
//! (`grid::mpi_exchange`, behind the `mpi-exchange` feature) isolated to a
//! single small file.

use crate::error::Result;
use crate::grid::field::Field;
use crate::grid::topology::ProcTop;

/// The message-passing and ghost-exchange service §6 describes as an
/// external collaborator, abstracted behind a trait so the physics kernels
/// stay backend-agnostic.
pub trait Exchange {
    /// Blocking receive of the grid-velocity value at the inner boundary
    /// from the radial-inward neighbour, used by the sequential sweep in
    /// `calc_new_U0` (§4.2). Returns `0.0` with no error when this
    /// rank has no inward neighbour (the innermost rank).
    fn recv_inner_u0(&self, proc_top: &ProcTop) -> Result<f64>;

    /// Blocking send of this rank's outer-boundary grid velocity to the
    /// outward neighbour. A no-op at the outermost rank.
    fn send_outer_u0(&self, proc_top: &ProcTop, value: f64) -> Result<()>;

    /// Posts a non-blocking receive for the next step's U0 update from the
    /// outward neighbour, and a blocking send to the inward neighbour, per
    /// the communication pattern in §4.2. Returns immediately; the
    /// actual receive is reconciled on the next call to
    /// [`Exchange::recv_inner_u0`].
    fn post_next_u0_exchange(&self, proc_top: &ProcTop, inward_send_value: f64) -> Result<()>;

    /// The composite per-field ghost exchange (§6:
    /// `update_local_boundaries_new`): overwrites the two-layer halo of
    /// `field` with the neighbouring rank's owned values for every
    /// interior-facing halo, leaving halos at a physical boundary (no
    /// neighbour on that face) untouched.
    fn update_local_boundaries_new(&self, field: &mut Field, proc_top: &ProcTop) -> Result<()>;

    /// All-reduce minimum, used by the timestep controller for the CFL time
    /// and by convergence tests for the minimum across ranks.
    fn all_reduce_min(&self, value: f64) -> Result<f64>;

    /// All-reduce maximum, used for the fractional-change estimate, the
    /// maximum convective velocity, and Newton-correction convergence.
    fn all_reduce_max(&self, value: f64) -> Result<f64>;

    /// All-reduce sum, used by the implicit solve's distributed Krylov dot
    /// products (§4.7, §5).
    fn all_reduce_sum(&self, value: f64) -> Result<f64>;
}

/// A loop-back [`Exchange`] for a single rank (no neighbours to talk to):
/// the degenerate case exercised by every unit test and by rank 0 running
/// alone. All-reduces are the identity; ghost exchanges are no-ops because
/// there is no neighbour whose owned values could overwrite them — whatever
/// boundary policy the kernel applied to its own ghost cells stands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTopology;

impl Exchange for NullTopology {
    fn recv_inner_u0(&self, _proc_top: &ProcTop) -> Result<f64> {
        Ok(0.0)
    }

    fn send_outer_u0(&self, _proc_top: &ProcTop, _value: f64) -> Result<()> {
        Ok(())
    }

    fn post_next_u0_exchange(&self, _proc_top: &ProcTop, _inward_send_value: f64) -> Result<()> {
        Ok(())
    }

    fn update_local_boundaries_new(&self, _field: &mut Field, _proc_top: &ProcTop) -> Result<()> {
        Ok(())
    }

    fn all_reduce_min(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn all_reduce_max(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn all_reduce_sum(&self, value: f64) -> Result<f64> {
        Ok(value)
    }
}
