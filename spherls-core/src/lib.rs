//! Physics-update engine for a spherical-polar, staggered-grid stellar
//! envelope hydrodynamics solver.
//!
//! This crate owns the numerics: grid state, hyperbolic update, energy/EOS
//! closure, turbulence closure, grid motion, the adaptive timestep
//! controller, and the implicit radiation-energy Newton solve. It does not
//! own configuration-file parsing, model-file I/O, watch-zone diagnostic
//! dumps, MPI communicator construction, signal handling, or the
//! orchestration `main()` loop that drives a run to completion — those stay
//! on the other side of the [`grid::exchange::Exchange`] and
//! [`energy::EosTable`] boundaries, consumed here as opaque collaborators.
//!
//! [`dispatch::OperatorTable`] binds one operator per update role at
//! startup from the run's dimensionality, equation of state, and turbulence
//! model, then [`dispatch::run_step`] drives one full timestep through the
//! fixed invocation order: turbulence closure, density/viscosity, EOS
//! closure, velocities, grid motion, energy, the optional implicit
//! correction, and finally the timestep controller.

pub mod config;
pub mod dispatch;
pub mod energy;
pub mod error;
pub mod grid;
pub mod grid_motion;
pub mod hydro;
pub mod implicit;
pub mod state;
pub mod timestep;
pub mod turbulence;

pub use config::{Diagnostics, EosKind, Parameters, Time, TurbulenceModel};
pub use dispatch::{run_step, OperatorTable};
pub use error::{Error, Result};
pub use state::GridState;
