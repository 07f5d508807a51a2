//! The implicit radiation-diffusion / energy solver (component C6,
//! §4.7): a Newton iteration on the energy-residual nodes of a marked
//! radial subshell, a finite-difference Jacobian, and a distributed
//! Krylov solve each iteration.

pub mod jacobian;
pub mod linear_system;
pub mod newton;
pub mod residual;

pub use jacobian::assemble_jacobian_row;
pub use linear_system::{FaerLinearSystem, LinearSystem};
pub use newton::implicit_solve;
pub use residual::{implicit_energy_residual, implicit_energy_residual_surface, ImplicitContext};
