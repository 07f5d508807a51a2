//! The hyperbolic update (component C3, §4.3): density, the three
//! momentum components, artificial viscosity, and angular density
//! averaging.

pub mod artificial_viscosity;
pub mod density;
pub mod density_average;
pub mod momentum;
pub mod sedov;

pub use artificial_viscosity::{calc_new_q0, calc_new_q1, calc_new_q2};
pub use density::calc_new_d;
pub use density_average::calc_new_den_ave;
pub use momentum::{calc_new_u, calc_new_v, calc_new_w};
pub use sedov::apply_sedov_inner_boundary;
