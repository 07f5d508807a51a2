//! Energy and EOS closure (component C4, §4.4): the energy equation
//! with optional Rosseland radiative diffusion, and the gamma-law/tabulated
//! equation-of-state branches.

pub mod energy;
pub mod eos;

pub use energy::calc_new_e;
pub(crate) use energy::{face_opacity, radiative_flux};
pub use eos::{calc_new_eos_vars_gamma_law, calc_new_eos_vars_tabulated, invert_temperature, EosTable};
