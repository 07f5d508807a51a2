#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! `PineAPPL` is not an extension of `APPLgrid`.

pub mod bin;
pub mod grid;
pub mod lagrange_subgrid;
pub mod lumi;
pub mod ntuple_subgrid;
