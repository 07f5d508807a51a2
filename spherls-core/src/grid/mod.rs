//! The staggered spherical-polar grid: centering descriptors, typed field
//! storage, precomputed geometry, process topology, and the ghost-exchange
//! contract (§3.1, §3.2, §4.1, §4.8, §6).

pub mod descriptor;
pub mod exchange;
pub mod field;
pub mod geometry;
pub mod topology;

#[cfg(feature = "mpi-exchange")]
pub mod mpi_exchange;

pub use descriptor::{Centering, VariableDescriptor, VariableDescriptorTable};
pub use exchange::{Exchange, NullTopology};
pub use field::{Field, GridExtent, IndexRange, Region, GHOST_WIDTH};
pub use geometry::GeometricFactors;
pub use topology::{Dimensionality, ProcTop, RadialDirection, RadialNeighbor};
