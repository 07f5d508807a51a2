//! Process topology (`ProcTop`, §6) and grid dimensionality.
//!
//! Domain decomposition is purely radial (§5): each rank owns a
//! contiguous slab of radial indices. Rank 0 always owns the innermost slab
//! and is always treated as a 1D core, even when outer ranks run 2D or 3D.

use serde::{Deserialize, Serialize};

/// Spatial dimensionality a rank's owned slab is evolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    /// Radial only. Always true for rank 0 (§3.1, §5).
    OneD,
    /// Radial + polar.
    TwoD,
    /// Radial + polar + azimuthal.
    ThreeD,
}

impl Dimensionality {
    /// Whether the polar direction is active.
    #[must_use]
    pub const fn has_theta(self) -> bool {
        matches!(self, Self::TwoD | Self::ThreeD)
    }

    /// Whether the azimuthal direction is active.
    #[must_use]
    pub const fn has_phi(self) -> bool {
        matches!(self, Self::ThreeD)
    }
}

/// Direction of a radial neighbour relative to the owning rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadialDirection {
    /// The neighbour owns the next-inward radial slab.
    Inward,
    /// The neighbour owns the next-outward radial slab.
    Outward,
}

/// One radial neighbour of the owning rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadialNeighbor {
    /// MPI rank of the neighbour.
    pub rank: i32,
    /// Direction of the neighbour relative to the owning rank.
    pub direction: RadialDirection,
}

/// Process topology of the owning rank, populated by the (out-of-scope)
/// orchestration layer from the MPI Cartesian communicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcTop {
    /// This process's MPI rank.
    pub rank: i32,
    /// Cartesian coordinate of this rank's slab along the radial axis.
    pub coords: usize,
    /// This rank's radial neighbours (0, 1, or 2 entries: a rank can be an
    /// innermost or outermost boundary and have only one).
    pub neighbors: Vec<RadialNeighbor>,
    /// Dimensionality this rank evolves its owned slab at.
    pub dimensionality: Dimensionality,
}

impl ProcTop {
    /// A single-rank topology with no neighbours: the degenerate case used
    /// by unit tests and by a serial (non-MPI) build.
    #[must_use]
    pub fn single_rank(dimensionality: Dimensionality) -> Self {
        Self {
            rank: 0,
            coords: 0,
            neighbors: Vec::new(),
            dimensionality,
        }
    }

    /// Whether this rank owns the innermost radial slab (always the 1D
    /// core, per §5).
    #[must_use]
    pub const fn is_innermost(&self) -> bool {
        self.coords == 0
    }

    /// Returns `true` if rank 0 (the 1D core), regardless of configured
    /// dimensionality — the invariant in §3.3 that angular fields are
    /// always undefined there.
    #[must_use]
    pub const fn is_rank_zero(&self) -> bool {
        self.rank == 0
    }

    /// The effective dimensionality this rank evolves at: rank 0 always
    /// collapses to 1D regardless of the configured value (§3.1, §5).
    #[must_use]
    pub const fn effective_dimensionality(&self) -> Dimensionality {
        if self.is_rank_zero() {
            Dimensionality::OneD
        } else {
            self.dimensionality
        }
    }

    /// The inward neighbour, if any (`None` at the innermost rank).
    #[must_use]
    pub fn inward_neighbor(&self) -> Option<&RadialNeighbor> {
        self.neighbors
            .iter()
            .find(|n| n.direction == RadialDirection::Inward)
    }

    /// The outward neighbour, if any (`None` at the outermost rank, the
    /// free surface).
    #[must_use]
    pub fn outward_neighbor(&self) -> Option<&RadialNeighbor> {
        self.neighbors
            .iter()
            .find(|n| n.direction == RadialDirection::Outward)
    }

    /// Whether this rank owns the outermost (free-surface) radial slab.
    #[must_use]
    pub fn is_outermost(&self) -> bool {
        self.outward_neighbor().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_is_both_innermost_and_outermost() {
        let topo = ProcTop::single_rank(Dimensionality::OneD);
        assert!(topo.is_innermost());
        assert!(topo.is_outermost());
        assert!(topo.is_rank_zero());
    }

    #[test]
    fn rank_zero_always_collapses_to_1d() {
        let topo = ProcTop {
            rank: 0,
            coords: 0,
            neighbors: vec![RadialNeighbor {
                rank: 1,
                direction: RadialDirection::Outward,
            }],
            dimensionality: Dimensionality::ThreeD,
        };
        assert_eq!(topo.effective_dimensionality(), Dimensionality::OneD);
    }

    #[test]
    fn outer_rank_keeps_configured_dimensionality() {
        let topo = ProcTop {
            rank: 2,
            coords: 2,
            neighbors: vec![RadialNeighbor {
                rank: 1,
                direction: RadialDirection::Inward,
            }],
            dimensionality: Dimensionality::ThreeD,
        };
        assert_eq!(topo.effective_dimensionality(), Dimensionality::ThreeD);
        assert!(topo.is_outermost());
        assert!(!topo.is_innermost());
    }
}
