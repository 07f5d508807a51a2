//! Typed field handle over a flat, strided 3D buffer.
//!
//! Replaces raw `grid.dLocalGridOld[var][i][j][k]` pointer-chasing (§9) with
//! a single [`Field`] per variable: an [`ndarray::Array3`] (the staggered
//! grid storage convention used elsewhere in this workspace, see
//! `pineappl::sparse_array3` and `pineappl::grid`'s use of `Array3`) plus the
//! index-range metadata that says which of its cells are "owned interior"
//! vs. one of the six ghost regions.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Fixed ghost-layer width on every face (§3.1: "two ghost layers per
/// face suffice for the 5-point upwind stencils").
pub const GHOST_WIDTH: usize = 2;

/// A half-open index range `[start, end)` along one grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    /// First index in the range.
    pub start: usize,
    /// One past the last index in the range.
    pub end: usize,
}

impl IndexRange {
    /// Constructs a range, asserting `start <= end`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "inverted index range {start}..{end}");
        Self { start, end }
    }

    /// Number of indices covered by this range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterates over the indices in this range.
    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Which of the six ghost regions (or the owned interior) a stencil call is
/// evaluating, per §4.8's ghost-zone exchange contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The owned interior, excluding all ghost layers.
    Interior,
    /// The two ghost layers on the inner radial face.
    RInner,
    /// The two ghost layers on the outer radial face (the free surface on
    /// the outermost rank).
    ROuter,
    /// The two ghost layers on the θ = θ_min face.
    ThetaInner,
    /// The two ghost layers on the θ = θ_max face.
    ThetaOuter,
    /// The two ghost layers on the φ = φ_min face.
    PhiInner,
    /// The two ghost layers on the φ = φ_max face.
    PhiOuter,
}

impl Region {
    /// All six ghost regions, in the order the exchange contract visits
    /// them.
    pub const GHOSTS: [Self; 6] = [
        Self::RInner,
        Self::ROuter,
        Self::ThetaInner,
        Self::ThetaOuter,
        Self::PhiInner,
        Self::PhiOuter,
    ];
}

/// Start/end index tables for the owned interior and the six ghost regions
/// of one variable, along all three axes. This is the Rust counterpart of
/// the C++ `Grid`'s per-variable start/end index arrays (§6).
#[derive(Debug, Clone, Copy)]
pub struct GridExtent {
    /// Index range of the owned interior along r.
    pub r: IndexRange,
    /// Index range of the owned interior along θ (full-width placeholder
    /// at dimensionalities where θ is undefined).
    pub theta: IndexRange,
    /// Index range of the owned interior along φ.
    pub phi: IndexRange,
}

impl GridExtent {
    /// The `(i, j, k)` range covering one [`Region`] of this field: the
    /// owned interior itself, or a two-cell-wide ghost slab on the named
    /// face, clamped to the field's angular extent when that direction is
    /// collapsed (1D/2D ranks, §3.3).
    ///
    /// `RInner` collapses to empty exactly when `self.r.start < GHOST_WIDTH`
    /// — true for the innermost rank, which has no inward neighbour and
    /// keeps its owned range starting at local index 0 (see
    /// `hydro::sedov`), and false for every other rank, whose owned range is
    /// built with `GHOST_WIDTH` spare indices below it
    /// (`GridState::allocate`'s `has_inner_neighbor`) so the inner ghost slab
    /// is addressable.
    #[must_use]
    pub fn region(&self, region: Region) -> (IndexRange, IndexRange, IndexRange) {
        let full_theta = IndexRange::new(self.theta.start, self.theta.end);
        let full_phi = IndexRange::new(self.phi.start, self.phi.end);
        match region {
            Region::Interior => (self.r, full_theta, full_phi),
            Region::RInner => (
                IndexRange::new(self.r.start.saturating_sub(GHOST_WIDTH), self.r.start),
                full_theta,
                full_phi,
            ),
            Region::ROuter => (
                IndexRange::new(self.r.end, self.r.end + GHOST_WIDTH),
                full_theta,
                full_phi,
            ),
            Region::ThetaInner => (
                self.r,
                IndexRange::new(self.theta.start.saturating_sub(GHOST_WIDTH), self.theta.start),
                full_phi,
            ),
            Region::ThetaOuter => (
                self.r,
                IndexRange::new(self.theta.end, self.theta.end + GHOST_WIDTH),
                full_phi,
            ),
            Region::PhiInner => (
                self.r,
                full_theta,
                IndexRange::new(self.phi.start.saturating_sub(GHOST_WIDTH), self.phi.start),
            ),
            Region::PhiOuter => (
                self.r,
                full_theta,
                IndexRange::new(self.phi.end, self.phi.end + GHOST_WIDTH),
            ),
        }
    }
}

/// One variable's storage at one time level (`old` or `new`): a dense 3D
/// buffer spanning the owned interior plus ghost layers on every face,
/// indexed directly by absolute `(i, j, k)`.
#[derive(Debug, Clone)]
pub struct Field {
    data: Array3<f64>,
    extent: GridExtent,
}

impl Field {
    /// Allocates a field covering `extent` plus [`GHOST_WIDTH`] ghost cells
    /// on every face that is not collapsed (an empty angular range stays
    /// empty: rank 0's 1D core never allocates θ/φ storage).
    #[must_use]
    pub fn zeros(extent: GridExtent) -> Self {
        let dim_with_ghosts = |r: IndexRange| {
            if r.is_empty() {
                0
            } else {
                r.len() + 2 * GHOST_WIDTH
            }
        };
        let shape = (
            dim_with_ghosts(extent.r),
            dim_with_ghosts(extent.theta),
            dim_with_ghosts(extent.phi),
        );
        Self {
            data: Array3::zeros(shape),
            extent,
        }
    }

    /// The index-range metadata for this field.
    #[must_use]
    pub const fn extent(&self) -> &GridExtent {
        &self.extent
    }

    /// Absolute-indexed read access. Indices include the ghost offset:
    /// `extent.r.start - GHOST_WIDTH` is index 0 along the radial axis.
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.local_index(i, j, k)]
    }

    /// Absolute-indexed write access.
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.local_index(i, j, k);
        self.data[idx] = value;
    }

    fn local_index(&self, i: usize, j: usize, k: usize) -> [usize; 3] {
        let lr = i + GHOST_WIDTH - self.extent.r.start;
        let lt = if self.extent.theta.is_empty() {
            0
        } else {
            j + GHOST_WIDTH - self.extent.theta.start
        };
        let lp = if self.extent.phi.is_empty() {
            0
        } else {
            k + GHOST_WIDTH - self.extent.phi.start
        };
        [lr, lt, lp]
    }

    /// Iterates over every `(i, j, k)` cell in `region`, owned interior or
    /// ghost, without borrowing `self`.
    pub fn indices(&self, region: Region) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let (ri, ti, pi) = self.extent.region(region);
        ri.iter()
            .flat_map(move |i| ti.iter().flat_map(move |j| pi.iter().map(move |k| (i, j, k))))
    }

    /// Raw access to the underlying array, e.g. for reductions that are
    /// cheaper to express directly over `ndarray`.
    #[must_use]
    pub const fn raw(&self) -> &Array3<f64> {
        &self.data
    }
}
