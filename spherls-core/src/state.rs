//! The double-buffered grid state (§3.2, §3.4): one [`Field`] pair
//! (`old`, `new`) per core entity, allocated once at startup and swapped in
//! place at the end of every step. No dynamic reallocation during the run
//! (§5).

use crate::error::{Error, Fault, Result};
use crate::grid::descriptor::VariableDescriptorTable;
use crate::grid::field::{Field, GridExtent, IndexRange, Region};
use crate::grid::topology::Dimensionality;

/// One core entity of §3.2. Used to name which [`FieldPair`] of a
/// [`GridState`] a diagnostic or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// Radial interface coordinate.
    R,
    /// Radial velocity.
    U,
    /// Polar velocity.
    V,
    /// Azimuthal velocity.
    W,
    /// Grid radial velocity.
    U0,
    /// Mass density.
    D,
    /// Angularly-averaged density.
    DenAve,
    /// Radial mass-shell width.
    Dm,
    /// Specific internal energy.
    E,
    /// Pressure.
    P,
    /// Temperature.
    T,
    /// Rosseland opacity.
    Kappa,
    /// Adiabatic index.
    Gamma,
    /// Radial artificial viscosity.
    Q0,
    /// Polar artificial viscosity.
    Q1,
    /// Azimuthal artificial viscosity.
    Q2,
    /// Turbulent eddy viscosity.
    EddyVisc,
    /// Enclosed mass at radial interface.
    M,
}

impl Variable {
    /// Every core entity, in the order [`GridState`] allocates them.
    pub const ALL: [Self; 17] = [
        Self::R,
        Self::U,
        Self::V,
        Self::W,
        Self::U0,
        Self::D,
        Self::DenAve,
        Self::Dm,
        Self::E,
        Self::P,
        Self::T,
        Self::Kappa,
        Self::Gamma,
        Self::Q0,
        Self::Q1,
        Self::Q2,
        Self::EddyVisc,
        Self::M,
    ];
}

/// A variable's `old` and `new` storage (§3.1).
#[derive(Debug, Clone)]
pub struct FieldPair {
    /// Value at time level `n` (or `n+½` for staggered-in-time fields).
    pub old: Field,
    /// Value at time level `n+1` being assembled by the current step.
    pub new: Field,
}

impl FieldPair {
    fn zeros(extent: GridExtent) -> Self {
        Self {
            old: Field::zeros(extent),
            new: Field::zeros(extent),
        }
    }

    /// Swaps `new` into `old`, the end-of-step transition of §3.4.
    /// Non-evolved fields (`DM`, `M`) swap too, but since nothing ever
    /// writes a different value into their `new` buffer the swap is a
    /// no-op in effect.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.old, &mut self.new);
    }
}

fn extent_for(r: IndexRange, theta: IndexRange, phi: IndexRange, centering: crate::grid::descriptor::VariableDescriptor) -> GridExtent {
    use crate::grid::descriptor::Centering;

    let widen = |range: IndexRange, c: Centering| match c {
        Centering::Interface => IndexRange::new(range.start, range.end + 1),
        Centering::Centered => range,
        Centering::Undefined => IndexRange::new(0, 0),
    };

    GridExtent {
        r: widen(r, centering.r),
        theta: widen(theta, centering.theta),
        phi: widen(phi, centering.phi),
    }
}

/// The full grid state: every core entity's double-buffered storage.
pub struct GridState {
    /// Radial interface coordinate.
    pub r: FieldPair,
    /// Radial velocity.
    pub u: FieldPair,
    /// Polar velocity.
    pub v: FieldPair,
    /// Azimuthal velocity.
    pub w: FieldPair,
    /// Grid radial velocity.
    pub u0: FieldPair,
    /// Mass density.
    pub d: FieldPair,
    /// Angularly-averaged density.
    pub den_ave: FieldPair,
    /// Radial mass-shell width.
    pub dm: FieldPair,
    /// Specific internal energy.
    pub e: FieldPair,
    /// Pressure.
    pub p: FieldPair,
    /// Temperature.
    pub t: FieldPair,
    /// Rosseland opacity.
    pub kappa: FieldPair,
    /// Adiabatic index.
    pub gamma: FieldPair,
    /// Radial artificial viscosity.
    pub q0: FieldPair,
    /// Polar artificial viscosity.
    pub q1: FieldPair,
    /// Azimuthal artificial viscosity.
    pub q2: FieldPair,
    /// Turbulent eddy viscosity.
    pub eddy_visc: FieldPair,
    /// Enclosed mass at radial interface.
    pub m: FieldPair,
}

impl GridState {
    /// Allocates every variable's double buffer for `n_r` radial, `n_theta`
    /// polar, and `n_phi` azimuthal owned cells at dimensionality `dim`
    /// (collapsing angular extents to empty as [`VariableDescriptorTable`]
    /// dictates).
    ///
    /// `has_inner_neighbor` must be `true` for every rank except the
    /// innermost (`ProcTop::is_innermost`): it reserves [`GHOST_WIDTH`]
    /// indices below the owned radial range so [`Region::RInner`] is a real,
    /// addressable slab rather than collapsing to empty. The innermost rank
    /// has no inward neighbour to exchange with, so its owned range keeps
    /// starting at local index 0, the fixed point `hydro::sedov` relies on.
    #[must_use]
    pub fn allocate(n_r: usize, n_theta: usize, n_phi: usize, dim: Dimensionality, has_inner_neighbor: bool) -> Self {
        let descriptors = VariableDescriptorTable::for_dim(dim);
        let r_start = if has_inner_neighbor { crate::grid::field::GHOST_WIDTH } else { 0 };
        let r = IndexRange::new(r_start, r_start + n_r);
        let theta = if dim.has_theta() { IndexRange::new(0, n_theta) } else { IndexRange::new(0, 0) };
        let phi = if dim.has_phi() { IndexRange::new(0, n_phi) } else { IndexRange::new(0, 0) };

        let ext = |d: crate::grid::descriptor::VariableDescriptor| extent_for(r, theta, phi, d);

        Self {
            r: FieldPair::zeros(ext(descriptors.r)),
            u: FieldPair::zeros(ext(descriptors.u)),
            v: FieldPair::zeros(ext(descriptors.v)),
            w: FieldPair::zeros(ext(descriptors.w)),
            u0: FieldPair::zeros(ext(descriptors.u0)),
            d: FieldPair::zeros(ext(descriptors.d)),
            den_ave: FieldPair::zeros(ext(descriptors.den_ave)),
            dm: FieldPair::zeros(ext(descriptors.dm)),
            e: FieldPair::zeros(ext(descriptors.e)),
            p: FieldPair::zeros(ext(descriptors.p)),
            t: FieldPair::zeros(ext(descriptors.t)),
            kappa: FieldPair::zeros(ext(descriptors.kappa)),
            gamma: FieldPair::zeros(ext(descriptors.gamma)),
            q0: FieldPair::zeros(ext(descriptors.q0)),
            q1: FieldPair::zeros(ext(descriptors.q1)),
            q2: FieldPair::zeros(ext(descriptors.q2)),
            eddy_visc: FieldPair::zeros(ext(descriptors.eddy_visc)),
            m: FieldPair::zeros(ext(descriptors.m)),
        }
    }

    /// Swaps `new` into `old` for every variable, the end-of-step
    /// transition of §3.4.
    pub fn swap_all(&mut self) {
        self.r.swap();
        self.u.swap();
        self.v.swap();
        self.w.swap();
        self.u0.swap();
        self.d.swap();
        self.den_ave.swap();
        self.dm.swap();
        self.e.swap();
        self.p.swap();
        self.t.swap();
        self.kappa.swap();
        self.gamma.swap();
        self.q0.swap();
        self.q1.swap();
        self.q2.swap();
        self.eddy_visc.swap();
        self.m.swap();
    }

    /// Checks the positivity invariants of §3.3/§8 on the `new`
    /// density, energy, and (when tracked) temperature fields, returning
    /// the first violation found as a [`Error::Calculation`].
    pub fn check_positivity(&self, track_temperature: bool, is_rank_zero: bool) -> Result<()> {
        check_positive(&self.d.new, Region::Interior, "D", is_rank_zero)?;
        check_positive(&self.e.new, Region::Interior, "E", is_rank_zero)?;
        if track_temperature {
            check_positive(&self.t.new, Region::Interior, "T", is_rank_zero)?;
        }
        Ok(())
    }
}

fn check_positive(field: &Field, region: Region, name: &str, is_rank_zero: bool) -> Result<()> {
    for (i, j, k) in field.indices(region) {
        let value = field.get(i, j, k);
        if value <= 0.0 {
            return Err(Error::calculation(
                format!("{name} went non-positive ({value})"),
                Fault::here(file!(), "check_positivity", line!()).at(i, j, k),
                is_rank_zero,
            ));
        }
    }
    Ok(())
}
