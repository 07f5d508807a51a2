//! Per-variable staggering descriptors (§3.1).
//!
//! Every evolved or derived quantity is stored on a logically-structured
//! spherical mesh in which each of the three directions may independently be
//! cell-centered, face-centered ("interface"), or simply absent at the
//! current dimensionality.

use serde::{Deserialize, Serialize};

/// Where, along one grid direction, a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Centering {
    /// Cell-centered (type code 0).
    Centered,
    /// Face/interface-centered (type code 1).
    Interface,
    /// The direction does not exist at the current dimensionality (−1).
    Undefined,
}

impl Centering {
    /// The half-index offset a centering contributes to a stencil, `0.0`
    /// for cell-centered and `0.5` for interface-centered quantities.
    #[must_use]
    pub const fn half_offset(self) -> f64 {
        match self {
            Self::Centered => 0.0,
            Self::Interface => 0.5,
            Self::Undefined => 0.0,
        }
    }
}

/// The four-element staggering descriptor for one variable: centering along
/// r, θ, φ, and whether the orchestration loop time-evolves it (vs. deriving
/// it purely from other evolved fields, e.g. pressure from density+energy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Radial centering.
    pub r: Centering,
    /// Polar centering.
    pub theta: Centering,
    /// Azimuthal centering.
    pub phi: Centering,
    /// Whether the orchestration loop advances this variable from `old` to
    /// `new` each step (vs. recomputing it as a derived quantity).
    pub time_evolved: bool,
}

impl VariableDescriptor {
    /// A cell-centered, time-evolved variable (density, energy, ...).
    #[must_use]
    pub const fn cell_centered(time_evolved: bool) -> Self {
        Self {
            r: Centering::Centered,
            theta: Centering::Centered,
            phi: Centering::Centered,
            time_evolved,
        }
    }

    /// Collapses the θ and φ descriptors to [`Centering::Undefined`], the
    /// treatment rank 0's 1D core gives to every angular quantity
    /// (§3.1, §3.3).
    #[must_use]
    pub const fn collapsed_to_1d(mut self) -> Self {
        self.theta = Centering::Undefined;
        self.phi = Centering::Undefined;
        self
    }

    /// Collapses only the φ descriptor, the treatment a 2D (r,θ) slab gives
    /// to azimuthal quantities.
    #[must_use]
    pub const fn collapsed_to_2d(mut self) -> Self {
        self.phi = Centering::Undefined;
        self
    }
}

/// Builds the descriptor table for every [`crate::state::Variable`] at a
/// given dimensionality, per §4.1 "Internal-variable metadata".
#[must_use]
pub fn descriptor_table(dim: crate::grid::topology::Dimensionality) -> VariableDescriptorTable {
    use crate::grid::topology::Dimensionality::{OneD, ThreeD, TwoD};
    use Centering::{Centered, Interface};

    let r_interface = VariableDescriptor {
        r: Interface,
        theta: Centered,
        phi: Centered,
        time_evolved: true,
    };
    let theta_interface = VariableDescriptor {
        r: Centered,
        theta: Interface,
        phi: Centered,
        time_evolved: true,
    };
    let phi_interface = VariableDescriptor {
        r: Centered,
        theta: Centered,
        phi: Interface,
        time_evolved: true,
    };

    let collapse = |d: VariableDescriptor| match dim {
        OneD => d.collapsed_to_1d(),
        TwoD => d.collapsed_to_2d(),
        ThreeD => d,
    };

    // U0 is angle-independent by construction (§3.2): a single grid
    // velocity per radial interface, never stored per (j, k).
    let u0_descriptor = VariableDescriptor {
        r: Interface,
        theta: Centering::Undefined,
        phi: Centering::Undefined,
        time_evolved: true,
    };

    VariableDescriptorTable {
        r: collapse(r_interface),
        u: collapse(r_interface),
        v: collapse(theta_interface),
        w: collapse(phi_interface),
        u0: u0_descriptor,
        d: collapse(VariableDescriptor::cell_centered(true)),
        den_ave: VariableDescriptor {
            r: Centered,
            theta: Centering::Undefined,
            phi: Centering::Undefined,
            time_evolved: true,
        },
        dm: collapse(VariableDescriptor::cell_centered(false)),
        e: collapse(VariableDescriptor::cell_centered(true)),
        p: collapse(VariableDescriptor::cell_centered(false)),
        t: collapse(VariableDescriptor::cell_centered(false)),
        kappa: collapse(VariableDescriptor::cell_centered(false)),
        gamma: collapse(VariableDescriptor::cell_centered(false)),
        q0: collapse(VariableDescriptor::cell_centered(true)),
        q1: collapse(VariableDescriptor::cell_centered(true)),
        q2: collapse(VariableDescriptor::cell_centered(true)),
        eddy_visc: collapse(VariableDescriptor::cell_centered(true)),
        m: collapse(r_interface),
    }
}

impl VariableDescriptorTable {
    /// Builds the descriptor table for `dim`, collapsing angular entries to
    /// [`Centering::Undefined`] at lower dimensionalities.
    #[must_use]
    pub fn for_dim(dim: crate::grid::topology::Dimensionality) -> Self {
        descriptor_table(dim)
    }
}

/// The bound descriptor for every core entity in §3.2.
#[derive(Debug, Clone, Copy)]
pub struct VariableDescriptorTable {
    /// Radial interface coordinate.
    pub r: VariableDescriptor,
    /// Radial velocity.
    pub u: VariableDescriptor,
    /// Polar velocity.
    pub v: VariableDescriptor,
    /// Azimuthal velocity.
    pub w: VariableDescriptor,
    /// Grid radial velocity.
    pub u0: VariableDescriptor,
    /// Mass density.
    pub d: VariableDescriptor,
    /// Angularly-averaged density.
    pub den_ave: VariableDescriptor,
    /// Radial mass-shell width.
    pub dm: VariableDescriptor,
    /// Specific internal energy.
    pub e: VariableDescriptor,
    /// Pressure.
    pub p: VariableDescriptor,
    /// Temperature.
    pub t: VariableDescriptor,
    /// Rosseland opacity.
    pub kappa: VariableDescriptor,
    /// Adiabatic index.
    pub gamma: VariableDescriptor,
    /// Radial artificial viscosity.
    pub q0: VariableDescriptor,
    /// Polar artificial viscosity.
    pub q1: VariableDescriptor,
    /// Azimuthal artificial viscosity.
    pub q2: VariableDescriptor,
    /// Turbulent eddy viscosity.
    pub eddy_visc: VariableDescriptor,
    /// Enclosed mass at radial interface.
    pub m: VariableDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::topology::Dimensionality;

    #[test]
    fn rank_zero_collapses_angular_descriptors() {
        let table = descriptor_table(Dimensionality::OneD);
        assert_eq!(table.v.theta, Centering::Undefined);
        assert_eq!(table.w.phi, Centering::Undefined);
        assert_eq!(table.den_ave.theta, Centering::Undefined);
    }

    #[test]
    fn three_d_keeps_all_directions() {
        let table = descriptor_table(Dimensionality::ThreeD);
        assert_eq!(table.v.theta, Centering::Interface);
        assert_eq!(table.w.phi, Centering::Interface);
    }
}
