//! Precomputed angular geometric factors and face-area/cell-volume formulas
//! (§3.2, §4.1).
//!
//! Computed once from the initial θ, φ grids at bind time and held fixed for
//! the life of the run (the angular grid never moves; only `R` does).

use crate::grid::field::IndexRange;
use crate::grid::topology::Dimensionality;

/// Angular geometric factors derived from the initial θ, φ interface grids.
///
/// Empty at dimensionalities where the corresponding direction is
/// undefined (§3.3: rank 0's 1D core has none of these).
#[derive(Debug, Clone, Default)]
pub struct GeometricFactors {
    /// `cos(θ_{j−1/2}) − cos(θ_{j+1/2})` per θ cell: the angular weight
    /// used by `calc_new_DenAve` and by angular volume elements.
    pub d_cos_theta: Vec<f64>,
    /// Cell-centered angular width `θ_{j+1/2} − θ_{j−1/2}`.
    pub d_theta: Vec<f64>,
    /// Cell-centered azimuthal width `φ_{k+1/2} − φ_{k−1/2}`.
    pub d_phi: Vec<f64>,
    /// `sin θ` at cell centers.
    pub sin_theta_center: Vec<f64>,
    /// `sin θ` at the `j+½` interface.
    pub sin_theta_interface: Vec<f64>,
    /// `cot θ` at cell centers.
    pub cot_theta_center: Vec<f64>,
    /// `cot θ` at the `j+½` interface.
    pub cot_theta_interface: Vec<f64>,
}

impl GeometricFactors {
    /// Computes geometric factors from the θ and φ interface grids.
    ///
    /// `theta_interfaces` and `phi_interfaces` hold interface values indexed
    /// `0..=n`, i.e. one more entry than the number of cells. Angular
    /// factors are left empty where `dim` does not carry that direction,
    /// matching the rank-0 1D-core collapse of §3.3.
    #[must_use]
    pub fn precompute(theta_interfaces: &[f64], phi_interfaces: &[f64], dim: Dimensionality) -> Self {
        if !dim.has_theta() {
            return Self::default();
        }

        let n_theta = theta_interfaces.len() - 1;
        let mut d_cos_theta = Vec::with_capacity(n_theta);
        let mut d_theta = Vec::with_capacity(n_theta);
        let mut sin_theta_center = Vec::with_capacity(n_theta);
        let mut sin_theta_interface = Vec::with_capacity(n_theta);
        let mut cot_theta_center = Vec::with_capacity(n_theta);
        let mut cot_theta_interface = Vec::with_capacity(n_theta);

        for j in 0..n_theta {
            let theta_lo = theta_interfaces[j];
            let theta_hi = theta_interfaces[j + 1];
            let theta_mid = 0.5 * (theta_lo + theta_hi);

            d_cos_theta.push(theta_lo.cos() - theta_hi.cos());
            d_theta.push(theta_hi - theta_lo);
            sin_theta_center.push(theta_mid.sin());
            sin_theta_interface.push(theta_hi.sin());
            cot_theta_center.push(theta_mid.cos() / theta_mid.sin());
            cot_theta_interface.push(theta_hi.cos() / theta_hi.sin());
        }

        let d_phi = if dim.has_phi() {
            phi_interfaces
                .windows(2)
                .map(|w| w[1] - w[0])
                .collect()
        } else {
            Vec::new()
        };

        Self {
            d_cos_theta,
            d_theta,
            d_phi,
            sin_theta_center,
            sin_theta_interface,
            cot_theta_center,
            cot_theta_interface,
        }
    }
}

/// Radial face area at interface radius `r`, for the cell ring `(j, k)`.
///
/// 1D: `4π r²` (the full solid angle). 2D: the φ-integrated ring area using
/// `d_cos_theta[j] · 2π`. 3D: the (j,k) cell's true solid-angle wedge area
/// `d_cos_theta[j] · d_phi[k]`.
#[must_use]
pub fn radial_face_area(r: f64, geom: &GeometricFactors, j: usize, dim: Dimensionality) -> f64 {
    let solid_angle = match dim {
        Dimensionality::OneD => 4.0 * std::f64::consts::PI,
        Dimensionality::TwoD => 2.0 * std::f64::consts::PI * geom.d_cos_theta[j],
        Dimensionality::ThreeD => geom.d_cos_theta[j] * geom.d_phi_or_full(),
    };
    r * r * solid_angle
}

impl GeometricFactors {
    /// `d_phi[k]` is per-cell in 3D but the φ-integral collapses to `2π` in
    /// lower dimensionalities; callers that have not yet indexed by `k`
    /// (e.g. the 2D radial-face-area formula above) use this helper which
    /// only makes sense once `d_phi` is populated.
    fn d_phi_or_full(&self) -> f64 {
        self.d_phi.iter().sum()
    }
}

/// Polar face area at interface θ, spanning azimuthal width `d_phi[k]`
/// (1.0 stand-in in 2D, where φ does not enter).
#[must_use]
pub fn polar_face_area(r_inner: f64, r_outer: f64, sin_theta_interface: f64, d_phi: f64, dim: Dimensionality) -> f64 {
    let delta_r_sq = 0.5 * (r_outer * r_outer - r_inner * r_inner);
    match dim {
        Dimensionality::OneD => 0.0,
        Dimensionality::TwoD => delta_r_sq * sin_theta_interface * 2.0 * std::f64::consts::PI / d_phi.max(1.0),
        Dimensionality::ThreeD => delta_r_sq * sin_theta_interface * d_phi,
    }
}

/// Azimuthal face area at interface φ, spanning the cell's radial and polar
/// extent. Zero in 1D/2D (no φ faces to cross).
#[must_use]
pub fn azimuthal_face_area(r_inner: f64, r_outer: f64, d_theta: f64, dim: Dimensionality) -> f64 {
    if dim.has_phi() {
        0.5 * (r_outer * r_outer - r_inner * r_inner) * d_theta
    } else {
        0.0
    }
}

/// Cell volume of the `(i, j, k)` cell bounded by `[r_inner, r_outer]`.
#[must_use]
pub fn cell_volume(r_inner: f64, r_outer: f64, geom: &GeometricFactors, j: usize, dim: Dimensionality) -> f64 {
    let radial = (r_outer.powi(3) - r_inner.powi(3)) / 3.0;
    let solid_angle = match dim {
        Dimensionality::OneD => 4.0 * std::f64::consts::PI,
        Dimensionality::TwoD => 2.0 * std::f64::consts::PI * geom.d_cos_theta[j],
        Dimensionality::ThreeD => geom.d_cos_theta[j] * geom.d_phi_or_full(),
    };
    radial * solid_angle
}

/// Convenience for kernels that need the owned θ-cell index range aligned
/// with a [`GeometricFactors`] table built from the same grid.
#[must_use]
pub fn theta_cell_range(geom: &GeometricFactors) -> IndexRange {
    IndexRange::new(0, geom.d_cos_theta.len())
}
