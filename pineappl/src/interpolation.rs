//! Interpolation module.

use super::convert;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::mem;
use std::ops::IndexMut;

const MAX_INTERP_ORDER_PLUS_ONE: usize = 8;

mod applgrid {
    pub fn reweight_x(x: f64) -> f64 {
        (x.sqrt() / (1.0 - 0.99 * x)).powi(3)
    }

    pub fn fx2(y: f64) -> f64 {
        let mut yp = y;

        for _ in 0..100 {
            let x = (-yp).exp();
            let delta = y - yp - 5.0 * (1.0 - x);
            if delta.abs() < 1e-12 {
                return x;
            }
            let deriv = -1.0 - 5.0 * x;
            yp -= delta / deriv;
        }

        unreachable!();
    }

    pub fn fy2(x: f64) -> f64 {
        (1.0 - x).mul_add(5.0, -x.ln())
    }

    pub fn ftau0(q2: f64) -> f64 {
        (q2 / 0.0625).ln().ln()
    }

    pub fn fq20(tau: f64) -> f64 {
        0.0625 * tau.exp().exp()
    }
}

fn lagrange_weights(i: usize, n: usize, u: f64) -> f64 {
    let mut factorials = 1;
    let mut product = 1.0;
    for z in 0..i {
        product *= u - convert::f64_from_usize(z);
        factorials *= i - z;
    }
    for z in i + 1..=n {
        product *= convert::f64_from_usize(z) - u;
        factorials *= z - i;
    }
    product / convert::f64_from_usize(factorials)
}

/// TODO
#[derive(Clone, Copy, Deserialize, Serialize)]
pub enum ReweightMeth {
    /// TODO
    ApplGridX,
    /// TODO
    NoReweight,
}

/// TODO
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum Map {
    /// TODO
    ApplGridF2,
    /// TODO
    ApplGridH0,
}

/// TODO
#[derive(Clone, Deserialize, Serialize)]
pub enum InterpMeth {
    /// TODO
    Lagrange,
}

/// TODO
#[derive(Clone, Deserialize, Serialize)]
pub struct Interp {
    min: f64,
    max: f64,
    nodes: usize,
    order: usize,
    reweight: ReweightMeth,
    map: Map,
    interp_meth: InterpMeth,
}

impl Interp {
    /// TODO
    ///
    /// # Panics
    ///
    /// Panics if `nodes` is `0`, or if `nodes` is smaller or equal to `order` or if `order` is
    /// larger than some internally specified maximum.
    pub fn new(
        min: f64,
        max: f64,
        nodes: usize,
        order: usize,
        reweight: ReweightMeth,
        map: Map,
        interp_meth: InterpMeth,
    ) -> Self {
        // minimum must be larger or equal to the maximum
        assert!(min <= max);
        // for interpolation to work `nodes` has to be at least `1`
        assert!(nodes > 0);
        // for each interpolated point `order + 1` nodes are updated
        assert!(nodes > order);
        // using arrays with fixed size limit the possible max value of `order`
        assert!(order < MAX_INTERP_ORDER_PLUS_ONE);

        let mut result = Self {
            min: 0.0,
            max: 0.0,
            nodes,
            order,
            reweight,
            map,
            interp_meth,
        };

        result.min = result.map_x_to_y(min);
        result.max = result.map_x_to_y(max);

        // for some maps the minimum in x is mapped to the maximum in y
        if result.min > result.max {
            // TODO: alternatively we have to modify our range check in `Self::interpolate`, which
            // has the advantage that we don't swap min and max in `x` space
            mem::swap(&mut result.min, &mut result.max);
        }

        result
    }

    fn deltay(&self) -> f64 {
        (self.max - self.min) / convert::f64_from_usize(self.nodes - 1)
    }

    fn gety(&self, index: usize) -> f64 {
        convert::f64_from_usize(index).mul_add(self.deltay(), self.min)
    }

    /// TODO
    pub fn reweight(&self, x: f64) -> f64 {
        match self.reweight {
            ReweightMeth::ApplGridX => applgrid::reweight_x(x),
            ReweightMeth::NoReweight => return 1.0,
        }
    }

    /// TODO
    pub fn interpolate(&self, x: f64) -> Option<(usize, f64)> {
        let y = self.map_x_to_y(x);

        // points falling outside the interpolation range shouldn't happen very often, because when
        // it does it degrades the interpolation quality
        if (self.min > y) || (y > self.max) {
            return None;
        }

        if self.nodes == 1 {
            // TODO: is the `y_fraction` correct?
            Some((0, 0.0))
        } else {
            let index = convert::usize_from_f64(
                (y - self.min) / self.deltay() - convert::f64_from_usize(self.order / 2),
            )
            .min(self.nodes - self.order - 1);
            let y_fraction = (y - self.gety(index)) / self.deltay();

            Some((index, y_fraction))
        }
    }

    /// TODO
    pub fn node_weights(&self, fraction: f64) -> ArrayVec<f64, MAX_INTERP_ORDER_PLUS_ONE> {
        (0..=self.order)
            .map(|i| match self.interp_meth {
                InterpMeth::Lagrange => lagrange_weights(i, self.order, fraction),
            })
            .collect()
    }

    /// TODO
    pub fn order(&self) -> usize {
        self.order
    }

    /// TODO
    pub fn node_values(&self) -> Vec<f64> {
        (0..self.nodes)
            .map(|node| self.map_y_to_x(self.gety(node)))
            .collect()
    }

    fn map_y_to_x(&self, y: f64) -> f64 {
        match self.map {
            Map::ApplGridF2 => applgrid::fx2(y),
            Map::ApplGridH0 => applgrid::fq20(y),
        }
    }

    fn map_x_to_y(&self, x: f64) -> f64 {
        match self.map {
            Map::ApplGridF2 => applgrid::fy2(x),
            Map::ApplGridH0 => applgrid::ftau0(x),
        }
    }

    /// TODO
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// TODO
    pub fn min(&self) -> f64 {
        self.min
    }

    /// TODO
    pub fn max(&self) -> f64 {
        self.max
    }

    /// TODO
    pub fn map(&self) -> Map {
        self.map
    }
}

/// TODO
pub fn interpolate<const D: usize>(
    interps: &[Interp],
    ntuple: &[f64],
    weight: f64,
    array: &mut impl IndexMut<[usize; D], Output = f64>,
) -> bool {
    use super::packed_array;
    use itertools::Itertools;

    if weight == 0.0 {
        return false;
    }

    // we must have as many variables as we want to interpolate
    debug_assert_eq!(interps.len(), ntuple.len());
    debug_assert_eq!(interps.len(), D);

    let Some((indices, fractions)): Option<(ArrayVec<_, D>, ArrayVec<_, D>)> = interps
        .iter()
        .zip(ntuple)
        .map(|(interp, &x)| interp.interpolate(x))
        .collect()
    else {
        return false;
    };

    // TODO: add static value detection

    let weight = weight
        / interps
            .iter()
            .zip(ntuple)
            .map(|(interp, &x)| interp.reweight(x))
            .product::<f64>();

    let node_weights: ArrayVec<_, D> = interps
        .iter()
        .zip(fractions)
        .map(|(interp, fraction)| interp.node_weights(fraction))
        .collect();

    let shape: ArrayVec<_, D> = interps.iter().map(|interp| interp.order() + 1).collect();

    for (i, node_weights) in node_weights
        .into_iter()
        // TODO: replace this with something else to avoid allocating memory
        .multi_cartesian_product()
        .enumerate()
    {
        let mut index = packed_array::unravel_index::<D>(i, &shape);
        for (entry, start_index) in index.iter_mut().zip(&indices) {
            *entry += start_index;
        }
        array[index] += weight * node_weights.iter().product::<f64>();
    }

    true
}
