//! Interval arithmetic for classifying constraint feasibility.
//!
//! Given per-variable bounds, the engine computes the value range of a
//! [`Function`] by propagating intervals through its monomials: intervals
//! add component-wise, scalar multiplication scales (flipping the order for
//! negative scalars), and interval products take the min/max over the four
//! corner products. This is used only to classify a single constraint
//! before transformation, not for bound propagation across constraints.

use std::collections::BTreeMap;

use crate::algebra::Function;
use crate::error::{ModelError, Result};

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    /// Lower endpoint.
    pub lower: f64,
    /// Upper endpoint.
    pub upper: f64,
}

impl Bound {
    /// Creates `[lower, upper]`. The caller is responsible for
    /// `lower <= upper`; model construction validates this.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// The point interval `[v, v]`.
    pub fn point(v: f64) -> Self {
        Self { lower: v, upper: v }
    }

    /// The binary-variable interval `[0, 1]`.
    pub fn binary() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// Component-wise sum.
    pub fn add(self, other: Bound) -> Bound {
        Bound::new(self.lower + other.lower, self.upper + other.upper)
    }

    /// Scalar multiple; a negative scalar flips the endpoints.
    pub fn scale(self, factor: f64) -> Bound {
        if factor >= 0.0 {
            Bound::new(self.lower * factor, self.upper * factor)
        } else {
            Bound::new(self.upper * factor, self.lower * factor)
        }
    }

    /// Interval product: min/max over the four corner products.
    pub fn mul(self, other: Bound) -> Bound {
        let corners = [
            self.lower * other.lower,
            self.lower * other.upper,
            self.upper * other.lower,
            self.upper * other.upper,
        ];
        let lower = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let upper = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Bound::new(lower, upper)
    }

    /// The width `upper - lower`.
    pub fn width(self) -> f64 {
        self.upper - self.lower
    }
}

/// Evaluates the value range of `function` under the given per-variable
/// bounds.
///
/// Fails with [`ModelError::UnknownVariable`] if a nonzero term references
/// an id absent from `bounds`.
pub fn function_bound(function: &Function, bounds: &BTreeMap<u64, Bound>) -> Result<Bound> {
    let mut total = Bound::point(0.0);
    for (monomial, coefficient) in function.terms() {
        if coefficient == 0.0 {
            continue;
        }
        let mut term = Bound::point(1.0);
        for &id in &monomial {
            let b = bounds.get(&id).ok_or(ModelError::UnknownVariable(id))?;
            term = term.mul(*b);
        }
        total = total.add(term.scale(coefficient));
    }
    Ok(total)
}
