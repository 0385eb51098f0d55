#![warn(missing_docs)]

//! Math types for the pushgym task environment.
//!
//! Thin wrappers around nalgebra providing the few geometric primitives the
//! environment needs: goal distances, axis-aligned clamp boxes for
//! workspace/rotation limits, and bounded vector spaces with affine scaling
//! into and out of the normalized [-1, 1] range.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Errors from bounded-space scaling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpaceError {
    /// A value vector does not match the dimensionality of the space.
    #[error("dimension mismatch: space has {expected} bounds, value has {got}")]
    DimensionMismatch {
        /// Number of bound pairs declared by the space.
        expected: usize,
        /// Length of the offending value vector.
        got: usize,
    },
}

/// Euclidean distance between two 3D points.
pub fn goal_distance(a: &Point3, b: &Point3) -> f64 {
    (a - b).norm()
}

/// Axis-aligned box limits over three spatial (or angular) dimensions.
///
/// Used both for robot workspaces (meters) and rotation limits (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxLimits {
    /// Per-axis lower bounds.
    pub low: [f64; 3],
    /// Per-axis upper bounds.
    pub high: [f64; 3],
}

impl BoxLimits {
    /// Create box limits from per-axis lower and upper bounds.
    pub fn new(low: [f64; 3], high: [f64; 3]) -> Self {
        Self { low, high }
    }

    /// Lower/upper bounds for one axis.
    pub fn axis(&self, i: usize) -> (f64, f64) {
        (self.low[i], self.high[i])
    }

    /// Clamp a scalar into the limits of one axis.
    pub fn clamp_axis(&self, i: usize, value: f64) -> f64 {
        value.clamp(self.low[i], self.high[i])
    }

    /// Clamp a point independently per axis.
    pub fn clamp_point(&self, p: &Point3) -> Point3 {
        Point3::new(
            self.clamp_axis(0, p.x),
            self.clamp_axis(1, p.y),
            self.clamp_axis(2, p.z),
        )
    }

    /// Clamp a 3-element slice independently per axis, in place.
    pub fn clamp_slice(&self, values: &mut [f64; 3]) {
        for i in 0..3 {
            values[i] = self.clamp_axis(i, values[i]);
        }
    }

    /// True if the point lies inside the box on every axis.
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| {
            let v = [p.x, p.y, p.z][i];
            v >= self.low[i] && v <= self.high[i]
        })
    }

    /// The per-axis bound pairs, in `[low, high]` form.
    pub fn bound_pairs(&self) -> [[f64; 2]; 3] {
        [
            [self.low[0], self.high[0]],
            [self.low[1], self.high[1]],
            [self.low[2], self.high[2]],
        ]
    }
}

/// An ordered list of `[low, high]` bound pairs describing a flat vector.
///
/// This is the declared shape of observation and action spaces. Scaling is
/// an element-wise affine map; `scale_to_normalized` followed by
/// `scale_from_normalized` reproduces the input up to floating-point
/// rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedSpace {
    bounds: Vec<[f64; 2]>,
}

impl BoundedSpace {
    /// Build a space from explicit bound pairs.
    pub fn from_bounds(bounds: Vec<[f64; 2]>) -> Self {
        Self { bounds }
    }

    /// Build a symmetric `[-bound, bound]^dim` space.
    pub fn symmetric(dim: usize, bound: f64) -> Self {
        Self {
            bounds: vec![[-bound, bound]; dim],
        }
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// True if the space has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// The declared bound pairs.
    pub fn bounds(&self) -> &[[f64; 2]] {
        &self.bounds
    }

    /// Per-dimension lower bounds.
    pub fn low(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b[0]).collect()
    }

    /// Per-dimension upper bounds.
    pub fn high(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b[1]).collect()
    }

    fn check_len(&self, values: &[f64]) -> Result<(), SpaceError> {
        if values.len() != self.bounds.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.bounds.len(),
                got: values.len(),
            });
        }
        Ok(())
    }

    /// Map physical values inside the bounds into `[-1, 1]` per dimension.
    pub fn scale_to_normalized(&self, values: &[f64]) -> Result<Vec<f64>, SpaceError> {
        self.check_len(values)?;
        Ok(values
            .iter()
            .zip(&self.bounds)
            .map(|(&v, &[low, high])| {
                let span = high - low;
                if span == 0.0 {
                    // Degenerate axis: everything maps to the midpoint.
                    0.0
                } else {
                    2.0 * (v - low) / span - 1.0
                }
            })
            .collect())
    }

    /// Map normalized `[-1, 1]` values back into the physical bounds.
    pub fn scale_from_normalized(&self, values: &[f64]) -> Result<Vec<f64>, SpaceError> {
        self.check_len(values)?;
        Ok(values
            .iter()
            .zip(&self.bounds)
            .map(|(&v, &[low, high])| low + (v + 1.0) * (high - low) / 2.0)
            .collect())
    }
}
