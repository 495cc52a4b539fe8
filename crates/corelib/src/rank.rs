//! Tensor rank of field quantities and how each rank responds to a rotation.

use crate::{Tensor, Vector};

/// Rank of a field quantity: 0 for scalars, 1 for vectors, 2 for tensors.
pub trait Rank {
    const RANK: u8;
}

impl Rank for f64 {
    const RANK: u8 = 0;
}

impl Rank for Vector {
    const RANK: u8 = 1;
}

impl Rank for Tensor {
    const RANK: u8 = 2;
}

/// Quantity that can be carried through a rotation.
///
/// `rotated` assumes `r` is orthogonal. Translation never applies here; only
/// positions pick up a translation, see [`crate::transformer::Transformer`].
pub trait Transformable: Rank + Copy {
    fn rotated(&self, r: &Tensor) -> Self;
}

impl Transformable for f64 {
    #[inline]
    fn rotated(&self, _r: &Tensor) -> Self {
        *self
    }
}

impl Transformable for Vector {
    #[inline]
    fn rotated(&self, r: &Tensor) -> Self {
        *r * *self
    }
}

impl Transformable for Tensor {
    /// R . T . R^T
    #[inline]
    fn rotated(&self, r: &Tensor) -> Self {
        *r * *self * r.transpose()
    }
}

/// Orthogonal rotation tensor of `degrees` about `axis` (need not be unit length).
///
/// A zero axis yields the identity.
pub fn rotation_from_axis_angle(axis: Vector, degrees: f64) -> Tensor {
    let axis = axis.normalize_or_zero();
    if axis == Vector::ZERO {
        return Tensor::IDENTITY;
    }
    Tensor::from_axis_angle(axis, degrees.to_radians())
}
