use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::rank::{Rank, Transformable};
use crate::{Tensor, Vector};

/// Rigid transform: optional translation + optional orthogonal rotation.
///
/// `translates`/`rotates` are fast-path flags. They are set when a component
/// is assigned and OR-combined on composition, never derived from the
/// stored values. An inactive translation is treated as zero and an inactive
/// rotation as the identity.
#[derive(Clone, Copy, Debug)]
pub struct Transformer {
    t: Vector,
    translates: bool,
    r: Tensor,
    rotates: bool,
}

impl Transformer {
    pub const IDENTITY: Self = Self {
        t: Vector::ZERO,
        translates: false,
        r: Tensor::IDENTITY,
        rotates: false,
    };

    #[inline]
    pub const fn new() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn from_translation(t: Vector) -> Self {
        Self::from_parts(t, true, Tensor::IDENTITY, false)
    }

    /// `r` must be orthogonal; it is never checked.
    #[inline]
    pub const fn from_rotation(r: Tensor) -> Self {
        Self::from_parts(Vector::ZERO, false, r, true)
    }

    #[inline]
    pub const fn from_translation_rotation(t: Vector, r: Tensor) -> Self {
        Self::from_parts(t, true, r, true)
    }

    /// Build from raw fields, keeping the given flags as-is.
    #[inline]
    pub const fn from_parts(t: Vector, translates: bool, r: Tensor, rotates: bool) -> Self {
        Self {
            t,
            translates,
            r,
            rotates,
        }
    }

    /// Pure translation: translation active and rotation inactive.
    #[inline]
    pub fn translates(&self) -> bool {
        self.translates && !self.rotates
    }

    #[inline]
    pub fn rotates(&self) -> bool {
        self.rotates
    }

    /// Whether a generic quantity is affected (translation never is).
    #[inline]
    pub fn transforms(&self) -> bool {
        self.rotates
    }

    /// Whether a quantity of type `T` is affected: scalars never are,
    /// tensorial quantities only by the rotation.
    #[inline]
    pub fn transforms_type<T: Rank>(&self) -> bool {
        T::RANK != 0 && self.rotates
    }

    #[inline]
    pub fn transforms_position(&self) -> bool {
        self.translates || self.rotates
    }

    #[inline]
    pub fn t(&self) -> &Vector {
        &self.t
    }

    #[inline]
    pub fn r(&self) -> &Tensor {
        &self.r
    }

    /// Mutable translation. Marks the translation active.
    #[inline]
    pub fn t_mut(&mut self) -> &mut Vector {
        self.translates = true;
        &mut self.t
    }

    /// Mutable rotation. Marks the rotation active.
    #[inline]
    pub fn r_mut(&mut self) -> &mut Tensor {
        self.rotates = true;
        &mut self.r
    }

    pub fn transform_position(&self, p: Vector) -> Vector {
        match (self.translates, self.rotates) {
            (true, false) => p + self.t,
            (false, true) => self.r * p,
            (true, true) => self.r * p + self.t,
            (false, false) => p,
        }
    }

    pub fn inv_transform_position(&self, p: Vector) -> Vector {
        match (self.translates, self.rotates) {
            (true, false) => p - self.t,
            (false, true) => self.r.transpose() * p,
            (true, true) => self.r.transpose() * (p - self.t),
            (false, false) => p,
        }
    }

    pub fn transform_positions(&self, ps: &[Vector]) -> Vec<Vector> {
        if !self.transforms_position() {
            return ps.to_vec();
        }
        ps.iter().map(|&p| self.transform_position(p)).collect()
    }

    pub fn inv_transform_positions(&self, ps: &[Vector]) -> Vec<Vector> {
        if !self.transforms_position() {
            return ps.to_vec();
        }
        ps.iter().map(|&p| self.inv_transform_position(p)).collect()
    }

    /// Rotate a quantity. Scalars and non-rotating transforms pass through.
    #[inline]
    pub fn transform<T: Transformable>(&self, x: T) -> T {
        if self.transforms_type::<T>() {
            x.rotated(&self.r)
        } else {
            x
        }
    }

    #[inline]
    pub fn inv_transform<T: Transformable>(&self, x: T) -> T {
        if self.transforms_type::<T>() {
            x.rotated(&self.r.transpose())
        } else {
            x
        }
    }

    pub fn transform_field<T: Transformable>(&self, xs: &[T]) -> Vec<T> {
        if !self.transforms_type::<T>() {
            return xs.to_vec();
        }
        xs.iter().map(|x| x.rotated(&self.r)).collect()
    }

    pub fn inv_transform_field<T: Transformable>(&self, xs: &[T]) -> Vec<T> {
        if !self.transforms_type::<T>() {
            return xs.to_vec();
        }
        let rt = self.r.transpose();
        xs.iter().map(|x| x.rotated(&rt)).collect()
    }

    /// Accumulate `other` into `self`.
    ///
    /// Translations are summed as-is (not rotated), rotation becomes
    /// `other.R . self.R`. Flags are OR-combined.
    pub fn compose_with(&mut self, other: &Transformer) {
        self.t += other.t;
        self.translates = other.translates || self.translates;
        self.r = other.r * self.r;
        self.rotates = other.rotates || self.rotates;
    }

    pub fn set_translation(&mut self, t: Vector) {
        self.translates = true;
        self.t = t;
    }

    pub fn set_rotation(&mut self, r: Tensor) {
        self.rotates = true;
        self.r = r;
    }

    /// Pre-multiply the rotation: `R_self = r . R_self`.
    pub fn rotate_by(&mut self, r: Tensor) {
        self.rotates = true;
        self.r = r * self.r;
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        inv(self)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Inverse of a rigid transform. Uses R^T, so `tr` must be orthogonal.
pub fn inv(tr: &Transformer) -> Transformer {
    match (tr.translates, tr.rotates) {
        (true, false) => Transformer::from_translation(-tr.t),
        (false, true) => Transformer::from_rotation(tr.r.transpose()),
        (true, true) => {
            let rt = tr.r.transpose();
            Transformer::from_translation_rotation(rt * -tr.t, rt)
        }
        (false, false) => Transformer::IDENTITY,
    }
}

/// Binary composition: translations summed, rotations multiplied `tr1.R . tr2.R`.
///
/// Translations are not rotated before summing; this matches
/// [`Transformer::compose_with`] rather than full affine composition.
pub fn combine(tr1: &Transformer, tr2: &Transformer) -> Transformer {
    Transformer::from_parts(
        tr1.t + tr2.t,
        tr1.translates || tr2.translates,
        tr1.r * tr2.r,
        tr1.rotates || tr2.rotates,
    )
}

/// Logical identity: values only, flags ignored.
impl PartialEq for Transformer {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.r == other.r
    }
}

impl Mul for Transformer {
    type Output = Transformer;

    fn mul(self, rhs: Transformer) -> Transformer {
        combine(&self, &rhs)
    }
}

impl Add<Vector> for Transformer {
    type Output = Transformer;

    fn add(self, t: Vector) -> Transformer {
        Transformer::from_parts(self.t + t, true, self.r, self.rotates)
    }
}

impl Add<Transformer> for Vector {
    type Output = Transformer;

    fn add(self, tr: Transformer) -> Transformer {
        Transformer::from_parts(self + tr.t, true, tr.r, tr.rotates)
    }
}

impl Sub<Vector> for Transformer {
    type Output = Transformer;

    fn sub(self, t: Vector) -> Transformer {
        Transformer::from_parts(self.t - t, true, self.r, self.rotates)
    }
}

impl AddAssign<Vector> for Transformer {
    fn add_assign(&mut self, t: Vector) {
        self.translates = true;
        self.t += t;
    }
}

impl SubAssign<Vector> for Transformer {
    fn sub_assign(&mut self, t: Vector) {
        self.translates = true;
        self.t -= t;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::rank::rotation_from_axis_angle;
    use proptest::prelude::*;

    const TOL: f64 = 1e-9;

    fn vector_strategy() -> impl Strategy<Value = Vector> {
        (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
            .prop_map(|(x, y, z)| Vector::new(x, y, z))
    }

    /// Orthogonal tensors from a random axis and angle.
    fn rotation_strategy() -> impl Strategy<Value = Tensor> {
        (
            (-1.0f64..1.0, -1.0f64..1.0, 0.1f64..1.0),
            -360.0f64..360.0,
        )
            .prop_map(|((x, y, z), deg)| rotation_from_axis_angle(Vector::new(x, y, z), deg))
    }

    fn transformer_strategy() -> impl Strategy<Value = Transformer> {
        (
            vector_strategy(),
            any::<bool>(),
            rotation_strategy(),
            any::<bool>(),
        )
            .prop_map(|(t, has_t, r, has_r)| {
                let mut tr = Transformer::new();
                if has_t {
                    tr.set_translation(t);
                }
                if has_r {
                    tr.set_rotation(r);
                }
                tr
            })
    }

    proptest! {
        /// Property: pure translation adds and subtracts t.
        #[test]
        fn prop_translation_only(t in vector_strategy(), p in vector_strategy()) {
            let tr = Transformer::from_translation(t);
            prop_assert_eq!(tr.transform_position(p), p + t);
            prop_assert_eq!(tr.inv_transform_position(p), p - t);
        }

        /// Property: pure rotation multiplies by R and R^T.
        #[test]
        fn prop_rotation_only(r in rotation_strategy(), p in vector_strategy()) {
            let tr = Transformer::from_rotation(r);
            prop_assert_eq!(tr.transform_position(p), r * p);
            prop_assert_eq!(tr.inv_transform_position(p), r.transpose() * p);
        }

        /// Property: inverse position transform undoes the forward one.
        #[test]
        fn prop_round_trip(tr in transformer_strategy(), p in vector_strategy()) {
            let back = tr.inv_transform_position(tr.transform_position(p));
            prop_assert!(back.abs_diff_eq(p, TOL), "{:?} != {:?}", back, p);
        }

        /// Property: inv(T) forward equals T backward.
        #[test]
        fn prop_inverse_law(tr in transformer_strategy(), p in vector_strategy()) {
            let a = inv(&tr).transform_position(p);
            let b = tr.inv_transform_position(p);
            prop_assert!(a.abs_diff_eq(b, TOL), "{:?} != {:?}", a, b);
        }

        /// Property: scalars are never transformed, tensorial types follow rotates().
        #[test]
        fn prop_transforms_by_rank(tr in transformer_strategy()) {
            prop_assert!(!tr.transforms_type::<f64>());
            prop_assert_eq!(tr.transforms_type::<Vector>(), tr.rotates());
            prop_assert_eq!(tr.transforms_type::<Tensor>(), tr.rotates());
        }
    }
}
