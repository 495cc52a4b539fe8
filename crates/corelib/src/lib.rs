//! Core types: math re-exports, tensor ranks, Transformer.

pub use glam::{DMat3 as Tensor, DVec3 as Vector, dvec3 as vector};

pub mod rank;
pub mod transformer;

pub use rank::{Rank, Transformable, rotation_from_axis_angle};
pub use transformer::{Transformer, combine, inv};

/// Tensor from nine components in row-major order (xx xy xz yx ... zz).
pub fn tensor_from_rows(c: [f64; 9]) -> Tensor {
    Tensor::from_cols_array(&c).transpose()
}

/// Row-major components of `t`, the inverse of [`tensor_from_rows`].
pub fn tensor_to_rows(t: &Tensor) -> [f64; 9] {
    t.transpose().to_cols_array()
}
