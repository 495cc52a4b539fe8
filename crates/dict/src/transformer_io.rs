//! Reading and writing [`Transformer`]s as dictionaries.
//!
//! ```text
//! translation (1 0 0);
//! rotation    (0 -1 0 1 0 0 0 0 1);      // row-major, or:
//! rotation    { axis (0 0 1); angle 90; } // degrees
//! ```
//!
//! Absent parts stay inactive.

use core_types::{CoreError, CoreResult};
use corelib::{
    Tensor, Transformer, Vector, rotation_from_axis_angle, tensor_from_rows, tensor_to_rows,
};

use crate::dictionary::{Dictionary, Entry};
use crate::stream::Token;

pub fn read_transformer(dict: &Dictionary) -> CoreResult<Transformer> {
    let mut tr = Transformer::new();

    if dict.contains("translation") {
        tr.set_translation(dict.read_vector("translation")?);
    }

    match dict.get("rotation") {
        Some(Entry::Dict(sub)) => {
            let axis = sub.read_vector("axis")?;
            if axis == Vector::ZERO {
                return Err(CoreError::bad_value("axis", "rotation axis must be non-zero"));
            }
            let angle = sub.read_scalar("angle")?;
            tr.set_rotation(rotation_from_axis_angle(axis, angle));
        }
        Some(_) => tr.set_rotation(tensor_from_rows(dict.read_tensor("rotation")?)),
        None => {}
    }

    Ok(tr)
}

/// Apply every sub-dictionary of `dict`, in order, with
/// [`Transformer::compose_with`].
pub fn read_transformer_chain(dict: &Dictionary) -> CoreResult<Transformer> {
    let mut composed = Transformer::new();
    for (name, entry) in dict.iter() {
        let Entry::Dict(sub) = entry else {
            log::debug!("Skipping non-dictionary entry '{name}' in '{}'", dict.name());
            continue;
        };
        let tr = read_transformer(sub)?;
        log::debug!(
            "Transform '{name}': translates={} rotates={}",
            tr.translates(),
            tr.rotates()
        );
        composed.compose_with(&tr);
    }
    Ok(composed)
}

/// Dictionary holding the active parts of `tr`. The translation is written
/// when it is non-zero or the transform is a pure translation.
pub fn write_transformer(tr: &Transformer) -> Dictionary {
    let mut dict = Dictionary::new();
    if tr.translates() || *tr.t() != Vector::ZERO {
        dict.set_primitive("translation", vector_tokens(tr.t()));
    }
    if tr.rotates() {
        dict.set_primitive("rotation", tensor_tokens(tr.r()));
    }
    dict
}

fn parenthesised(values: &[f64]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(values.len() + 2);
    tokens.push(Token::Punct('('));
    tokens.extend(values.iter().map(|&v| Token::Number(v)));
    tokens.push(Token::Punct(')'));
    tokens
}

pub fn vector_tokens(v: &Vector) -> Vec<Token> {
    parenthesised(&v.to_array())
}

pub fn tensor_tokens(t: &Tensor) -> Vec<Token> {
    parenthesised(&tensor_to_rows(t))
}
