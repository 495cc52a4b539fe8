//! Dictionary input: tokens, keyword dictionaries and `#name` function entries.
//! Transformers can be read from and written to dictionaries.

pub mod dictionary;
pub mod directives;
pub mod function_entry;
pub mod stream;
pub mod transformer_io;

pub use dictionary::{Dictionary, Entry, InputMode, PrimitiveEntry};
pub use function_entry::{FunctionEntry, FunctionEntryTable};
pub use stream::{InputStream, Token};
pub use transformer_io::{read_transformer, read_transformer_chain, write_transformer};
