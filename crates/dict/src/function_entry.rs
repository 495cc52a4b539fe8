//! Named directives (`#name ...`) executed while a dictionary is read.
//!
//! Two tables: directives that act on the enclosing dictionary, and
//! directives that appear inside a primitive entry and act on that entry.

use std::collections::HashMap;
use std::fmt;

use core_types::{CoreError, CoreResult};

use crate::dictionary::{Dictionary, PrimitiveEntry};
use crate::stream::{InputStream, Token};

/// Directive acting on the parent dictionary.
pub type DictionaryFunction = Box<
    dyn Fn(&FunctionEntryTable, &mut Dictionary, &mut InputStream) -> CoreResult<bool>
        + Send
        + Sync,
>;

/// Directive acting on the primitive entry being read.
pub type EntryFunction = Box<
    dyn Fn(&FunctionEntryTable, &Dictionary, &mut PrimitiveEntry, &mut InputStream) -> CoreResult<bool>
        + Send
        + Sync,
>;

#[derive(Default)]
pub struct FunctionEntryTable {
    dictionary_fns: HashMap<String, DictionaryFunction>,
    entry_fns: HashMap<String, EntryFunction>,
}

impl FunctionEntryTable {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables holding `#include`, `#includeIfPresent`, `#remove` and `#inputMode`.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        crate::directives::register_builtins(&mut table);
        table
    }

    pub fn register_dictionary_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FunctionEntryTable, &mut Dictionary, &mut InputStream) -> CoreResult<bool>
            + Send
            + Sync
            + 'static,
    {
        self.dictionary_fns.insert(name.into(), Box::new(f));
    }

    pub fn register_entry_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FunctionEntryTable, &Dictionary, &mut PrimitiveEntry, &mut InputStream) -> CoreResult<bool>
            + Send
            + Sync
            + 'static,
    {
        self.entry_fns.insert(name.into(), Box::new(f));
    }

    pub fn dictionary_names(&self) -> Vec<String> {
        sorted_names(&self.dictionary_fns)
    }

    pub fn entry_names(&self) -> Vec<String> {
        sorted_names(&self.entry_fns)
    }

    /// Run dictionary-level directive `name`.
    pub fn execute(
        &self,
        name: &str,
        parent: &mut Dictionary,
        is: &mut InputStream,
    ) -> CoreResult<bool> {
        let Some(f) = self.dictionary_fns.get(name) else {
            return Err(unknown(name, is, self.dictionary_names()));
        };
        f(self, parent, is)
    }

    /// Run entry-level directive `name` on `entry`.
    pub fn execute_in_entry(
        &self,
        name: &str,
        parent: &Dictionary,
        entry: &mut PrimitiveEntry,
        is: &mut InputStream,
    ) -> CoreResult<bool> {
        let Some(f) = self.entry_fns.get(name) else {
            return Err(unknown(name, is, self.entry_names()));
        };
        log::debug!(
            "{}:{}: executing #{name} in entry '{}'",
            is.name(),
            is.line_number(),
            entry.keyword()
        );
        f(self, parent, entry, is)
    }

    /// Parse `text` as dictionary entries into `parent`.
    pub fn insert(&self, parent: &mut Dictionary, text: &str) -> CoreResult<bool> {
        let mut is = InputStream::new(parent.name().to_string(), text);
        parent.read(&mut is, Some(self))?;
        Ok(true)
    }

    /// Parse `text` as tokens appended to `entry`.
    pub fn insert_into_entry(
        &self,
        parent: &Dictionary,
        entry: &mut PrimitiveEntry,
        text: &str,
    ) -> CoreResult<bool> {
        let mut is = InputStream::new(parent.name().to_string(), text);
        entry.read_tokens(parent, &mut is, Some(self), false)?;
        Ok(true)
    }
}

fn sorted_names<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

fn unknown(name: &str, is: &InputStream, valid: Vec<String>) -> CoreError {
    CoreError::UnknownFunctionEntry {
        name: name.to_string(),
        source_name: is.name().to_string(),
        line: is.line_number(),
        valid,
    }
}

impl fmt::Debug for FunctionEntryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEntryTable")
            .field("dictionary_fns", &self.dictionary_names())
            .field("entry_fns", &self.entry_names())
            .finish()
    }
}

/// Directive kept unexecuted: its keyword and the rest of its line.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionEntry {
    keyword: String,
    tokens: Vec<Token>,
    line: usize,
}

impl FunctionEntry {
    /// Capture the remainder of the current line of `is`.
    pub fn new(keyword: impl Into<String>, is: &mut InputStream) -> Self {
        let line = is.line_number();
        let rest = is.read_line();
        let tokens = if rest.is_empty() {
            Vec::new()
        } else {
            vec![Token::Word(rest)]
        };
        Self {
            keyword: keyword.into(),
            tokens,
            line,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl fmt::Display for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keyword)?;
        for tok in &self.tokens {
            write!(f, " {tok}")?;
        }
        writeln!(f)
    }
}
