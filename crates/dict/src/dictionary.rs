//! Keyword dictionary: primitive entries, sub-dictionaries and captured
//! function entries, read from an [`InputStream`].

use std::fmt;
use std::path::Path;

use core_types::{CoreError, CoreResult};
use corelib::Vector;

use crate::function_entry::{FunctionEntry, FunctionEntryTable};
use crate::stream::{InputStream, Token};

/// How a duplicate keyword is handled while reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Sub-dictionaries merge, primitive entries are replaced.
    #[default]
    Merge,
    Overwrite,
    /// Keep the existing entry silently.
    Protect,
    /// Keep the existing entry and log a warning.
    Warn,
    Error,
}

impl InputMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "merge" | "default" => Some(Self::Merge),
            "overwrite" => Some(Self::Overwrite),
            "protect" => Some(Self::Protect),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// `keyword tokens... ;`
#[derive(Clone, Debug)]
pub struct PrimitiveEntry {
    keyword: String,
    tokens: Vec<Token>,
    line: usize,
}

impl PrimitiveEntry {
    pub fn new(keyword: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            keyword: keyword.into(),
            tokens,
            line: 0,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn push(&mut self, tok: Token) {
        self.tokens.push(tok);
    }

    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Append tokens from `is` until `;` at parenthesis depth 0 (consumed).
    /// Without `require_semicolon` the whole input is read and a depth-0 `;`
    /// is an error. `#name` words dispatch to the entry-level table.
    pub fn read_tokens(
        &mut self,
        parent: &Dictionary,
        is: &mut InputStream,
        table: Option<&FunctionEntryTable>,
        require_semicolon: bool,
    ) -> CoreResult<()> {
        let mut depth = 0usize;
        loop {
            let Some(tok) = is.next_token()? else {
                if require_semicolon {
                    return Err(is.parse_error(format!(
                        "Unexpected end of input in entry '{}', expected ';'",
                        self.keyword
                    )));
                }
                return Ok(());
            };

            match &tok {
                Token::Punct(';') if depth == 0 => {
                    if require_semicolon {
                        return Ok(());
                    }
                    return Err(is.parse_error(format!(
                        "Unexpected ';' in tokens inserted into entry '{}'",
                        self.keyword
                    )));
                }
                Token::Punct('(') => depth += 1,
                Token::Punct(')') => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| is.parse_error("Unbalanced ')'"))?;
                }
                Token::Punct(c @ ('{' | '}')) => {
                    return Err(is.parse_error(format!(
                        "Unexpected '{c}' in entry '{}'",
                        self.keyword
                    )));
                }
                _ => {}
            }

            if let Some(name) = tok.directive() {
                if let Some(table) = table {
                    let name = name.to_string();
                    if !table.execute_in_entry(&name, parent, self, is)? {
                        log::warn!("functionEntry #{name} in '{}' reported failure", self.keyword);
                    }
                    continue;
                }
                log::warn!(
                    "{}:{}: no functionEntry table, keeping '{}' unexpanded",
                    is.name(),
                    is.line_number(),
                    tok
                );
            }
            self.tokens.push(tok);
        }
    }

    pub fn scalar(&self) -> CoreResult<f64> {
        match self.tokens.as_slice() {
            [Token::Number(v)] => Ok(*v),
            _ => Err(CoreError::bad_value(&self.keyword, "expected a single number")),
        }
    }

    pub fn vector(&self) -> CoreResult<Vector> {
        let c = numbers_in_parens(&self.keyword, &self.tokens, 3)?;
        Ok(Vector::new(c[0], c[1], c[2]))
    }

    /// Nine row-major components `(xx xy xz yx yy yz zx zy zz)`.
    pub fn tensor_rows(&self) -> CoreResult<[f64; 9]> {
        let c = numbers_in_parens(&self.keyword, &self.tokens, 9)?;
        let mut rows = [0.0; 9];
        rows.copy_from_slice(&c);
        Ok(rows)
    }

    /// `( (x y z) (x y z) ... )`
    pub fn vector_list(&self) -> CoreResult<Vec<Vector>> {
        let bad = |msg: &str| CoreError::bad_value(&self.keyword, msg);
        let inner = match self.tokens.as_slice() {
            [first, inner @ .., last] if first.is_punct('(') && last.is_punct(')') => inner,
            _ => return Err(bad("expected a parenthesised list of vectors")),
        };
        inner
            .chunks(5)
            .map(|chunk| {
                if chunk.len() != 5 {
                    return Err(bad("truncated vector in list"));
                }
                let c = numbers_in_parens(&self.keyword, chunk, 3)?;
                Ok(Vector::new(c[0], c[1], c[2]))
            })
            .collect()
    }
}

/// Line numbers are provenance only.
impl PartialEq for PrimitiveEntry {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword && self.tokens == other.tokens
    }
}

fn numbers_in_parens(keyword: &str, tokens: &[Token], n: usize) -> CoreResult<Vec<f64>> {
    let inner = match tokens {
        [first, inner @ .., last] if first.is_punct('(') && last.is_punct(')') => inner,
        _ => {
            return Err(CoreError::bad_value(
                keyword,
                format!("expected ({n} numbers)"),
            ));
        }
    };
    if inner.len() != n {
        return Err(CoreError::bad_value(
            keyword,
            format!("expected {n} components, found {}", inner.len()),
        ));
    }
    inner
        .iter()
        .map(|t| {
            t.as_number()
                .ok_or_else(|| CoreError::bad_value(keyword, format!("'{t}' is not a number")))
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Primitive(PrimitiveEntry),
    Dict(Dictionary),
    /// Directive captured unexecuted, written back verbatim.
    Function(FunctionEntry),
}

/// Ordered keyword -> entry map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    name: String,
    entries: Vec<(String, Entry)>,
    input_mode: InputMode,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Read a whole file, executing directives through `table`.
    pub fn read_file(path: impl AsRef<Path>, table: &FunctionEntryTable) -> CoreResult<Self> {
        let mut is = InputStream::from_path(&path)?;
        let mut dict = Self::named(is.name().to_string());
        dict.read(&mut is, Some(table))?;
        Ok(dict)
    }

    pub fn parse_str(
        name: &str,
        text: &str,
        table: Option<&FunctionEntryTable>,
    ) -> CoreResult<Self> {
        let mut is = InputStream::new(name, text);
        let mut dict = Self::named(name);
        dict.read(&mut is, table)?;
        Ok(dict)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    /// Read entries until end of input.
    ///
    /// Without a table, `#name` lines are not executed: they are captured as
    /// [`FunctionEntry`] values and reading continues.
    pub fn read(
        &mut self,
        is: &mut InputStream,
        table: Option<&FunctionEntryTable>,
    ) -> CoreResult<()> {
        self.read_entries(is, table, false)
    }

    fn read_entries(
        &mut self,
        is: &mut InputStream,
        table: Option<&FunctionEntryTable>,
        in_braces: bool,
    ) -> CoreResult<()> {
        loop {
            let Some(tok) = is.next_token()? else {
                if in_braces {
                    return Err(is.parse_error(format!(
                        "Unexpected end of input in '{}', expected '}}'",
                        self.name
                    )));
                }
                return Ok(());
            };

            if tok.is_punct('}') {
                if in_braces {
                    return Ok(());
                }
                return Err(is.parse_error("Unbalanced '}'"));
            }

            if let Some(name) = tok.directive() {
                let name = name.to_string();
                match table {
                    Some(table) => {
                        log::debug!("{}:{}: executing #{name}", is.name(), is.line_number());
                        if !table.execute(&name, self, is)? {
                            log::warn!("functionEntry #{name} reported failure");
                        }
                    }
                    None => {
                        log::warn!(
                            "{}:{}: no functionEntry table, not executing #{name}",
                            is.name(),
                            is.line_number()
                        );
                        let fe = FunctionEntry::new(format!("#{name}"), is);
                        self.entries
                            .push((fe.keyword().to_string(), Entry::Function(fe)));
                    }
                }
                continue;
            }

            let keyword = match &tok {
                Token::Word(w) | Token::Str(w) => w.clone(),
                other => {
                    return Err(is.parse_error(format!("Expected keyword, found '{other}'")));
                }
            };
            let line = is.line_number();

            if is.peek_token()?.is_some_and(|t| t.is_punct('{')) {
                is.next_token()?;
                let mut sub = Dictionary::named(self.scoped(&keyword));
                sub.input_mode = self.input_mode;
                sub.read_entries(is, table, true)?;
                // Directives inside may have changed the mode.
                self.input_mode = sub.input_mode;
                self.add(keyword, Entry::Dict(sub), line)?;
            } else {
                let mut entry = PrimitiveEntry::new(keyword.clone(), Vec::new());
                entry.line = line;
                entry.read_tokens(self, is, table, true)?;
                self.add(keyword, Entry::Primitive(entry), line)?;
            }
        }
    }

    fn scoped(&self, keyword: &str) -> String {
        if self.name.is_empty() {
            keyword.to_string()
        } else {
            format!("{}/{keyword}", self.name)
        }
    }

    /// Add an entry following the current [`InputMode`].
    pub fn add(&mut self, keyword: String, entry: Entry, line: usize) -> CoreResult<()> {
        let Some(idx) = self.position(&keyword) else {
            self.entries.push((keyword, entry));
            return Ok(());
        };

        match self.input_mode {
            InputMode::Merge => match (&mut self.entries[idx].1, entry) {
                (Entry::Dict(existing), Entry::Dict(incoming)) => existing.merge(incoming),
                (slot, entry) => *slot = entry,
            },
            InputMode::Overwrite => self.entries[idx].1 = entry,
            InputMode::Protect => {
                log::debug!("Keeping protected entry '{keyword}' (line {line})");
            }
            InputMode::Warn => {
                log::warn!("Duplicate entry '{keyword}' on line {line} ignored");
            }
            InputMode::Error => return Err(CoreError::DuplicateEntry { keyword, line }),
        }
        Ok(())
    }

    /// Merge `other` in: sub-dictionaries recursively, everything else replaced.
    pub fn merge(&mut self, other: Dictionary) {
        for (keyword, entry) in other.entries {
            match self.position(&keyword) {
                None => self.entries.push((keyword, entry)),
                Some(idx) => match (&mut self.entries[idx].1, entry) {
                    (Entry::Dict(existing), Entry::Dict(incoming)) => existing.merge(incoming),
                    (slot, entry) => *slot = entry,
                },
            }
        }
    }

    /// Insert or replace, ignoring the input mode.
    pub fn set(&mut self, keyword: impl Into<String>, entry: Entry) {
        let keyword = keyword.into();
        match self.position(&keyword) {
            Some(idx) => self.entries[idx].1 = entry,
            None => self.entries.push((keyword, entry)),
        }
    }

    pub fn set_primitive(&mut self, keyword: impl Into<String>, tokens: Vec<Token>) {
        let keyword = keyword.into();
        let entry = PrimitiveEntry::new(keyword.clone(), tokens);
        self.set(keyword, Entry::Primitive(entry));
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == keyword)
    }

    pub fn get(&self, keyword: &str) -> Option<&Entry> {
        self.position(keyword).map(|i| &self.entries[i].1)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.position(keyword).is_some()
    }

    pub fn remove(&mut self, keyword: &str) -> Option<Entry> {
        self.position(keyword).map(|i| self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    fn missing(&self, keyword: &str) -> CoreError {
        CoreError::MissingEntry {
            keyword: keyword.to_string(),
            dict: self.name.clone(),
        }
    }

    pub fn lookup_primitive(&self, keyword: &str) -> CoreResult<&PrimitiveEntry> {
        match self.get(keyword) {
            Some(Entry::Primitive(e)) => Ok(e),
            Some(_) => Err(CoreError::bad_value(keyword, "expected a primitive entry")),
            None => Err(self.missing(keyword)),
        }
    }

    pub fn sub_dict(&self, keyword: &str) -> CoreResult<&Dictionary> {
        match self.get(keyword) {
            Some(Entry::Dict(d)) => Ok(d),
            Some(_) => Err(CoreError::bad_value(keyword, "expected a sub-dictionary")),
            None => Err(self.missing(keyword)),
        }
    }

    pub fn read_scalar(&self, keyword: &str) -> CoreResult<f64> {
        self.lookup_primitive(keyword)?.scalar()
    }

    pub fn read_vector(&self, keyword: &str) -> CoreResult<Vector> {
        self.lookup_primitive(keyword)?.vector()
    }

    pub fn read_tensor(&self, keyword: &str) -> CoreResult<[f64; 9]> {
        self.lookup_primitive(keyword)?.tensor_rows()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        for (keyword, entry) in &self.entries {
            match entry {
                Entry::Primitive(e) => {
                    write!(f, "{pad}{keyword}")?;
                    write_tokens(f, &e.tokens)?;
                    writeln!(f, ";")?;
                }
                Entry::Dict(d) => {
                    writeln!(f, "{pad}{keyword}")?;
                    writeln!(f, "{pad}{{")?;
                    d.write_indented(f, indent + 1)?;
                    writeln!(f, "{pad}}}")?;
                }
                Entry::Function(fe) => write!(f, "{pad}{fe}")?,
            }
        }
        Ok(())
    }
}

/// Space-separated, without padding just inside parentheses.
fn write_tokens(f: &mut fmt::Formatter<'_>, tokens: &[Token]) -> fmt::Result {
    let mut prev_open = false;
    for tok in tokens {
        if !prev_open && !tok.is_punct(')') {
            f.write_str(" ")?;
        }
        write!(f, "{tok}")?;
        prev_open = tok.is_punct('(');
    }
    Ok(())
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
