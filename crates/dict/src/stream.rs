//! Tokenising input stream with line tracking.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use core_types::{CoreError, CoreResult};

/// Lexical token of the dictionary format.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Word(String),
    /// Double-quoted string, stored without quotes.
    Str(String),
    Number(f64),
    /// One of `{ } ( ) ;`.
    Punct(char),
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) | Token::Str(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }

    /// Name of the directive if this is a `#name` word.
    pub fn directive(&self) -> Option<&str> {
        match self {
            Token::Word(w) => w.strip_prefix('#').filter(|n| !n.is_empty()),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Token::Number(v) => write!(f, "{v}"),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

fn canonical(path: &Path) -> CoreResult<PathBuf> {
    fs::canonicalize(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_punct(c: char) -> bool {
    matches!(c, '{' | '}' | '(' | ')' | ';')
}

/// Named character stream producing [`Token`]s.
pub struct InputStream {
    name: String,
    origin: Option<PathBuf>,
    /// Canonical paths of this file and the files including it.
    include_chain: Vec<PathBuf>,
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl InputStream {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            origin: None,
            include_chain: Vec::new(),
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    /// Open a file; its directory becomes the base for relative includes.
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut is = Self::new(path.display().to_string(), &text);
        is.origin = Some(path.to_path_buf());
        is.include_chain = vec![canonical(path)?];
        Ok(is)
    }

    /// Open `path` as a file included from this stream.
    ///
    /// Fails with a parse error when `path` is already being read further up
    /// the include chain.
    pub fn open_include(&self, path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let target = canonical(path)?;
        if self.include_chain.contains(&target) {
            return Err(self.parse_error(format!("Recursive #include of {}", path.display())));
        }
        let mut is = Self::from_path(path)?;
        is.include_chain = self.include_chain.clone();
        is.include_chain.push(target);
        Ok(is)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Directory of the source file, if the stream came from one.
    pub fn dir(&self) -> Option<&Path> {
        self.origin.as_deref().and_then(Path::parent)
    }

    pub fn parse_error(&self, message: impl Into<String>) -> CoreError {
        CoreError::Parse {
            source_name: self.name.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    pub fn eof(&mut self) -> CoreResult<bool> {
        self.skip_blank()?;
        Ok(self.pos >= self.chars.len())
    }

    /// Remainder of the current line, trimmed. Consumes the newline.
    pub fn read_line(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
        let line: String = self.chars[start..self.pos].iter().collect();
        if self.pos < self.chars.len() {
            self.pos += 1;
            self.line += 1;
        }
        line.trim().to_string()
    }

    pub fn peek_token(&mut self) -> CoreResult<Option<Token>> {
        let (pos, line) = (self.pos, self.line);
        let tok = self.next_token();
        self.pos = pos;
        self.line = line;
        tok
    }

    pub fn next_token(&mut self) -> CoreResult<Option<Token>> {
        self.skip_blank()?;
        let Some(&c) = self.chars.get(self.pos) else {
            return Ok(None);
        };

        if is_punct(c) {
            self.pos += 1;
            return Ok(Some(Token::Punct(c)));
        }

        if c == '"' {
            return self.read_string().map(Some);
        }

        let start = self.pos;
        while let Some(&c) = self.chars.get(self.pos) {
            if c.is_whitespace() || is_punct(c) || c == '"' {
                break;
            }
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        let numeric_start = word
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if numeric_start {
            // inf/nan stay words, whatever their sign.
            if let Some(v) = word.parse::<f64>().ok().filter(|v| v.is_finite()) {
                return Ok(Some(Token::Number(v)));
            }
        }
        Ok(Some(Token::Word(word)))
    }

    /// Next token, failing on end of input.
    pub fn expect_token(&mut self, what: &str) -> CoreResult<Token> {
        self.next_token()?
            .ok_or_else(|| self.parse_error(format!("Unexpected end of input, expected {what}")))
    }

    fn read_string(&mut self) -> CoreResult<Token> {
        let start_line = self.line;
        self.pos += 1;
        let mut s = String::new();
        loop {
            let Some(&c) = self.chars.get(self.pos) else {
                return Err(CoreError::Parse {
                    source_name: self.name.clone(),
                    line: start_line,
                    message: "Unterminated string".into(),
                });
            };
            self.pos += 1;
            match c {
                '"' => return Ok(Token::Str(s)),
                '\\' if matches!(self.chars.get(self.pos), Some('"' | '\\')) => {
                    s.push(self.chars[self.pos]);
                    self.pos += 1;
                }
                '\n' => {
                    self.line += 1;
                    s.push(c);
                }
                _ => s.push(c),
            }
        }
    }

    fn skip_blank(&mut self) -> CoreResult<()> {
        loop {
            match self.chars.get(self.pos) {
                Some('\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') => match self.chars.get(self.pos + 1) {
                    Some('/') => {
                        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
                            self.pos += 1;
                        }
                    }
                    Some('*') => self.skip_block_comment()?,
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> CoreResult<()> {
        let start_line = self.line;
        self.pos += 2;
        loop {
            match self.chars.get(self.pos) {
                None => {
                    return Err(CoreError::Parse {
                        source_name: self.name.clone(),
                        line: start_line,
                        message: "Unterminated block comment".into(),
                    });
                }
                Some('*') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(c) => {
                    if *c == '\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
            }
        }
    }
}
