//! Core shared types and errors (dictionary layer).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{source_name}:{line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error(
        "Unknown functionEntry '{name}' in {source_name} near line {line}. Valid functionEntries are: {}",
        valid.join(", ")
    )]
    UnknownFunctionEntry {
        name: String,
        source_name: String,
        line: usize,
        valid: Vec<String>,
    },

    #[error("Duplicate entry '{keyword}' on line {line} (inputMode error)")]
    DuplicateEntry { keyword: String, line: usize },

    #[error("Missing entry '{keyword}' in dictionary '{dict}'")]
    MissingEntry { keyword: String, dict: String },

    #[error("Bad value for '{keyword}': {message}")]
    BadValue { keyword: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub fn bad_value(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadValue {
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_entry_lists_valid_names() {
        let err = CoreError::UnknownFunctionEntry {
            name: "inclde".into(),
            source_name: "system/controlDict".into(),
            line: 12,
            valid: vec!["include".into(), "remove".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'inclde'"));
        assert!(msg.contains("near line 12"));
        assert!(msg.ends_with("include, remove"));
    }
}
