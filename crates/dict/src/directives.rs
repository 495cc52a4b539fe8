//! Built-in directives: `#include`, `#includeIfPresent`, `#remove`, `#inputMode`.

use std::path::PathBuf;

use core_types::CoreResult;

use crate::dictionary::{Dictionary, InputMode, PrimitiveEntry};
use crate::function_entry::FunctionEntryTable;
use crate::stream::{InputStream, Token};

pub fn register_builtins(table: &mut FunctionEntryTable) {
    table.register_dictionary_fn("include", |table, parent, is| {
        include_dict(table, parent, is, false)
    });
    table.register_dictionary_fn("includeIfPresent", |table, parent, is| {
        include_dict(table, parent, is, true)
    });
    table.register_entry_fn("include", |table, parent, entry, is| {
        include_entry(table, parent, entry, is, false)
    });
    table.register_entry_fn("includeIfPresent", |table, parent, entry, is| {
        include_entry(table, parent, entry, is, true)
    });
    table.register_dictionary_fn("remove", |_, parent, is| remove(parent, is));
    table.register_dictionary_fn("inputMode", |_, parent, is| input_mode(parent, is));
}

/// Path named by the next token, relative to the including file's directory.
fn include_path(is: &mut InputStream) -> CoreResult<PathBuf> {
    let tok = is.expect_token("file name")?;
    let name = tok
        .as_word()
        .ok_or_else(|| is.parse_error(format!("Expected file name, found '{tok}'")))?;
    let path = PathBuf::from(name);
    if path.is_relative() {
        if let Some(dir) = is.dir() {
            return Ok(dir.join(path));
        }
    }
    Ok(path)
}

fn include_dict(
    table: &FunctionEntryTable,
    parent: &mut Dictionary,
    is: &mut InputStream,
    if_present: bool,
) -> CoreResult<bool> {
    let path = include_path(is)?;
    if if_present && !path.exists() {
        log::debug!("#includeIfPresent: {} not found, skipping", path.display());
        return Ok(true);
    }
    log::debug!("Including {} into '{}'", path.display(), parent.name());
    let mut sub = is.open_include(&path)?;
    parent.read(&mut sub, Some(table))?;
    Ok(true)
}

fn include_entry(
    table: &FunctionEntryTable,
    parent: &Dictionary,
    entry: &mut PrimitiveEntry,
    is: &mut InputStream,
    if_present: bool,
) -> CoreResult<bool> {
    let path = include_path(is)?;
    if if_present && !path.exists() {
        log::debug!("#includeIfPresent: {} not found, skipping", path.display());
        return Ok(true);
    }
    log::debug!("Including {} into entry '{}'", path.display(), entry.keyword());
    let mut sub = is.open_include(&path)?;
    entry.read_tokens(parent, &mut sub, Some(table), false)?;
    Ok(true)
}

/// `#remove key` or `#remove (key1 key2 ...)`.
fn remove(parent: &mut Dictionary, is: &mut InputStream) -> CoreResult<bool> {
    let mut keys = Vec::new();
    match is.expect_token("keyword or list")? {
        Token::Punct('(') => loop {
            match is.expect_token("')'")? {
                Token::Punct(')') => break,
                tok => keys.push(
                    tok.as_word()
                        .ok_or_else(|| is.parse_error(format!("#remove: bad keyword '{tok}'")))?
                        .to_string(),
                ),
            }
        },
        tok => keys.push(
            tok.as_word()
                .ok_or_else(|| is.parse_error(format!("#remove: bad keyword '{tok}'")))?
                .to_string(),
        ),
    }

    for key in keys {
        if parent.remove(&key).is_none() {
            log::debug!("#remove: '{key}' not present in '{}'", parent.name());
        }
    }
    Ok(true)
}

fn input_mode(parent: &mut Dictionary, is: &mut InputStream) -> CoreResult<bool> {
    let tok = is.expect_token("input mode")?;
    let mode = tok
        .as_word()
        .and_then(InputMode::from_name)
        .ok_or_else(|| {
            is.parse_error(format!(
                "Unknown #inputMode '{tok}', expected merge, overwrite, protect, warn, error or default"
            ))
        })?;
    parent.set_input_mode(mode);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Entry;
    use core_types::CoreError;
    use corelib::vector;
    use std::fs;

    fn write(dir: &std::path::Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("write fixture");
        path
    }

    #[test]
    fn include_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "defaults", "nu 1e-5;\nsolver { type PCG; }\n");
        let main = write(
            dir.path(),
            "caseDict",
            "#include \"defaults\"\nsolver { tol 1e-6; }\nnu 2e-5;\n",
        );

        let d = Dictionary::read_file(&main, &FunctionEntryTable::with_builtins()).unwrap();
        assert_eq!(d.read_scalar("nu").unwrap(), 2e-5);
        let solver = d.sub_dict("solver").unwrap();
        assert!(solver.contains("type"));
        assert_eq!(solver.read_scalar("tol").unwrap(), 1e-6);
    }

    #[test]
    fn nested_include_resolves_from_its_own_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write(&sub, "inner", "x 7;");
        write(&sub, "outer", "#include \"inner\"");
        let main = write(dir.path(), "caseDict", "#include \"sub/outer\"");

        let d = Dictionary::read_file(&main, &FunctionEntryTable::with_builtins()).unwrap();
        assert_eq!(d.read_scalar("x").unwrap(), 7.0);
    }

    #[test]
    fn nested_include_inside_entry_resolves_from_its_own_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write(&sub, "inner", "(1 2 3)");
        write(&sub, "mid", "#include \"inner\"");
        let main = write(dir.path(), "caseDict", "origin #include \"sub/mid\";");

        let d = Dictionary::read_file(&main, &FunctionEntryTable::with_builtins()).unwrap();
        assert_eq!(d.read_vector("origin").unwrap(), vector(1.0, 2.0, 3.0));
    }

    #[test]
    fn semicolon_in_entry_include_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "vals", "1; 2");
        let main = write(dir.path(), "caseDict", "v (#include \"vals\" 3);");

        let err = Dictionary::read_file(&main, &FunctionEntryTable::with_builtins()).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }), "{err}");
        assert!(err.to_string().contains("Unexpected ';'"), "{err}");
    }

    #[test]
    fn recursive_include_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let table = FunctionEntryTable::with_builtins();

        let selfish = write(dir.path(), "selfish", "a 1;\n#include \"selfish\"");
        let err = Dictionary::read_file(&selfish, &table).unwrap_err();
        assert!(err.to_string().contains("Recursive #include"), "{err}");

        write(dir.path(), "ping", "#include \"pong\"");
        write(dir.path(), "pong", "x #include \"ping\";");
        let err = Dictionary::read_file(dir.path().join("ping"), &table).unwrap_err();
        assert!(err.to_string().contains("Recursive #include"), "{err}");

        // The same file twice in sequence is not a cycle.
        write(dir.path(), "leaf", "k 2;");
        let main = write(dir.path(), "twice", "#include \"leaf\"\n#include \"leaf\"");
        assert_eq!(Dictionary::read_file(&main, &table).unwrap().read_scalar("k").unwrap(), 2.0);
    }

    #[test]
    fn missing_include_is_io_error_unless_if_present() {
        let dir = tempfile::tempdir().unwrap();
        let table = FunctionEntryTable::with_builtins();

        let main = write(dir.path(), "a", "#include \"nope\"");
        let err = Dictionary::read_file(&main, &table).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }), "{err}");

        let main = write(dir.path(), "b", "#includeIfPresent \"nope\"\nk 1;");
        let d = Dictionary::read_file(&main, &table).unwrap();
        assert_eq!(d.read_scalar("k").unwrap(), 1.0);
    }

    #[test]
    fn include_inside_entry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "origin", "(1 2 3)");
        let main = write(dir.path(), "caseDict", "origin #include \"origin\";");

        let d = Dictionary::read_file(&main, &FunctionEntryTable::with_builtins()).unwrap();
        assert_eq!(d.read_vector("origin").unwrap(), vector(1.0, 2.0, 3.0));
    }

    #[test]
    fn remove_single_and_list() {
        let table = FunctionEntryTable::with_builtins();
        let d = Dictionary::parse_str(
            "d",
            "a 1; b 2; c 3; d 4;\n#remove a\n#remove (b c missing)\n",
            Some(&table),
        )
        .unwrap();
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["d"]);
    }

    #[test]
    fn input_mode_switches_duplicate_handling() {
        let table = FunctionEntryTable::with_builtins();
        let d = Dictionary::parse_str(
            "d",
            "a 1;\n#inputMode protect\na 2;\n#inputMode overwrite\nb 1;\nb 5;",
            Some(&table),
        )
        .unwrap();
        assert_eq!(d.read_scalar("a").unwrap(), 1.0);
        assert_eq!(d.read_scalar("b").unwrap(), 5.0);
        assert_eq!(d.input_mode(), InputMode::Overwrite);

        let err = Dictionary::parse_str("d", "#inputMode append", Some(&table)).unwrap_err();
        assert!(err.to_string().contains("Unknown #inputMode 'append'"), "{err}");
    }

    #[test]
    fn input_mode_error_rejects_duplicates() {
        let table = FunctionEntryTable::with_builtins();
        let err = Dictionary::parse_str("d", "#inputMode error\ns { }\ns { }", Some(&table))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateEntry { ref keyword, .. } if keyword == "s"));
    }

    #[test]
    fn directive_inside_sub_dictionary_acts_on_it() {
        let table = FunctionEntryTable::with_builtins();
        let d = Dictionary::parse_str("d", "a 1; s { a 2; b 3; #remove b }", Some(&table)).unwrap();
        assert!(d.contains("a"));
        let s = d.sub_dict("s").unwrap();
        assert!(matches!(s.get("a"), Some(Entry::Primitive(_))));
        assert!(!s.contains("b"));
    }
}
