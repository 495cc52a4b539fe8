//! Entry point for foamxform.
//! Reads a dictionary of transforms and points, prints the mapped points.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dict::{Dictionary, FunctionEntryTable, read_transformer_chain};

fn parse_dict_arg() -> Option<PathBuf> {
    // Accept: --dict=<path>
    std::env::args()
        .find_map(|arg| arg.strip_prefix("--dict=").map(PathBuf::from))
}

fn parse_inverse_arg() -> bool {
    // --inverse[=on|off], default off
    for arg in std::env::args() {
        if arg == "--inverse" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--inverse=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_log_arg() -> String {
    std::env::args()
        .find_map(|arg| arg.strip_prefix("--log=").map(str::to_string))
        .unwrap_or_else(|| "info".to_string())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(parse_log_arg()))
        .init();

    let path = parse_dict_arg().context("Missing required argument --dict=<path>")?;
    let inverse = parse_inverse_arg();

    let table = FunctionEntryTable::with_builtins();
    let case_dict = Dictionary::read_file(&path, &table)
        .with_context(|| format!("Failed to read dictionary {}", path.display()))?;

    let transforms = case_dict.sub_dict("transforms")?;
    let composed = read_transformer_chain(transforms).context("Invalid transforms")?;
    log::info!(
        "Composed {} transform(s): translates={} rotates={} inverse={}",
        transforms.len(),
        composed.translates(),
        composed.rotates(),
        inverse
    );

    let points = case_dict.lookup_primitive("points")?.vector_list()?;
    let mapped = if inverse {
        composed.inv_transform_positions(&points)
    } else {
        composed.transform_positions(&points)
    };

    for p in &mapped {
        println!("({} {} {})", p.x, p.y, p.z);
    }

    log::info!("Mapped {} point(s)", mapped.len());
    Ok(())
}
