use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable naming the index directory
pub const INDEX_DIR_ENV: &str = "ZENODOTUS_DIR";

/// Directory name used under `$HOME` when nothing else is configured
pub const DEFAULT_DIR_NAME: &str = ".zenodotus";

/// Resolve the index directory
///
/// The explicit `--index-dir` value wins, then `ZENODOTUS_DIR`, then `~/.zenodotus`.
/// An empty environment variable counts as unset.
pub fn resolve_index_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = env::var_os(INDEX_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("home directory could not be determined")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}
