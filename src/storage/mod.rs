//! On-disk tables of an index directory
//!
//! ```text
//! <index-dir>/
//!   storefile   "<digest> <path>" per archived file
//!   history     append-only audit log
//!   <tag>       "<digest> <value>" per member, one file per non-empty tag
//! ```
//!
//! Whole-file rewrites go through a dot-prefixed temp file and a rename, so each
//! file is either fully old or fully new. Nothing spans several files.

pub mod history_log;
pub mod store_table;
pub mod tag_table;

use std::fs;
use std::path::Path;

pub use history_log::HistoryLog;
pub use store_table::StoreTable;
pub use tag_table::{Tag, TagOutcome, TagTable, validate_tag_name};

use crate::error::{Error, Result};

pub const STORE_FILE_NAME: &str = "storefile";
pub const HISTORY_FILE_NAME: &str = "history";

/// Names that can never be used for a tag file
pub fn is_reserved_name(name: &str) -> bool {
    name == STORE_FILE_NAME || name == HISTORY_FILE_NAME
}

/// Replace `path` with `contents` (temp file + rename)
pub(crate) fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp_path, contents).map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}
