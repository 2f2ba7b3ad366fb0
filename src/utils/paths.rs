use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Make `path` absolute against the current directory without touching the filesystem
///
/// Symlinks are kept as given, so the stored key is the path the user named.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("Failed to resolve absolute path: {}", path.display()))
}

/// Expand the command-line operands of `insert` into the files to archive
///
/// Files are returned as given. Directories are walked recursively and contribute
/// their regular files in name order. Symlinked directories are not followed.
pub fn collect_files(operands: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for operand in operands {
        let path = absolutize(operand)?;
        if !path.is_dir() {
            files.push(path);
            continue;
        }

        for entry in WalkDir::new(&path).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to walk directory: {}", path.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Formats a path with ~ substitution for the home directory
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, dirs::home_dir().as_deref())
}

/// Internal helper for path formatting with an explicit home (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home
        && let Ok(rest) = path.strip_prefix(home)
    {
        return if rest.as_os_str().is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", rest.display())
        };
    }

    match path.to_string_lossy() {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
