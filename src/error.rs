//! Error type shared by every part of the index.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in {}: {reason}", path.display())]
    Format { path: PathBuf, line: usize, reason: String },

    #[error("index directory not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("store file not found: {}", .0.display())]
    StoreFileMissing(PathBuf),

    #[error("tag {0} does not exist")]
    TagNotFound(String),

    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("field cannot be stored on a single line: {0:?}")]
    UnrepresentableField(String),

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Error::Format { path: path.into(), line, reason: reason.into() }
    }

    /// True for the missing-directory, missing-store-file and unknown-tag cases.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::IndexNotFound(_) | Error::StoreFileMissing(_) | Error::TagNotFound(_)
        )
    }
}
