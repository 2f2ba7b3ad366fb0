//! Content digests for archived files
//!
//! Files are hashed with SHA-256 in fixed-size blocks so that arbitrarily large
//! files never have to be held in memory. The digest is carried around as its
//! lowercase hex form, which is also how it appears in every on-disk file.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::error::{Error, Result};

/// Number of bytes fed to the hasher per read
pub const BLOCK_SIZE: usize = 1024;

/// Length of a SHA-256 digest in hex characters
pub const DIGEST_HEX_LEN: usize = 64;

/// A lowercase hex SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDigest {
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),

    #[error("non-hex character {0:?}")]
    Character(char),
}

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Digest(hex::encode(bytes))
    }
}

impl FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != DIGEST_HEX_LEN {
            return Err(InvalidDigest::Length(len));
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(InvalidDigest::Character(c));
        }
        Ok(Digest(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Digest {
    type Error = InvalidDigest;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash everything a reader yields, [`BLOCK_SIZE`] bytes at a time
pub fn digest_reader<R: Read>(mut reader: R) -> std::io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BLOCK_SIZE];
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Digest::from_bytes(&hasher.finalize()))
}

/// Hash the contents of the file at `path`
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> Result<Digest> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    digest_reader(BufReader::new(file)).map_err(|e| Error::io(path, e))
}
