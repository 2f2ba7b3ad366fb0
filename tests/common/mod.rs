//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// SHA-256 of `hello`
pub const HELLO_DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

/// Builder for a scratch area holding an index directory and files to archive
///
/// The index lives in `<tmp>/index`, archived files under `<tmp>/files`.
pub struct IndexDirBuilder {
    temp_dir: TempDir,
}

impl IndexDirBuilder {
    /// Create a new builder with an initialized, empty index
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("index")).expect("Failed to create index dir");
        fs::create_dir_all(temp_dir.path().join("files")).expect("Failed to create files dir");
        fs::write(temp_dir.path().join("index/storefile"), "").expect("Failed to create storefile");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn index_dir(&self) -> PathBuf {
        self.temp_dir.path().join("index")
    }

    /// Absolute path of a file under `files/`
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join("files").join(name)
    }

    /// Add a file to archive
    pub fn with_file(self, name: &str, content: &str) -> Self {
        let path = self.file(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(path, content).expect("Failed to write file");
        self
    }

    /// Overwrite the store file with raw content
    pub fn with_storefile(self, content: &str) -> Self {
        fs::write(self.index_dir().join("storefile"), content).expect("Failed to write storefile");
        self
    }

    /// Write a raw tag file
    pub fn with_tag_file(self, name: &str, content: &str) -> Self {
        fs::write(self.index_dir().join(name), content).expect("Failed to write tag file");
        self
    }

    /// Read a file from the index directory, `None` if absent
    pub fn read_index_file(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.index_dir().join(name)).ok()
    }

    /// Build and return the temp directory (consumes self)
    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for IndexDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A digest made of one repeated hex character
pub fn fake_digest(c: char) -> String {
    c.to_string().repeat(64)
}
