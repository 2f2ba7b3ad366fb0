//! The index of one directory: store table, tags and pending history
//!
//! # Lifecycle
//!
//! [`Index::open`] loads `storefile` and every tag file into memory. Mutations
//! ([`Index::insert_file`], [`Index::add_tag`], [`Index::remove_tag`]) only touch
//! memory and queue a history record each. [`Index::persist`] is the single commit
//! point: it rewrites `storefile` and the tag files and appends the queued history.
//! Dropping an index without persisting discards its mutations.
//!
//! There is no locking. Two processes persisting the same directory can lose each
//! other's updates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::ensure_line_remainder;
use crate::digest::{Digest, digest_file};
use crate::error::{Error, Result};
use crate::models::{DumpEntry, HistoryEntry, HistoryRecord, TagMember, TagMembership};
use crate::storage::{
    HistoryLog, STORE_FILE_NAME, StoreTable, TagOutcome, TagTable, validate_tag_name,
};

/// Counts shown by `zenodotus stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub distinct_digests: usize,
    pub tags: usize,
    pub tag_memberships: usize,
    pub pending_history: usize,
}

#[derive(Debug)]
pub struct Index {
    dir: PathBuf,
    store: StoreTable,
    tags: TagTable,
    history: HistoryLog,
    pending: Vec<HistoryEntry>,
}

impl Index {
    /// Load the index stored in `dir`
    ///
    /// # Errors
    ///
    /// - [`Error::IndexNotFound`] if `dir` is not a directory
    /// - [`Error::StoreFileMissing`] if `dir` has no `storefile`
    /// - [`Error::Format`] / [`Error::Io`] if a store or tag file cannot be parsed
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::IndexNotFound(dir.to_path_buf()));
        }
        let store_path = dir.join(STORE_FILE_NAME);
        if !store_path.is_file() {
            return Err(Error::StoreFileMissing(store_path));
        }

        let store = StoreTable::load(&store_path)?;
        let tags = TagTable::load(dir)?;
        log::debug!(
            "opened index {} ({} files, {} tags)",
            dir.display(),
            store.len(),
            tags.len()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            store,
            tags,
            history: HistoryLog::new(dir),
            pending: Vec::new(),
        })
    }

    /// Create `dir` with an empty `storefile` if needed, then open it
    ///
    /// An existing index is opened untouched.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        let store_path = dir.join(STORE_FILE_NAME);
        if !store_path.exists() {
            fs::write(&store_path, "").map_err(|e| Error::io(&store_path, e))?;
            log::info!("initialized empty index in {}", dir.display());
        }
        Self::open(dir)
    }

    /// Hash the file at `path` and record it under that path
    ///
    /// `path` is used verbatim as the key; callers pass absolute paths.
    pub fn insert_file(&mut self, path: &Path) -> Result<Digest> {
        let key = path_key(path)?.to_string();
        let digest = digest_file(path)?;

        self.store.insert(key.clone(), digest.clone());
        let record = HistoryRecord::Insert { digest: digest.clone(), path: key };
        self.pending.push(HistoryEntry::now(record));

        Ok(digest)
    }

    /// Tag the content currently archived under `path`
    ///
    /// Returns [`TagOutcome::NotArchived`] without changing anything when the path
    /// was never inserted. Tagging again overwrites the previous value.
    ///
    /// # Errors
    ///
    /// [`Error::UnrepresentableField`] if `value` spans lines or starts with
    /// whitespace, since the tag file could not hold it.
    pub fn add_tag(&mut self, path: &Path, tag: &str, value: &str) -> Result<TagOutcome> {
        validate_tag_name(tag)?;
        ensure_line_remainder(value)?;
        let key = path_key(path)?;

        let Some(digest) = self.store.digest_for(key).cloned() else {
            return Ok(TagOutcome::NotArchived);
        };
        let outcome = self.tags.add(&self.store, tag, &digest, value);
        if outcome.is_applied() {
            self.pending.push(HistoryEntry::now(HistoryRecord::AddTag {
                digest,
                tag: tag.to_string(),
                value: value.to_string(),
            }));
        }

        Ok(outcome)
    }

    /// Remove the content archived under `path` from `tag`
    ///
    /// # Errors
    ///
    /// [`Error::TagNotFound`] if the tag was never created.
    pub fn remove_tag(&mut self, path: &Path, tag: &str) -> Result<TagOutcome> {
        let key = path_key(path)?;
        let Some(digest) = self.store.digest_for(key).cloned() else {
            return Ok(TagOutcome::NotArchived);
        };
        if self.tags.get(tag).is_none() {
            return Err(Error::TagNotFound(tag.to_string()));
        }
        if !self.tags.remove(tag, &digest) {
            return Ok(TagOutcome::NotTagged);
        }

        self.pending
            .push(HistoryEntry::now(HistoryRecord::RemoveTag { digest, tag: tag.to_string() }));
        Ok(TagOutcome::Untagged)
    }

    /// Every archived file in store order, with its tag memberships
    pub fn dump(&self) -> Vec<DumpEntry> {
        self.store
            .iter()
            .map(|(path, digest)| DumpEntry {
                path: path.to_string(),
                digest: digest.clone(),
                tags: self
                    .tags
                    .members(digest)
                    .map(|(tag, value)| TagMembership {
                        tag: tag.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Every file carrying `tag`, resolved to its most recent path
    ///
    /// Members whose content is no longer archived under any path are skipped.
    pub fn dump_tag(&self, tag: &str) -> Result<Vec<TagMember>> {
        let members = self.tags.get(tag).ok_or_else(|| Error::TagNotFound(tag.to_string()))?;

        let mut resolved = Vec::with_capacity(members.len());
        for (digest, value) in members.iter() {
            match self.store.path_for(digest) {
                Some(path) => {
                    resolved.push(TagMember { path: path.to_string(), value: value.to_string() })
                }
                None => log::warn!("tag {} references unarchived digest {}", tag, digest),
            }
        }

        Ok(resolved)
    }

    /// Lazily walk every known path; restartable by calling again
    pub fn list_indexed_paths(&self) -> impl Iterator<Item = &str> + Clone {
        self.store.paths()
    }

    /// Write the store and tag files and append queued history records
    ///
    /// Files are written one after another. A failure part-way leaves the files
    /// already written in place; the queued history is kept in that case.
    pub fn persist(&mut self) -> Result<()> {
        self.store.write(&self.dir.join(STORE_FILE_NAME))?;
        self.tags.write(&self.dir)?;
        self.history.append(&self.pending)?;

        log::info!(
            "persisted index {} ({} history records)",
            self.dir.display(),
            self.pending.len()
        );
        self.pending.clear();
        Ok(())
    }

    /// Whether any mutation is waiting for [`Index::persist`]
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_history(&self) -> &[HistoryEntry] {
        &self.pending
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &StoreTable {
        &self.store
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            files: self.store.len(),
            distinct_digests: self.store.distinct_digests(),
            tags: self.tags.len(),
            tag_memberships: self
                .tags
                .names()
                .filter_map(|name| self.tags.get(name))
                .map(|tag| tag.len())
                .sum(),
            pending_history: self.pending.len(),
        }
    }
}

/// The string a path is stored under
fn path_key(path: &Path) -> Result<&str> {
    let key = path.to_str().ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?;
    ensure_line_remainder(key)?;
    Ok(key)
}
