use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;

use crate::codec::line::{split_first_field, trim_line_end};
use crate::digest::Digest;
use crate::error::{Error, Result};

/// Bidirectional path <-> digest table persisted as `storefile`
///
/// `path_to_digest` is authoritative and keeps first-insertion order; re-inserting
/// a path updates its digest in place. `digest_to_path` holds, for every digest,
/// the most recently inserted path carrying it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreTable {
    path_to_digest: IndexMap<String, Digest>,
    digest_to_path: IndexMap<Digest, String>,
}

impl StoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store file: one `<digest> <path>` record per line
    ///
    /// The path is everything after the whitespace following the digest, so it may
    /// contain raw spaces. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be opened or read
    /// - [`Error::Format`] if a line lacks a path or starts with an invalid digest
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut table = Self::new();

        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            let line = trim_line_end(&line);
            if line.trim().is_empty() {
                continue;
            }

            let (digest, file_path) = split_first_field(line)
                .filter(|(_, rest)| !rest.is_empty())
                .ok_or_else(|| Error::format(path, line_num + 1, "expected `<digest> <path>`"))?;
            let digest = digest
                .parse::<Digest>()
                .map_err(|e| Error::format(path, line_num + 1, e.to_string()))?;

            table.insert(file_path.to_string(), digest);
        }

        log::debug!("loaded {} entries from {}", table.len(), path.display());
        Ok(table)
    }

    /// Record that `path` currently holds content `digest` (last insert wins)
    pub fn insert(&mut self, path: String, digest: Digest) {
        let previous = self.path_to_digest.insert(path.clone(), digest.clone());

        // The old digest may still be carried by another path; point it there.
        if let Some(old) = previous
            && old != digest
            && self.digest_to_path.get(&old) == Some(&path)
        {
            let survivor = self
                .path_to_digest
                .iter()
                .rev()
                .find(|(_, d)| **d == old)
                .map(|(p, _)| p.clone());
            match survivor {
                Some(other) => {
                    self.digest_to_path.insert(old, other);
                }
                None => {
                    self.digest_to_path.shift_remove(&old);
                }
            }
        }

        self.digest_to_path.insert(digest, path);
    }

    /// Serialize every record as `<digest> <path>\n` in iteration order
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut contents = String::new();
        for (file_path, digest) in &self.path_to_digest {
            contents.push_str(digest.as_str());
            contents.push(' ');
            contents.push_str(file_path);
            contents.push('\n');
        }

        super::write_atomically(path, &contents)?;
        log::debug!("wrote {} entries to {}", self.len(), path.display());
        Ok(())
    }

    pub fn digest_for(&self, path: &str) -> Option<&Digest> {
        self.path_to_digest.get(path)
    }

    pub fn path_for(&self, digest: &Digest) -> Option<&str> {
        self.digest_to_path.get(digest).map(String::as_str)
    }

    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.digest_to_path.contains_key(digest)
    }

    /// Number of archived paths
    pub fn len(&self) -> usize {
        self.path_to_digest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_to_digest.is_empty()
    }

    /// Number of distinct contents
    pub fn distinct_digests(&self) -> usize {
        self.digest_to_path.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Digest)> + Clone {
        self.path_to_digest.iter().map(|(path, digest)| (path.as_str(), digest))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + Clone {
        self.path_to_digest.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn digest(c: char) -> Digest {
        c.to_string().repeat(64).parse().unwrap()
    }

    /// Every reverse entry points at a path that really carries that digest
    fn assert_consistent(table: &StoreTable) {
        for (digest, path) in &table.digest_to_path {
            assert_eq!(table.path_to_digest.get(path), Some(digest));
        }
        for digest in table.path_to_digest.values() {
            assert!(table.digest_to_path.contains_key(digest));
        }
    }

    #[test]
    fn test_insert_both_directions() {
        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));

        assert_eq!(table.digest_for("/a"), Some(&digest('1')));
        assert_eq!(table.path_for(&digest('1')), Some("/a"));
        assert_consistent(&table);
    }

    #[test]
    fn test_same_digest_last_insert_wins() {
        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));
        table.insert("/b".into(), digest('1'));

        assert_eq!(table.len(), 2);
        assert_eq!(table.distinct_digests(), 1);
        assert_eq!(table.path_for(&digest('1')), Some("/b"));
        assert_consistent(&table);
    }

    #[test]
    fn test_reinsert_with_new_content_drops_stale_reverse_entry() {
        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));
        table.insert("/a".into(), digest('2'));

        assert_eq!(table.len(), 1);
        assert!(!table.contains_digest(&digest('1')));
        assert_eq!(table.path_for(&digest('2')), Some("/a"));
        assert_consistent(&table);
    }

    #[test]
    fn test_reinsert_repoints_shared_digest() {
        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));
        table.insert("/b".into(), digest('1'));
        table.insert("/b".into(), digest('2'));

        assert_eq!(table.path_for(&digest('1')), Some("/a"));
        assert_eq!(table.path_for(&digest('2')), Some("/b"));
        assert_consistent(&table);
    }

    #[test]
    fn test_reinsert_keeps_path_position() {
        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));
        table.insert("/b".into(), digest('2'));
        table.insert("/a".into(), digest('1'));
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["/a", "/b"]);

        table.insert("/a".into(), digest('3'));
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["/a", "/b"]);
        assert_eq!(table.digest_for("/a"), Some(&digest('3')));
        assert_consistent(&table);
    }

    #[test]
    fn test_reinsert_unchanged_file_leaves_storefile_untouched() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");

        let mut table = StoreTable::new();
        table.insert("/a".into(), digest('1'));
        table.insert("/b".into(), digest('2'));
        table.write(&store_path).unwrap();
        let before = fs::read_to_string(&store_path).unwrap();

        table.insert("/a".into(), digest('1'));
        table.write(&store_path).unwrap();

        assert_eq!(fs::read_to_string(&store_path).unwrap(), before);
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");

        let mut table = StoreTable::new();
        table.insert("/plain.txt".into(), digest('1'));
        table.insert("/with space/and  two.txt".into(), digest('2'));
        table.insert("/dup.txt".into(), digest('1'));
        table.write(&store_path).unwrap();

        let loaded = StoreTable::load(&store_path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.path_for(&digest('1')), Some("/dup.txt"));
    }

    #[test]
    fn test_write_format() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");

        let mut table = StoreTable::new();
        table.insert("/a b".into(), digest('f'));
        table.write(&store_path).unwrap();

        let expected = format!("{} /a b\n", "f".repeat(64));
        assert_eq!(fs::read_to_string(&store_path).unwrap(), expected);
    }

    #[test]
    fn test_load_skips_blank_lines_and_crlf() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");
        fs::write(&store_path, format!("\n{} /a\r\n\n", "1".repeat(64))).unwrap();

        let table = StoreTable::load(&store_path).unwrap();
        assert_eq!(table.digest_for("/a"), Some(&digest('1')));
    }

    #[test]
    fn test_load_rejects_line_without_path() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");
        fs::write(&store_path, format!("{} /a\n{}\n", "1".repeat(64), "2".repeat(64))).unwrap();

        let err = StoreTable::load(&store_path).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }), "got {:?}", err);
    }

    #[test]
    fn test_load_rejects_bad_digest() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("storefile");
        fs::write(&store_path, "not-a-digest /a\n").unwrap();

        let err = StoreTable::load(&store_path).unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = StoreTable::load(&dir.path().join("storefile")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
