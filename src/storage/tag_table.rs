use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use indexmap::IndexMap;

use super::{StoreTable, is_reserved_name, write_atomically};
use crate::codec::line::{split_first_field, trim_line_end};
use crate::digest::Digest;
use crate::error::{Error, Result};

/// Result of a tag mutation that did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The membership was set (or its value overwritten)
    Tagged,
    /// The membership was removed
    Untagged,
    /// The path or digest is not in the store, nothing changed
    NotArchived,
    /// The file is archived but was not a member of the tag, nothing changed
    NotTagged,
}

impl TagOutcome {
    /// Whether the in-memory index changed
    pub fn is_applied(self) -> bool {
        matches!(self, TagOutcome::Tagged | TagOutcome::Untagged)
    }
}

/// Members of one tag: digest -> value, where `""` is a present, empty value
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tag {
    members: IndexMap<Digest, String>,
}

impl Tag {
    pub fn get(&self, digest: &Digest) -> Option<&str> {
        self.members.get(digest).map(String::as_str)
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.members.contains_key(digest)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &str)> {
        self.members.iter().map(|(digest, value)| (digest, value.as_str()))
    }

    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut tag = Tag::default();

        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            let line = trim_line_end(&line);
            if line.trim().is_empty() {
                continue;
            }

            // A bare digest is a member with an empty value.
            let (digest, value) = split_first_field(line).unwrap_or((line.trim_start(), ""));
            let digest = digest
                .parse::<Digest>()
                .map_err(|e| Error::format(path, line_num + 1, e.to_string()))?;

            tag.members.insert(digest, value.to_string());
        }

        Ok(tag)
    }

    fn serialize(&self) -> String {
        let mut contents = String::new();
        for (digest, value) in &self.members {
            contents.push_str(digest.as_str());
            contents.push(' ');
            contents.push_str(value);
            contents.push('\n');
        }
        contents
    }
}

/// Check that `name` can be used as a tag file name
///
/// Rejects empty names, reserved names, names with whitespace or path separators,
/// and dot-files (which are skipped on load).
pub fn validate_tag_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || is_reserved_name(name)
        || name.starts_with('.')
        || name.contains(|c: char| c.is_whitespace() || c == '/' || c == '\\' || c == '\0');
    if invalid {
        return Err(Error::InvalidTagName(name.to_string()));
    }
    Ok(())
}

/// All tags of an index directory, one file per non-empty tag
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagTable {
    tags: IndexMap<String, Tag>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every tag file in `dir`
    ///
    /// Every regular file except `storefile`, `history` and dot-files is a tag named
    /// after the file. Files are read in name order.
    pub fn load(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("skipping tag file with non UTF-8 name: {}", path.display());
                continue;
            };
            if is_reserved_name(&name) || name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();

        let mut table = Self::new();
        for name in names {
            let tag = Tag::load(&dir.join(&name))?;
            log::debug!("loaded tag {} with {} members", name, tag.len());
            table.tags.insert(name, tag);
        }

        Ok(table)
    }

    /// Create an empty tag unless it already exists
    pub fn ensure(&mut self, name: &str) {
        if !self.tags.contains_key(name) {
            self.tags.insert(name.to_string(), Tag::default());
        }
    }

    /// Set `tag[digest] = value`, provided the digest is archived in `store`
    ///
    /// An unknown digest yields [`TagOutcome::NotArchived`] and leaves the table,
    /// including the set of known tag names, untouched.
    pub fn add(
        &mut self,
        store: &StoreTable,
        name: &str,
        digest: &Digest,
        value: &str,
    ) -> TagOutcome {
        if !store.contains_digest(digest) {
            return TagOutcome::NotArchived;
        }
        self.ensure(name);
        if let Some(tag) = self.tags.get_mut(name) {
            tag.members.insert(digest.clone(), value.to_string());
        }
        TagOutcome::Tagged
    }

    /// Drop one membership; the tag stays known even when it becomes empty
    pub fn remove(&mut self, name: &str, digest: &Digest) -> bool {
        self.tags.get_mut(name).is_some_and(|tag| tag.members.shift_remove(digest).is_some())
    }

    /// Rewrite every non-empty tag file and delete the files of empty tags
    pub fn write(&self, dir: &Path) -> Result<()> {
        for (name, tag) in &self.tags {
            let path = dir.join(name);
            if tag.is_empty() {
                match fs::remove_file(&path) {
                    Ok(()) => log::debug!("removed empty tag file {}", path.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(&path, e)),
                }
            } else {
                write_atomically(&path, &tag.serialize())?;
            }
        }
        Ok(())
    }

    /// Every tag containing `digest`, with the value it carries there
    pub fn members<'a>(&'a self, digest: &'a Digest) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.tags
            .iter()
            .filter_map(move |(name, tag)| tag.get(digest).map(|value| (name.as_str(), value)))
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn digest(c: char) -> Digest {
        c.to_string().repeat(64).parse().unwrap()
    }

    fn store_with(digests: &[char]) -> StoreTable {
        let mut store = StoreTable::new();
        for c in digests {
            store.insert(format!("/file-{}", c), digest(*c));
        }
        store
    }

    #[test]
    fn test_add_requires_archived_digest() {
        let store = store_with(&['1']);
        let mut tags = TagTable::new();

        assert_eq!(tags.add(&store, "color", &digest('2'), "red"), TagOutcome::NotArchived);
        assert!(tags.is_empty(), "rejected add must not create the tag");

        assert_eq!(tags.add(&store, "color", &digest('1'), "red"), TagOutcome::Tagged);
        assert_eq!(tags.get("color").unwrap().get(&digest('1')), Some("red"));
    }

    #[test]
    fn test_add_twice_keeps_single_entry_last_value() {
        let store = store_with(&['1']);
        let mut tags = TagTable::new();
        tags.add(&store, "color", &digest('1'), "red");
        tags.add(&store, "color", &digest('1'), "blue");

        let tag = tags.get("color").unwrap();
        assert_eq!(tag.len(), 1);
        assert_eq!(tag.get(&digest('1')), Some("blue"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let store = store_with(&['1']);
        let mut tags = TagTable::new();
        tags.add(&store, "color", &digest('1'), "red");
        tags.ensure("color");
        tags.ensure("empty");

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("color").unwrap().len(), 1);
        assert!(tags.get("empty").unwrap().is_empty());
    }

    #[test]
    fn test_members_lists_every_tag_with_value() {
        let store = store_with(&['1', '2']);
        let mut tags = TagTable::new();
        tags.add(&store, "color", &digest('1'), "red");
        tags.add(&store, "size", &digest('1'), "");
        tags.add(&store, "color", &digest('2'), "blue");

        let d1 = digest('1');
        let members: Vec<_> = tags.members(&d1).collect();
        assert_eq!(members, vec![("color", "red"), ("size", "")]);
    }

    #[test]
    fn test_write_then_load_round_trip_with_empty_values() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&['1', '2']);
        let mut tags = TagTable::new();
        tags.add(&store, "color", &digest('1'), "dark red");
        tags.add(&store, "size", &digest('1'), "");
        tags.add(&store, "size", &digest('2'), "xl");
        tags.add(&store, "note", &digest('2'), "two  words, trailing  ");
        tags.write(dir.path()).unwrap();

        let loaded = TagTable::load(dir.path()).unwrap();
        assert_eq!(loaded, tags);
        assert_eq!(loaded.get("size").unwrap().get(&digest('1')), Some(""));
    }

    #[test]
    fn test_write_removes_empty_tag_and_never_creates_one() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&['1']);
        let mut tags = TagTable::new();
        tags.add(&store, "color", &digest('1'), "red");
        tags.ensure("never-used");
        tags.write(dir.path()).unwrap();

        assert!(dir.path().join("color").exists());
        assert!(!dir.path().join("never-used").exists());

        assert!(tags.remove("color", &digest('1')));
        tags.write(dir.path()).unwrap();
        assert!(!dir.path().join("color").exists());

        // Writing again with the file already gone is fine.
        tags.write(dir.path()).unwrap();
    }

    #[test]
    fn test_remove_unknown_membership() {
        let mut tags = TagTable::new();
        assert!(!tags.remove("color", &digest('1')));
        tags.ensure("color");
        assert!(!tags.remove("color", &digest('1')));
    }

    #[test]
    fn test_load_skips_reserved_and_hidden_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("storefile"), format!("{} /a\n", "1".repeat(64))).unwrap();
        fs::write(dir.path().join("history"), "INSERT 1 x /a\n").unwrap();
        fs::write(dir.path().join(".color.tmp"), "garbage\n").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("color"), format!("{} red\n", "1".repeat(64))).unwrap();

        let tags = TagTable::load(dir.path()).unwrap();
        assert_eq!(tags.names().collect::<Vec<_>>(), vec!["color"]);
    }

    #[test]
    fn test_load_value_forms() {
        let dir = TempDir::new().unwrap();
        let content =
            format!("{} \n{}\n{} two  words\n", "1".repeat(64), "2".repeat(64), "3".repeat(64));
        fs::write(dir.path().join("note"), content).unwrap();

        let tags = TagTable::load(dir.path()).unwrap();
        let note = tags.get("note").unwrap();
        assert_eq!(note.get(&digest('1')), Some(""));
        assert_eq!(note.get(&digest('2')), Some(""));
        assert_eq!(note.get(&digest('3')), Some("two  words"));
    }

    #[test]
    fn test_load_rejects_bad_digest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("color"), "zzz red\n").unwrap();

        let err = TagTable::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
    }

    #[test]
    fn test_validate_tag_name() {
        assert!(validate_tag_name("color").is_ok());
        assert!(validate_tag_name("needs-review_2").is_ok());
        for bad in ["", "storefile", "history", ".hidden", "two words", "a/b", "tab\tname"] {
            assert!(validate_tag_name(bad).is_err(), "{:?} should be rejected", bad);
        }
    }
}
