use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// A tag a file carries, with its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMembership {
    pub tag: String,
    pub value: String,
}

/// Renders `tag: value`, or just `tag` when the value is empty
impl fmt::Display for TagMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.tag)
        } else {
            write!(f, "{}: {}", self.tag, self.value)
        }
    }
}

/// One archived file and every tag attached to its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEntry {
    pub path: String,
    pub digest: Digest,
    pub tags: Vec<TagMembership>,
}

/// One file carrying a given tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMember {
    pub path: String,
    pub value: String,
}

impl fmt::Display for TagMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}: {}", self.path, self.value)
        }
    }
}
