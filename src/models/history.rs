use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Operation kind written as the first word of a history line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryVerb {
    Insert,
    AddTag,
    RemoveTag,
}

impl HistoryVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryVerb::Insert => "INSERT",
            HistoryVerb::AddTag => "ADDTAG",
            HistoryVerb::RemoveTag => "RMTAG",
        }
    }
}

impl FromStr for HistoryVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(HistoryVerb::Insert),
            "ADDTAG" => Ok(HistoryVerb::AddTag),
            "RMTAG" => Ok(HistoryVerb::RemoveTag),
            other => Err(format!("unknown history verb {:?}", other)),
        }
    }
}

impl fmt::Display for HistoryVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What a single mutation did, with its operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum HistoryRecord {
    Insert { digest: Digest, path: String },
    AddTag { digest: Digest, tag: String, value: String },
    RemoveTag { digest: Digest, tag: String },
}

impl HistoryRecord {
    pub fn verb(&self) -> HistoryVerb {
        match self {
            HistoryRecord::Insert { .. } => HistoryVerb::Insert,
            HistoryRecord::AddTag { .. } => HistoryVerb::AddTag,
            HistoryRecord::RemoveTag { .. } => HistoryVerb::RemoveTag,
        }
    }

    pub fn digest(&self) -> &Digest {
        match self {
            HistoryRecord::Insert { digest, .. }
            | HistoryRecord::AddTag { digest, .. }
            | HistoryRecord::RemoveTag { digest, .. } => digest,
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub record: HistoryRecord,
}

impl HistoryEntry {
    /// Stamp a record with the current time, truncated to whole seconds
    pub fn now(record: HistoryRecord) -> Self {
        let now = Utc::now();
        let timestamp = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self { timestamp, record }
    }
}
