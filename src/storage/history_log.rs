use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::DateTime;

use super::HISTORY_FILE_NAME;
use crate::codec::line::{escape, split_escaped_fields, trim_line_end};
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::models::{HistoryEntry, HistoryRecord, HistoryVerb};

/// Append-only audit log of an index directory
///
/// Each record is one line, `VERB TIMESTAMP field...`, with spaces inside fields
/// escaped. Existing lines are never rewritten.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(HISTORY_FILE_NAME) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entries` after everything already in the log
    ///
    /// The file is created on first use. Nothing is opened when `entries` is empty.
    pub fn append(&self, entries: &[HistoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&format_line(entry));
            contents.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(contents.as_bytes()).map_err(|e| Error::io(&self.path, e))?;

        log::debug!("appended {} history records to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Read the whole log back, oldest first
    ///
    /// A missing log reads as empty. This is for display only; the index never
    /// replays it.
    pub fn read(&self) -> Result<Vec<HistoryEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::io(&self.path, e))?;
            let line = trim_line_end(&line);
            if line.trim().is_empty() {
                continue;
            }
            let entry =
                parse_line(line).map_err(|reason| Error::format(&self.path, line_num + 1, reason))?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

/// Render one record as a log line (without the newline)
pub fn format_line(entry: &HistoryEntry) -> String {
    let mut fields = vec![
        entry.record.verb().as_str().to_string(),
        entry.timestamp.timestamp().to_string(),
        entry.record.digest().to_string(),
    ];
    match &entry.record {
        HistoryRecord::Insert { path, .. } => fields.push(escape(path).into_owned()),
        HistoryRecord::AddTag { tag, value, .. } => {
            fields.push(escape(tag).into_owned());
            fields.push(escape(value).into_owned());
        }
        HistoryRecord::RemoveTag { tag, .. } => fields.push(escape(tag).into_owned()),
    }
    fields.join(" ")
}

/// Parse a log line produced by [`format_line`]
pub fn parse_line(line: &str) -> std::result::Result<HistoryEntry, String> {
    let mut fields = split_escaped_fields(line).into_iter();
    let mut next = |what: &str| fields.next().ok_or_else(|| format!("missing {}", what));

    let verb = next("verb")?.parse::<HistoryVerb>()?;
    let seconds =
        next("timestamp")?.parse::<i64>().map_err(|e| format!("invalid timestamp: {}", e))?;
    let timestamp = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| format!("timestamp out of range: {}", seconds))?;
    let digest = next("digest")?.parse::<Digest>().map_err(|e| e.to_string())?;

    let record = match verb {
        HistoryVerb::Insert => HistoryRecord::Insert { digest, path: next("path")? },
        HistoryVerb::AddTag => {
            HistoryRecord::AddTag { digest, tag: next("tag")?, value: next("value")? }
        }
        HistoryVerb::RemoveTag => HistoryRecord::RemoveTag { digest, tag: next("tag")? },
    };

    if let Some(extra) = fields.next() {
        return Err(format!("unexpected trailing field {:?}", extra));
    }

    Ok(HistoryEntry { timestamp, record })
}
