//! Data models returned by the index.
//!
//! - [`HistoryEntry`] / [`HistoryRecord`] - audit log records
//! - [`DumpEntry`] - an archived file with its tag memberships
//! - [`TagMember`] - a file listed under a single tag
//!
//! All of them derive serde so the binary can print them as JSON.

pub mod dump;
pub mod history;

pub use dump::{DumpEntry, TagMember, TagMembership};
pub use history::{HistoryEntry, HistoryRecord, HistoryVerb};
