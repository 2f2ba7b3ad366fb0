//! Zenodotus - a content-addressed file index with tags
//!
//! An index directory holds a `storefile` mapping absolute paths to the SHA-256
//! digest of their content, one file per tag mapping digests to values, and an
//! append-only `history` of every mutation. Tags attach to content, so a tag
//! follows a file across renames and copies.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use zenodotus::{Index, TagOutcome};
//!
//! let mut index = Index::create(Path::new("/tmp/zeno"))?;
//! index.insert_file(Path::new("/tmp/a.txt"))?;
//! assert_eq!(index.add_tag(Path::new("/tmp/a.txt"), "color", "red")?, TagOutcome::Tagged);
//! index.persist()?;
//!
//! for member in index.dump_tag("color")? {
//!     println!("{}", member);
//! }
//! # Ok::<(), zenodotus::Error>(())
//! ```

pub mod cli;
pub mod codec;
pub mod digest;
pub mod error;
pub mod index;
pub mod models;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use digest::{Digest, digest_file};
pub use error::{Error, Result};
pub use index::{Index, IndexStats};
pub use models::{DumpEntry, HistoryEntry, HistoryRecord, TagMember, TagMembership};
pub use storage::TagOutcome;
