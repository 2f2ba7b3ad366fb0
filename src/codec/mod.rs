//! Line-oriented text encoding shared by the index files
//!
//! `storefile` and tag files store one record per line and split it on the first
//! whitespace run, so paths and values may keep raw interior spaces there. The
//! `history` log has several string fields per line and escapes spaces instead.

pub mod line;

pub use line::{
    ensure_line_remainder, ensure_single_line, escape, split_escaped_fields, split_first_field,
    unescape,
};
