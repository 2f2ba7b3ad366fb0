use std::borrow::Cow;

use crate::error::{Error, Result};

const ESCAPED_SPACE: &str = "\\ ";

/// Escape literal spaces so a field can sit in a space-separated line
///
/// Backslashes are passed through untouched, so a field that already contains
/// `"\ "` cannot be told apart from an escaped space when read back.
///
/// # Examples
///
/// ```
/// use zenodotus::codec::escape;
///
/// assert_eq!(escape("/home/me/My Documents"), "/home/me/My\\ Documents");
/// ```
pub fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(' ') {
        Cow::Owned(field.replace(' ', ESCAPED_SPACE))
    } else {
        Cow::Borrowed(field)
    }
}

/// Reverse [`escape`]
pub fn unescape(field: &str) -> Cow<'_, str> {
    if field.contains(ESCAPED_SPACE) {
        Cow::Owned(field.replace(ESCAPED_SPACE, " "))
    } else {
        Cow::Borrowed(field)
    }
}

/// Split a stored line into its key and the rest of the line
///
/// Leading whitespace is ignored. The key ends at the next whitespace character;
/// the whole whitespace run after it is skipped and everything else is returned
/// verbatim, interior and trailing spaces included. Returns `None` when no
/// separator follows the key.
pub fn split_first_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    let split_at = line.find(char::is_whitespace)?;
    let (key, rest) = line.split_at(split_at);
    Some((key, rest.trim_start()))
}

/// Split a line written from escaped fields back into unescaped fields
///
/// Every unescaped space is a separator, so a trailing separator yields a trailing
/// empty field.
pub fn split_escaped_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            ' ' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Reject fields that would break the one-record-per-line layout
pub fn ensure_single_line(field: &str) -> Result<()> {
    if field.contains(['\n', '\r']) {
        return Err(Error::UnrepresentableField(field.to_string()));
    }
    Ok(())
}

/// Reject fields stored as the rest of a line that would not read back intact
///
/// [`split_first_field`] skips the whitespace run after the key, so a field that
/// starts with whitespace would lose it on load.
pub fn ensure_line_remainder(field: &str) -> Result<()> {
    ensure_single_line(field)?;
    if field.starts_with(char::is_whitespace) {
        return Err(Error::UnrepresentableField(field.to_string()));
    }
    Ok(())
}

/// Drop a stray carriage return left at the end of a line
pub(crate) fn trim_line_end(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
