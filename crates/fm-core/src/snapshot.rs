//! Point-in-time reads of append-only text artifacts.
//!
//! Solver logs and post-processing files are still being appended to while
//! metrics are extracted. A snapshot is taken with a single read of whatever
//! bytes exist, and only newline-terminated lines are exposed: a trailing
//! fragment without `\n` is a write in progress and is ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{CoreError, CoreResult};

/// Immutable snapshot of a text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    text: String,
}

impl Snapshot {
    /// Read the current contents of `path`.
    ///
    /// Bytes are decoded lossily so a multi-byte character torn by a
    /// concurrent writer never fails the read.
    pub fn read(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CoreError::Missing {
                path: path.to_path_buf(),
            },
            _ => CoreError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Ok(Self {
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Raw text, including any partial trailing line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Complete (newline-terminated) lines, in file order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        complete_lines(&self.text)
    }

    /// True if the snapshot ends in the middle of a line.
    pub fn has_partial_tail(&self) -> bool {
        !self.text.is_empty() && !self.text.ends_with('\n')
    }
}

/// Iterate the newline-terminated lines of `text`, dropping a trailing fragment.
///
/// `\r\n` endings are accepted.
pub fn complete_lines(text: &str) -> impl Iterator<Item = &str> {
    let end = text.rfind('\n').map_or(0, |idx| idx + 1);
    text[..end].lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_fragment_is_ignored() {
        let lines: Vec<&str> = complete_lines("a\nb\npartial").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn text_without_newline_has_no_complete_lines() {
        assert_eq!(complete_lines("0.01 100000").count(), 0);
        assert_eq!(complete_lines("").count(), 0);
    }

    #[test]
    fn crlf_endings_are_stripped() {
        let lines: Vec<&str> = complete_lines("a\r\nb\r\n").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Snapshot::read(&dir.path().join("log.solver")).unwrap_err();
        assert!(matches!(err, CoreError::Missing { .. }));
    }

    #[test]
    fn read_tolerates_torn_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        // "é" is 0xC3 0xA9; leave the sequence unfinished.
        std::fs::write(&path, b"line one\nline \xC3").unwrap();

        let snap = Snapshot::read(&path).unwrap();
        assert!(snap.has_partial_tail());
        assert_eq!(snap.lines().collect::<Vec<_>>(), vec!["line one"]);
        assert_eq!(snap.text(), "line one\nline \u{FFFD}");
    }
}
