//! Line-oriented text buffer.
//!
//! A [`TextBuffer`] is a plain `Vec<String>`, one entry per `\n`-separated
//! line. Splitting and joining are exact inverses: a trailing newline shows
//! up as a final empty line and `\r` stays part of its line. The public API is 1-based (as users count
//! lines and columns); the crate-internal mutators used by the text commands
//! take 0-based indexes.
//!
//! Columns count `char`s, not bytes, so every column maps onto a char
//! boundary and multi-byte text can be addressed the same way as ASCII.

use crate::error::{EditError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a buffer from file content, splitting on `\n` only.
    /// Empty content yields zero lines.
    pub fn from_content(content: &str) -> Self {
        if content.is_empty() {
            return Self::new();
        }
        Self {
            lines: content.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn as_string(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line by 1-based number
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Renders lines `start..=end` (1-based) with right-aligned line numbers.
    ///
    /// `end` is clamped to the last line. An empty buffer renders as an empty
    /// string whatever the range.
    pub fn show(&self, start: usize, end: usize) -> Result<String> {
        if self.lines.is_empty() {
            return Ok(String::new());
        }
        if start < 1 || start > self.lines.len() {
            return Err(EditError::OutOfRange(format!(
                "start line {} outside 1..={}",
                start,
                self.lines.len()
            )));
        }
        if end < start {
            return Err(EditError::OutOfRange(format!(
                "end line {} before start line {}",
                end, start
            )));
        }

        let end = end.min(self.lines.len());
        let width = end.to_string().len();
        let mut out = String::new();
        for (idx, line) in self.lines[start - 1..end].iter().enumerate() {
            out.push_str(&format!("{:>width$}: {}\n", start + idx, line, width = width));
        }
        Ok(out)
    }

    // --- mutators for the text commands (0-based) ---

    pub(crate) fn line_at(&self, idx: usize) -> &str {
        &self.lines[idx]
    }

    pub(crate) fn push_line(&mut self, line: String) -> usize {
        self.lines.push(line);
        self.lines.len() - 1
    }

    pub(crate) fn remove_line(&mut self, idx: usize) -> String {
        self.lines.remove(idx)
    }

    pub(crate) fn set_line(&mut self, idx: usize, line: String) -> String {
        std::mem::replace(&mut self.lines[idx], line)
    }

    /// Replaces `remove` lines starting at `idx` with `insert`.
    pub(crate) fn splice_lines(&mut self, idx: usize, remove: usize, insert: Vec<String>) {
        self.lines.splice(idx..idx + remove, insert);
    }
}

/// Number of chars in `s`
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the char at `col_idx` (0-based). `col_idx == char_len(s)`
/// maps to `s.len()`.
pub(crate) fn byte_offset(s: &str, col_idx: usize) -> usize {
    s.char_indices()
        .nth(col_idx)
        .map(|(offset, _)| offset)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_content() {
        let buffer = TextBuffer::from_content("hello\nworld");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(1), Some("hello"));
        assert_eq!(buffer.line(2), Some("world"));
        assert_eq!(buffer.line(0), None);
        assert_eq!(buffer.line(3), None);
    }

    #[test]
    fn test_from_content_keeps_every_byte() {
        for content in ["a\nb\n", "a\r\nb", "\n", "\n\nx", "tail\r\n"] {
            let buffer = TextBuffer::from_content(content);
            assert_eq!(buffer.as_string(), content, "content {:?}", content);
        }
        assert_eq!(TextBuffer::from_content("a\nb\n").lines(), ["a", "b", ""]);
        assert_eq!(TextBuffer::from_content("a\r\nb").line(1), Some("a\r"));
    }

    #[test]
    fn test_empty_content_has_no_lines() {
        let buffer = TextBuffer::from_content("");
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_string(), "");
    }

    #[test]
    fn test_as_string_joins_lines() {
        let buffer = TextBuffer::from_lines(["a", "", "c"]);
        assert_eq!(buffer.as_string(), "a\n\nc");
    }

    #[test]
    fn test_show_pads_line_numbers() {
        let buffer = TextBuffer::from_lines((1..=10).map(|i| format!("line {}", i)));
        let out = buffer.show(8, 10).unwrap();
        assert_eq!(out, " 8: line 8\n 9: line 9\n10: line 10\n");
    }

    #[test]
    fn test_show_clamps_end() {
        let buffer = TextBuffer::from_lines(["a", "b"]);
        assert_eq!(buffer.show(2, 99).unwrap(), "2: b\n");
    }

    #[test]
    fn test_show_rejects_bad_ranges() {
        let buffer = TextBuffer::from_lines(["a", "b"]);
        assert!(matches!(buffer.show(0, 1), Err(EditError::OutOfRange(_))));
        assert!(matches!(buffer.show(3, 4), Err(EditError::OutOfRange(_))));
        assert!(matches!(buffer.show(2, 1), Err(EditError::OutOfRange(_))));
    }

    #[test]
    fn test_show_empty_buffer() {
        assert_eq!(TextBuffer::new().show(1, 5).unwrap(), "");
    }

    #[test]
    fn test_byte_offset_multibyte() {
        let s = "héllo";
        assert_eq!(char_len(s), 5);
        assert_eq!(byte_offset(s, 0), 0);
        assert_eq!(byte_offset(s, 2), 3);
        assert_eq!(byte_offset(s, 5), s.len());
    }
}
