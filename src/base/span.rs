//! Source text positions and ranges.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

/// A zero-based line and character position as written to the graph.
///
/// `character` counts UTF-16 code units, matching the `utf-16` position
/// encoding announced in the metadata vertex.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A start/end pair of [`Position`]s.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug, Serialize)]
pub struct LineRange {
    pub start: Position,
    pub end: Position,
}

impl LineRange {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Index for converting byte offsets into line/character positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    text: Arc<str>,
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self { text, line_starts }
    }

    /// Convert a byte offset to a position.
    ///
    /// Offsets past the end of the text clamp to the end.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(TextSize::of(self.text.as_ref()));
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = usize::from(self.line_starts[line]);
        let end = usize::from(offset);
        let character = self
            .text
            .get(line_start..end)
            .map(|slice| slice.encode_utf16().count())
            .unwrap_or(end - line_start);

        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    /// Convert a byte range to a line range.
    pub fn line_range(&self, range: TextRange) -> LineRange {
        LineRange::new(self.position(range.start()), self.position(range.end()))
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines (never true, an empty text has one line).
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_single_line() {
        let index = LineIndex::new("export const x = 10;");

        assert_eq!(index.position(TextSize::from(0)), Position::new(0, 0));
        assert_eq!(index.position(TextSize::from(13)), Position::new(0, 13));
    }

    #[test]
    fn test_position_multi_line() {
        let index = LineIndex::new("hello\nworld\n!");

        assert_eq!(index.position(TextSize::from(5)), Position::new(0, 5));
        assert_eq!(index.position(TextSize::from(6)), Position::new(1, 0));
        assert_eq!(index.position(TextSize::from(11)), Position::new(1, 5));
        assert_eq!(index.position(TextSize::from(12)), Position::new(2, 0));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_position_counts_utf16_units() {
        // 'é' is two UTF-8 bytes but one UTF-16 unit, '😀' is four bytes and two units.
        let index = LineIndex::new("é😀x");

        assert_eq!(index.position(TextSize::from(2)), Position::new(0, 1));
        assert_eq!(index.position(TextSize::from(6)), Position::new(0, 3));
    }

    #[test]
    fn test_position_clamps_past_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(TextSize::from(40)), Position::new(0, 2));
    }

    #[test]
    fn test_line_range() {
        let index = LineIndex::new("let a;\nlet b;");
        let range = TextRange::new(TextSize::from(11), TextSize::from(12));

        assert_eq!(
            index.line_range(range),
            LineRange::new(Position::new(1, 4), Position::new(1, 5))
        );
    }
}
