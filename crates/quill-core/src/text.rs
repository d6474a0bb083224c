//! Text model primitives: positions, line indexing, and conversions.

use text_size::{TextRange, TextSize};

/// A position in a document expressed as (line, UTF-8 byte offset into that
/// line).
///
/// The column always lies on a character boundary of the document snapshot it
/// was derived from; it is invalidated by any mutation of that snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Pre-computed line start/end offsets for a particular text snapshot.
///
/// Line ends exclude the terminating newline, so `line_range` yields the
/// visible text of a line and `line_end` is the offset a cursor sitting at
/// the end of that line occupies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(64);
        let mut line_ends = Vec::with_capacity(64);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_ends.push(TextSize::from(i as u32));
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_ends.push(TextSize::from(i as u32));
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// End of the line excluding its newline terminator.
    #[inline]
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        self.line_ends.get(line as usize).copied()
    }

    /// Byte range of a line's visible text (newline excluded).
    pub fn line_range(&self, line: u32) -> Option<TextRange> {
        Some(TextRange::new(
            self.line_start(line)?,
            self.line_end(line)?,
        ))
    }

    fn line_index(&self, offset: TextSize) -> usize {
        // Clamp offsets that point past the end; callers may pass `text_len`
        // when referring to EOF.
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a (line, byte column) position.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(self.text_len);
        let line = self.line_index(offset);
        let line_start = self.line_starts[line];
        let line_end = self.line_ends[line];
        let column = offset.min(line_end) - line_start;
        Position {
            line: line as u32,
            column: u32::from(column),
        }
    }

    /// Convert a (line, byte column) position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds or the column points past
    /// the end of the line.
    pub fn offset(&self, position: Position) -> Option<TextSize> {
        let start = self.line_start(position.line)?;
        let end = self.line_end(position.line)?;
        let offset = start + TextSize::from(position.column);
        if offset > end {
            return None;
        }
        Some(offset)
    }
}
