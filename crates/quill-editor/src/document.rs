use quill_core::{Language, LineIndex, Position, TextSize};

/// An open document: text, declared language, a monotonic version counter
/// bumped on every mutation, and a dirty flag cleared on save.
///
/// Owned exclusively by an [`crate::EditorSession`]; mutation happens only
/// through the session's entry points.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    line_index: LineIndex,
    language: Language,
    version: u64,
    dirty: bool,
}

impl Document {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self {
            text,
            line_index,
            language,
            version: 0,
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn line_count(&self) -> u32 {
        self.line_index.line_count()
    }

    /// Visible text of a line, newline excluded.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let range = self.line_index.line_range(line)?;
        let start = u32::from(range.start()) as usize;
        let end = u32::from(range.end()) as usize;
        Some(&self.text[start..end])
    }

    /// Byte offset of a position. `None` when the position is out of bounds.
    pub fn offset_of(&self, position: Position) -> Option<usize> {
        self.line_index.offset(position).map(u32::from).map(|o| o as usize)
    }

    /// Nearest valid position for `position`: line clamped to the document,
    /// column clamped to the line end and snapped back to a char boundary.
    pub fn clamp_position(&self, position: Position) -> Position {
        let line = position.line.min(self.line_count() - 1);
        let line_text = self
            .line_text(line)
            .expect("clamped line is in bounds");
        let mut column = (position.column as usize).min(line_text.len());
        while column > 0 && !line_text.is_char_boundary(column) {
            column -= 1;
        }
        Position::new(line, column as u32)
    }

    /// Position of a byte offset in the current snapshot (clamped to EOF).
    pub fn position_at(&self, offset: usize) -> Position {
        self.line_index.position(TextSize::from(offset as u32))
    }

    pub(crate) fn insert(&mut self, offset: usize, text: &str) {
        self.text.insert_str(offset, text);
        self.touch();
    }

    pub(crate) fn replace_all(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.touch();
    }

    pub(crate) fn remove(&mut self, start: usize, end: usize) {
        self.text.replace_range(start..end, "");
        self.touch();
    }

    fn touch(&mut self) {
        self.line_index = LineIndex::new(&self.text);
        self.version += 1;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_monotonic_across_mutations() {
        let mut doc = Document::new("ab", Language::Python);
        assert_eq!(doc.version(), 0);
        doc.insert(2, "c");
        doc.remove(0, 1);
        doc.replace_all("xyz");
        assert_eq!(doc.version(), 3);
    }

    #[test]
    fn dirty_flag_tracks_saves() {
        let mut doc = Document::new("", Language::PlainText);
        assert!(!doc.is_dirty());
        doc.insert(0, "a");
        assert!(doc.is_dirty());
        doc.mark_saved();
        assert!(!doc.is_dirty());
        // Saving does not bump the version.
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn clamp_snaps_to_char_boundaries() {
        let doc = Document::new("héllo", Language::PlainText);
        // Column 2 lands inside the two-byte 'é'.
        assert_eq!(doc.clamp_position(Position::new(0, 2)), Position::new(0, 1));
        assert_eq!(doc.clamp_position(Position::new(9, 9)), Position::new(0, 6));
    }

    #[test]
    fn line_text_excludes_newline() {
        let doc = Document::new("one\ntwo\n", Language::PlainText);
        assert_eq!(doc.line_text(0), Some("one"));
        assert_eq!(doc.line_text(1), Some("two"));
        assert_eq!(doc.line_text(2), Some(""));
        assert_eq!(doc.line_text(3), None);
    }
}
