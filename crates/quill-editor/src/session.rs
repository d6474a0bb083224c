use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use quill_core::{Language, Position};

use crate::Document;

/// Classification of a document mutation.
///
/// Only [`EditKind::TypedInsertion`] may trigger a suggestion fetch; pure
/// deletions and programmatic replacements invalidate whatever is pending or
/// showing without scheduling anything new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    TypedInsertion,
    Deletion,
    Replacement,
}

/// Emitted after a document mutation has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: EditKind,
    /// Document version after the mutation.
    pub version: u64,
}

/// Typed event subscription on an [`EditorSession`].
///
/// `cursor_moved` fires only for cursor-only movement (explicit
/// `set_cursor`), never for the cursor displacement implied by an edit; an
/// edit already reports itself through `document_changed`.
pub trait SessionObserver: Send + Sync {
    fn document_changed(&self, event: &ChangeEvent);
    fn cursor_moved(&self, cursor: Position);
}

struct SessionState {
    document: Document,
    cursor: Position,
}

/// One open document plus its cursor, with observer notifications delivered
/// outside the state lock so observers may call back into the session.
pub struct EditorSession {
    state: Mutex<SessionState>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}

impl EditorSession {
    pub fn new(document: Document) -> Self {
        Self {
            state: Mutex::new(SessionState {
                document,
                cursor: Position::new(0, 0),
            }),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers.write().push(observer);
    }

    /// Snapshot of the full document text.
    pub fn text(&self) -> String {
        self.state.lock().document.text().to_string()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().document.version()
    }

    pub fn language(&self) -> Language {
        self.state.lock().document.language()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().document.is_dirty()
    }

    pub fn mark_saved(&self) {
        self.state.lock().document.mark_saved();
    }

    pub fn cursor(&self) -> Position {
        self.state.lock().cursor
    }

    /// Absolute byte offset of the cursor in the current snapshot.
    pub fn cursor_offset(&self) -> usize {
        let state = self.state.lock();
        state
            .document
            .offset_of(state.cursor)
            .expect("cursor is kept within document bounds")
    }

    /// Visible text of a line, newline excluded.
    pub fn line_text(&self, line: u32) -> Option<String> {
        self.state
            .lock()
            .document
            .line_text(line)
            .map(str::to_string)
    }

    /// Whether the cursor sits at the end of its line.
    pub fn cursor_at_line_end(&self) -> bool {
        let state = self.state.lock();
        match state.document.line_text(state.cursor.line) {
            Some(line) => state.cursor.column as usize >= line.len(),
            None => false,
        }
    }

    /// Cursor-only movement. Clamped to document bounds; no-op (and no
    /// notification) when the clamped target equals the current position.
    pub fn set_cursor(&self, position: Position) {
        let moved = {
            let mut state = self.state.lock();
            let clamped = state.document.clamp_position(position);
            if clamped == state.cursor {
                None
            } else {
                state.cursor = clamped;
                Some(clamped)
            }
        };
        if let Some(cursor) = moved {
            tracing::trace!(line = cursor.line, column = cursor.column, "cursor moved");
            let observers = self.observers.read().clone();
            for observer in observers {
                observer.cursor_moved(cursor);
            }
        }
    }

    /// Insert text at the cursor as a typed edit (the user pressed keys).
    pub fn insert_typed(&self, text: &str) {
        self.insert_at_cursor(text, EditKind::TypedInsertion);
    }

    /// Insert text at the cursor programmatically (e.g. committing an
    /// accepted suggestion). Never triggers a new suggestion fetch.
    pub fn insert_programmatic(&self, text: &str) {
        self.insert_at_cursor(text, EditKind::Replacement);
    }

    /// Delete the character before the cursor, if any.
    pub fn delete_backward(&self) {
        let event = {
            let mut state = self.state.lock();
            let offset = state
                .document
                .offset_of(state.cursor)
                .expect("cursor is kept within document bounds");
            if offset == 0 {
                return;
            }
            let text = state.document.text();
            let start = text
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i < offset)
                .last()
                .unwrap_or(0);
            state.document.remove(start, offset);
            state.cursor = state.document.position_at(start);
            ChangeEvent {
                kind: EditKind::Deletion,
                version: state.document.version(),
            }
        };
        self.notify_change(event);
    }

    /// Replace the whole document text programmatically, keeping the cursor
    /// clamped into the new text.
    pub fn replace_all(&self, text: &str) {
        let event = {
            let mut state = self.state.lock();
            state.document.replace_all(text);
            state.cursor = state.document.clamp_position(state.cursor);
            ChangeEvent {
                kind: EditKind::Replacement,
                version: state.document.version(),
            }
        };
        self.notify_change(event);
    }

    fn insert_at_cursor(&self, text: &str, kind: EditKind) {
        let event = {
            let mut state = self.state.lock();
            let offset = state
                .document
                .offset_of(state.cursor)
                .expect("cursor is kept within document bounds");
            state.document.insert(offset, text);
            state.cursor = state.document.position_at(offset + text.len());
            ChangeEvent {
                kind,
                version: state.document.version(),
            }
        };
        self.notify_change(event);
    }

    fn notify_change(&self, event: ChangeEvent) {
        tracing::trace!(kind = ?event.kind, version = event.version, "document changed");
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.document_changed(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        changes: Mutex<Vec<(EditKind, u64)>>,
        moves: Mutex<Vec<Position>>,
    }

    impl SessionObserver for Recorder {
        fn document_changed(&self, event: &ChangeEvent) {
            self.changes.lock().push((event.kind, event.version));
        }
        fn cursor_moved(&self, cursor: Position) {
            self.moves.lock().push(cursor);
        }
    }

    fn session(text: &str) -> (EditorSession, Arc<Recorder>) {
        let session = EditorSession::new(Document::new(text, Language::Python));
        let recorder = Arc::new(Recorder::default());
        session.subscribe(recorder.clone());
        (session, recorder)
    }

    #[test]
    fn typed_insert_advances_cursor_and_notifies() {
        let (session, recorder) = session("");
        session.insert_typed("pri");
        assert_eq!(session.text(), "pri");
        assert_eq!(session.cursor(), Position::new(0, 3));
        assert_eq!(session.cursor_offset(), 3);
        assert_eq!(
            recorder.changes.lock().as_slice(),
            &[(EditKind::TypedInsertion, 1)]
        );
        // Edits never report as cursor-only movement.
        assert!(recorder.moves.lock().is_empty());
    }

    #[test]
    fn programmatic_insert_is_a_replacement() {
        let (session, recorder) = session("");
        session.insert_programmatic("x");
        assert_eq!(
            recorder.changes.lock().as_slice(),
            &[(EditKind::Replacement, 1)]
        );
    }

    #[test]
    fn set_cursor_notifies_only_on_real_moves() {
        let (session, recorder) = session("hello\nworld");
        session.set_cursor(Position::new(1, 2));
        session.set_cursor(Position::new(1, 2));
        // Out-of-bounds clamps to the nearest valid spot.
        session.set_cursor(Position::new(7, 99));
        assert_eq!(
            recorder.moves.lock().as_slice(),
            &[Position::new(1, 2), Position::new(1, 5)]
        );
    }

    #[test]
    fn delete_backward_removes_one_char() {
        let (session, recorder) = session("");
        session.insert_typed("ab");
        session.delete_backward();
        assert_eq!(session.text(), "a");
        assert_eq!(session.cursor(), Position::new(0, 1));
        assert_eq!(
            recorder.changes.lock().last().copied(),
            Some((EditKind::Deletion, 2))
        );
        // At offset zero it is a no-op.
        session.delete_backward();
        session.delete_backward();
        assert_eq!(session.text(), "");
        assert_eq!(session.version(), 3);
        session.delete_backward();
        assert_eq!(session.version(), 3);
    }

    #[test]
    fn cursor_at_line_end_detection() {
        let (session, _) = session("print\n");
        session.set_cursor(Position::new(0, 5));
        assert!(session.cursor_at_line_end());
        session.set_cursor(Position::new(0, 3));
        assert!(!session.cursor_at_line_end());
    }

    #[test]
    fn replace_all_clamps_cursor_into_new_text() {
        let (session, _) = session("a longer line");
        session.set_cursor(Position::new(0, 13));
        session.replace_all("ok");
        assert_eq!(session.cursor(), Position::new(0, 2));
        assert_eq!(session.text(), "ok");
    }
}
