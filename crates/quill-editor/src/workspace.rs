use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quill_core::Language;

use crate::{Document, EditorSession};

/// Explicit registry of open editor sessions, owned by the application root.
///
/// Replaces ambient globals: created when a workspace is opened, dropped when
/// it closes. The "active" session is the one the suggestion pipeline and the
/// key bindings act on.
#[derive(Default)]
pub struct Workspace {
    sessions: HashMap<PathBuf, Arc<EditorSession>>,
    active: Option<PathBuf>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document and make it active. If the path is already open, the
    /// existing session is activated and returned unchanged.
    pub fn open(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Arc<EditorSession> {
        let path = path.into();
        if let Some(existing) = self.sessions.get(&path) {
            let existing = Arc::clone(existing);
            self.active = Some(path);
            return existing;
        }

        let language = Language::from_path(&path);
        tracing::debug!(path = %path.display(), %language, "opening document");
        let session = Arc::new(EditorSession::new(Document::new(text, language)));
        self.sessions.insert(path.clone(), Arc::clone(&session));
        self.active = Some(path);
        session
    }

    /// Close a document. When the active one is closed, activation falls to
    /// an arbitrary remaining session, if any.
    pub fn close(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.sessions.remove(path).is_none() {
            return false;
        }
        tracing::debug!(path = %path.display(), "closed document");
        if self.active.as_deref() == Some(path) {
            self.active = self.sessions.keys().next().cloned();
        }
        true
    }

    pub fn activate(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.sessions.contains_key(path) {
            self.active = Some(path.to_path_buf());
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<Arc<EditorSession>> {
        let path = self.active.as_ref()?;
        self.sessions.get(path).cloned()
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        self.sessions.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_activates_and_infers_language() {
        let mut workspace = Workspace::new();
        let session = workspace.open("src/app.py", "print()");
        assert_eq!(session.language(), Language::Python);
        assert_eq!(workspace.active_path(), Some(Path::new("src/app.py")));
    }

    #[test]
    fn reopening_returns_the_same_session() {
        let mut workspace = Workspace::new();
        let first = workspace.open("a.js", "let x;");
        workspace.open("b.js", "");
        let again = workspace.open("a.js", "ignored");
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.text(), "let x;");
        assert_eq!(workspace.active_path(), Some(Path::new("a.js")));
    }

    #[test]
    fn closing_the_active_document_falls_back() {
        let mut workspace = Workspace::new();
        workspace.open("a.py", "");
        workspace.open("b.py", "");
        assert!(workspace.close("b.py"));
        assert_eq!(workspace.active_path(), Some(Path::new("a.py")));
        assert!(workspace.close("a.py"));
        assert!(workspace.active().is_none());
        assert!(!workspace.close("a.py"));
    }

    #[test]
    fn activate_requires_an_open_document() {
        let mut workspace = Workspace::new();
        workspace.open("a.py", "");
        assert!(!workspace.activate("missing.py"));
        assert!(workspace.activate("a.py"));
    }
}
