use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use quill_core::Position;

/// Disposable handle to one rendered ghost decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(u64);

/// Renders ghost text: a non-editable, dimmed preview anchored at a document
/// position. Showing never touches the document's text, version, or cursor.
///
/// The pipeline may call these methods while holding its own state lock, so
/// implementations must not call back into the pipeline.
pub trait GhostOverlay: Send + Sync {
    /// Render `text` anchored at `anchor` and return its handle.
    ///
    /// Returns `None` when a decoration is already present — at most one
    /// ghost text may exist, and the previous one must be fully cleared
    /// before a new `show` is accepted.
    fn show(&self, text: &str, anchor: Position) -> Option<OverlayHandle>;

    /// Remove the decoration and release its handle. Idempotent: clearing an
    /// empty overlay is a no-op.
    fn clear(&self);

    fn is_showing(&self) -> bool;
}

struct Marker {
    handle: OverlayHandle,
    text: String,
    anchor: Position,
}

/// In-memory [`GhostOverlay`]: records the current decoration for the host
/// to render (and for tests to observe).
#[derive(Default)]
pub struct MarkerOverlay {
    next_id: AtomicU64,
    marker: Mutex<Option<Marker>>,
}

impl MarkerOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently rendered ghost text and its anchor, if any.
    pub fn current(&self) -> Option<(String, Position)> {
        self.marker
            .lock()
            .as_ref()
            .map(|marker| (marker.text.clone(), marker.anchor))
    }
}

impl GhostOverlay for MarkerOverlay {
    fn show(&self, text: &str, anchor: Position) -> Option<OverlayHandle> {
        let mut marker = self.marker.lock();
        if marker.is_some() {
            tracing::warn!("refusing to render a second ghost text");
            return None;
        }
        let handle = OverlayHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        *marker = Some(Marker {
            handle,
            text: text.to_string(),
            anchor,
        });
        Some(handle)
    }

    fn clear(&self) {
        if let Some(marker) = self.marker.lock().take() {
            tracing::trace!(handle = ?marker.handle, "ghost text cleared");
        }
    }

    fn is_showing(&self) -> bool {
        self.marker.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_then_clear_round_trips() {
        let overlay = MarkerOverlay::new();
        assert!(!overlay.is_showing());
        let handle = overlay.show("ghost", Position::new(0, 3));
        assert!(handle.is_some());
        assert_eq!(
            overlay.current(),
            Some(("ghost".to_string(), Position::new(0, 3)))
        );
        overlay.clear();
        assert!(!overlay.is_showing());
        assert_eq!(overlay.current(), None);
    }

    #[test]
    fn second_show_is_refused_until_cleared() {
        let overlay = MarkerOverlay::new();
        let first = overlay.show("one", Position::new(0, 0));
        assert!(first.is_some());
        assert!(overlay.show("two", Position::new(0, 1)).is_none());
        // The refused show must not have replaced the decoration.
        assert_eq!(
            overlay.current(),
            Some(("one".to_string(), Position::new(0, 0)))
        );
        overlay.clear();
        let third = overlay.show("three", Position::new(0, 2));
        assert!(third.is_some());
        assert_ne!(first, third);
    }

    #[test]
    fn clear_is_idempotent() {
        let overlay = MarkerOverlay::new();
        overlay.show("ghost", Position::new(0, 0));
        overlay.clear();
        overlay.clear();
        assert!(!overlay.is_showing());
    }
}
