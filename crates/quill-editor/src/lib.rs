//! Editor session state for Quill: documents, cursors, and the typed event
//! subscriptions the suggestion pipeline hangs off of.
//!
//! The UI shell around this crate is an external collaborator; it drives a
//! session through the mutation entry points and observes it through
//! [`SessionObserver`].

mod document;
mod session;
mod workspace;

pub use document::Document;
pub use session::{ChangeEvent, EditKind, EditorSession, SessionObserver};
pub use workspace::Workspace;
