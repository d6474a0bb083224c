//! The inline "ghost text" suggestion pipeline.
//!
//! Watches typing on an [`quill_editor::EditorSession`], debounces fetches to
//! a completion backend, overlays the suggested text at the cursor captured
//! at request time, and resolves races between pending results, further
//! edits, and cursor movement by compare-and-discard on the captured
//! document version. See [`SuggestionPipeline`] for the lifecycle.

mod client;
mod error;
mod http;
mod overlay;
mod pipeline;

pub use client::{CompletionClient, FormatOutcome};
pub use error::AiError;
pub use http::HttpBridgeClient;
pub use overlay::{GhostOverlay, MarkerOverlay, OverlayHandle};
pub use pipeline::{RequestId, SuggestionConfig, SuggestionPipeline, SuggestionRequest};
