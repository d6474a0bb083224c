//! Core shared types for Quill.
//!
//! This crate is intentionally small and dependency-light: text positions,
//! line indexing, and language identification. Everything stateful lives in
//! higher layers.

mod language;
mod text;

pub use language::Language;
pub use text::{LineIndex, Position};
pub use text_size::{TextRange, TextSize};
