use async_trait::async_trait;
use quill_core::Language;
use serde::Deserialize;

use crate::AiError;

/// Result of a formatting pass: the rewritten document plus whatever diff
/// metadata the backend produced (opaque to this crate; the host may render
/// it).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormatOutcome {
    #[serde(rename = "formattedCode", alias = "formatted_code")]
    pub formatted_code: String,
    #[serde(default)]
    pub diff: serde_json::Value,
}

/// The completion backend, treated as an opaque remote function.
///
/// Calls may be slow and may fail; neither blocks UI interaction. No timeout
/// is assumed by the pipeline — a slow `completion` call simply leaves it in
/// the requesting state until the result arrives (and is then possibly
/// discarded as stale).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask for the text to suggest at `cursor_offset` into `document`.
    async fn completion(
        &self,
        document: &str,
        cursor_offset: usize,
        language: Language,
    ) -> Result<String, AiError>;

    /// Reformat `document`. Used fire-and-forget after an acceptance.
    async fn format(&self, document: &str, language: Language) -> Result<FormatOutcome, AiError>;
}
