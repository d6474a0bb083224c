use thiserror::Error;

/// Errors surfaced by the completion backend and the HTTP bridge.
///
/// None of these are fatal to the host: the suggestion pipeline logs them and
/// falls back to "no suggestion". A stale result is not an error at all and
/// never reaches this type.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("http error: {0}")]
    Http(reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("request timed out")]
    Timeout,
    /// The bridge answered with `status: "error"`.
    #[error("backend error: {0}")]
    Backend(String),
    /// The bridge answered `status: "success"` but the payload was unusable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}
