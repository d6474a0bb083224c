use std::time::Duration;

use async_trait::async_trait;
use quill_core::Language;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AiError, CompletionClient, FormatOutcome};

/// HTTP implementation of [`CompletionClient`] against the host bridge.
///
/// The bridge wraps every response in the same envelope:
/// `{"status": "success" | "error", "data": ..., "message": ...}`.
#[derive(Clone)]
pub struct HttpBridgeClient {
    base_url: Url,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl HttpBridgeClient {
    /// No request timeout: a slow backend is left to resolve on its own and
    /// the pipeline discards the result if it arrives too late.
    pub fn new(base_url: Url) -> Result<Self, AiError> {
        Self::build(base_url, None)
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, AiError> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: Url, timeout: Option<Duration>) -> Result<Self, AiError> {
        // Normalize so `join` treats the base as a directory.
        let base_str = base_url.as_str().trim_end_matches('/').to_string();
        let base_url = Url::parse(&format!("{base_str}/"))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn post<Req, Data>(&self, path: &str, body: &Req) -> Result<Data, AiError>
    where
        Req: Serialize + Sync,
        Data: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?.error_for_status()?;
        let envelope: Envelope<Data> = response.json().await?;

        match envelope.status.as_str() {
            "success" => envelope.data.ok_or_else(|| {
                AiError::UnexpectedResponse("success response carried no data".to_string())
            }),
            _ => Err(AiError::Backend(
                envelope
                    .message
                    .unwrap_or_else(|| "backend reported an error".to_string()),
            )),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpBridgeClient {
    async fn completion(
        &self,
        document: &str,
        cursor_offset: usize,
        language: Language,
    ) -> Result<String, AiError> {
        self.post(
            "completion",
            &CompletionParams {
                code: document,
                cursor_offset,
                file_type: language.as_str(),
            },
        )
        .await
    }

    async fn format(&self, document: &str, language: Language) -> Result<FormatOutcome, AiError> {
        self.post(
            "format",
            &FormatParams {
                code: document,
                file_type: language.as_str(),
            },
        )
        .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionParams<'a> {
    code: &'a str,
    cursor_offset: usize,
    file_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatParams<'a> {
    code: &'a str,
    file_type: &'a str,
}

// `Option` fields fall back to `None` when absent without `#[serde(default)]`,
// which would force a `T: Default` bound the generic callers cannot meet.
#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    message: Option<String>,
}
