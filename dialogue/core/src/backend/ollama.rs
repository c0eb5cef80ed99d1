//! Ollama Backend Implementation
//!
//! Inference client for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! - `/api/generate` - Generate completions, streamed as newline-delimited JSON
//! - `/api/tags` - List available models
//!
//! Each streamed line looks like `{"response":"Hel","done":false}`; the last
//! one carries `"done":true`. A line with an `"error"` field aborts the turn.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::traits::{
    GenerateRequest, LlmBackend, ModelInfo, SamplingOptions, StreamEvent, STREAM_CHANNEL_CAPACITY,
};
use crate::config::OllamaSettings;
use crate::error::BackendError;

/// Timeout for the `/api/tags` listing
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest slice of an error body quoted back to the player
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Ollama backend client
#[derive(Clone)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// Ceiling for a whole generation request
    request_timeout: Duration,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed (e.g. TLS backend
    /// initialisation failure).
    pub fn new(
        host: impl Into<String>,
        port: u16,
        request_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            host: host.into(),
            port,
            request_timeout,
            http_client,
        })
    }

    /// Create from the `[ollama]` configuration section
    ///
    /// # Errors
    ///
    /// See [`OllamaBackend::new`].
    pub fn from_settings(settings: &OllamaSettings) -> Result<Self, BackendError> {
        Self::new(settings.host.clone(), settings.port, settings.request_timeout)
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get generate endpoint URL
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn generate(&self, request: GenerateRequest) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        let client = self.http_client.clone();
        let url = self.generate_url();
        let timeout = self.request_timeout;
        let body = GenerateBody::from(request);

        tokio::spawn(async move {
            match drive_stream(&client, &url, &body, timeout, &tx).await {
                Ok(TurnEnd::Completed(full)) => {
                    tracing::debug!(len = full.len(), "Generation complete");
                    let _ = tx.send(StreamEvent::Completed(full)).await;
                }
                Ok(TurnEnd::Detached) => {
                    tracing::debug!("Receiver dropped, abandoning generation");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Generation failed");
                    let _ = tx.send(StreamEvent::Failed(e.to_string())).await;
                }
            }
        });

        rx
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&e, TAGS_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Protocol(describe_status(status, &body)));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Protocol(format!("malformed model listing: {e}")))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                size: m.size,
            })
            .collect())
    }
}

/// JSON body for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateBody {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: SamplingOptions,
}

impl From<GenerateRequest> for GenerateBody {
    fn from(request: GenerateRequest) -> Self {
        Self {
            model: request.model,
            prompt: request.prompt,
            system: request.system,
            stream: true,
            options: request.options,
        }
    }
}

/// One line of the streamed response
#[derive(Debug, Default, Deserialize, PartialEq)]
pub(crate) struct GenerateChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `/api/tags` response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

/// How a stream ended without an error
enum TurnEnd {
    /// `done` arrived (or the body ended after some text)
    Completed(String),
    /// Nobody is listening any more
    Detached,
}

/// What to do after forwarding one chunk
enum Flow {
    Continue,
    Done,
    Detached,
}

/// Run one streaming request, forwarding deltas as they arrive
async fn drive_stream(
    client: &reqwest::Client,
    url: &str,
    body: &GenerateBody,
    timeout: Duration,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<TurnEnd, BackendError> {
    tracing::debug!(model = %body.model, prompt_len = body.prompt.len(), "Sending streaming request");

    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| BackendError::from_reqwest(&e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(BackendError::Protocol(describe_status(status, &text)));
    }

    let mut stream = response.bytes_stream();
    let mut decoder = NdjsonDecoder::default();
    let mut full_response = String::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| BackendError::from_reqwest(&e, timeout))?;
        for line in decoder.push(&bytes) {
            match forward_chunk(line, &mut full_response, tx).await? {
                Flow::Continue => {}
                Flow::Done => return Ok(TurnEnd::Completed(full_response)),
                Flow::Detached => return Ok(TurnEnd::Detached),
            }
        }
    }

    // Body ended; a final line may lack its newline
    if let Some(line) = decoder.finish() {
        match forward_chunk(line, &mut full_response, tx).await? {
            Flow::Continue | Flow::Done => {}
            Flow::Detached => return Ok(TurnEnd::Detached),
        }
    }

    if full_response.is_empty() {
        Err(BackendError::Protocol(
            "stream ended without a completion flag".to_string(),
        ))
    } else {
        tracing::debug!("Stream ended without done flag, completing with received text");
        Ok(TurnEnd::Completed(full_response))
    }
}

async fn forward_chunk(
    chunk: GenerateChunk,
    full_response: &mut String,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<Flow, BackendError> {
    if let Some(error) = chunk.error {
        return Err(BackendError::Protocol(error));
    }

    if let Some(text) = chunk.response.filter(|t| !t.is_empty()) {
        full_response.push_str(&text);
        if tx.send(StreamEvent::Delta(text)).await.is_err() {
            return Ok(Flow::Detached);
        }
    }

    Ok(if chunk.done { Flow::Done } else { Flow::Continue })
}

/// Format a non-2xx status plus a short excerpt of the body
fn describe_status(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{status} ({excerpt})")
    }
}

/// Newline-delimited JSON framing over raw bytes
///
/// Lines are split on `\n` before UTF-8 decoding, so a multi-byte character
/// torn across two network chunks is reassembled intact.
#[derive(Debug, Default)]
pub(crate) struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Feed bytes, returning every complete, well-formed line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<GenerateChunk> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(chunk) = parse_line(&line[..line.len() - 1]) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Parse whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<GenerateChunk> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<GenerateChunk> {
    let Ok(text) = std::str::from_utf8(line) else {
        tracing::debug!(len = line.len(), "Skipping non-UTF-8 stream line");
        return None;
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed stream line");
            None
        }
    }
}
