//! LLM Backend Traits
//!
//! Trait definitions for the inference client. The dialogue state machine only
//! ever talks to an [`LlmBackend`], so tests can drive it with scripted events
//! and the game can swap model servers without touching dialogue logic.
//!
//! # Contract
//!
//! One call to [`LlmBackend::generate`] is one model turn. The backend returns
//! the receiving half of a channel immediately and streams [`StreamEvent`]s
//! into it from a detached task:
//!
//! - zero or more `Delta`s, in order
//! - then exactly one terminal event (`Completed` or `Failed`)
//!
//! The text carried by `Completed` equals the concatenation of every `Delta`
//! emitted for that turn.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::BackendError;

/// Capacity of the per-turn event channel
pub const STREAM_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the inference client for one turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental text fragment
    Delta(String),
    /// Generation finished; carries the full concatenated text
    Completed(String),
    /// The turn failed; carries a human-readable message
    Failed(String),
}

impl StreamEvent {
    /// Whether this event ends the turn
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// Sampling options forwarded to the model server
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplingOptions {
    /// Randomness (higher = more creative)
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Penalty applied to repeated tokens
    pub repeat_penalty: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
        }
    }
}

/// One generation request
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    /// Model identifier
    pub model: String,
    /// Full prompt (history, player line and name cue)
    pub prompt: String,
    /// System instruction (NPC personality)
    pub system: String,
    /// Sampling options
    pub options: SamplingOptions,
}

impl GenerateRequest {
    /// Create a request with default sampling options
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: system.into(),
            options: SamplingOptions::default(),
        }
    }

    /// Override sampling options
    #[must_use]
    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }
}

/// Information about a model the server has available
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier, e.g. `qwen3:8b`
    pub name: String,
    /// Size on disk in bytes (if reported)
    pub size: Option<u64>,
}

/// LLM backend trait
///
/// Implement this to add support for another model server.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logs and labels (e.g. "Ollama")
    fn name(&self) -> &str;

    /// Start one streaming generation.
    ///
    /// Must not block: the network work happens on a detached task. Dropping
    /// the returned receiver detaches the caller from the turn.
    fn generate(&self, request: GenerateRequest) -> mpsc::Receiver<StreamEvent>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError>;

    /// Check if a specific model is available
    async fn has_model(&self, model: &str) -> Result<bool, BackendError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.name == model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(!StreamEvent::Delta("hi".into()).is_terminal());
        assert!(StreamEvent::Completed("hi".into()).is_terminal());
        assert!(StreamEvent::Failed("boom".into()).is_terminal());
    }

    #[test]
    fn test_request_defaults() {
        let request = GenerateRequest::new("qwen3:8b", "Hello", "Be nice");
        assert_eq!(request.options, SamplingOptions::default());
        assert_eq!(request.options.temperature, 0.7);
        assert_eq!(request.options.top_p, 0.9);
        assert_eq!(request.options.repeat_penalty, 1.1);
    }
}
