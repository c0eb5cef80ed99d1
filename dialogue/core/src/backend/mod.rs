//! LLM Backend Integration
//!
//! Abstracted access to the model server through a common trait interface.
//!
//! # Available Backends
//!
//! - **Ollama**: Local LLM server (default)
//!
//! # Usage
//!
//! ```ignore
//! use dialogue_core::backend::{GenerateRequest, LlmBackend, OllamaBackend};
//!
//! let backend = OllamaBackend::new("localhost", 11434, Duration::from_secs(120))?;
//! let mut rx = backend.generate(GenerateRequest::new("qwen3:8b", "Hello!", "Be kind."));
//! while let Some(event) = rx.recv().await {
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//! ```

mod ollama;
mod traits;

pub use ollama::OllamaBackend;
pub use traits::{
    GenerateRequest, LlmBackend, ModelInfo, SamplingOptions, StreamEvent, STREAM_CHANNEL_CAPACITY,
};
