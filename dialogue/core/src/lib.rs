//! Dialogue Core - Headless game logic for llm-rpg
//!
//! A small room-exploration game where NPCs talk through a locally hosted
//! Ollama model. This crate holds everything except drawing and key
//! handling, so it can drive a terminal UI, a graphical front end, or run
//! headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         UI Surface (TUI)                         │
//! │        GameAction (down)              GameSnapshot (up)          │
//! └───────────────┬──────────────────────────────▲───────────────────┘
//!                 │                              │
//! ┌───────────────▼──────────────────────────────┴───────────────────┐
//! │                              Game                                │
//! │  ┌─────────┐  ┌──────────┐  ┌────────────────────────────────┐   │
//! │  │  World  │  │ NpcRoster│  │        DialogueSystem          │   │
//! │  │(player, │  │          │  │  ConversationSession           │   │
//! │  │ room)   │  │          │  │   ├─ StreamProcessor           │   │
//! │  └─────────┘  └──────────┘  │   └─ Viewport                  │   │
//! │                             └──────────────┬─────────────────┘   │
//! └────────────────────────────────────────────┼─────────────────────┘
//!                                              │ mpsc (one per turn)
//!                                   ┌──────────▼──────────┐
//!                                   │ LlmBackend (Ollama) │
//!                                   │   detached task     │
//!                                   └─────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Game`]: Routes actions, advances frames, produces snapshots
//! - [`DialogueSystem`]: The conversation state machine
//! - [`StreamProcessor`]: Thinking-block stripping over a streamed turn
//! - [`Viewport`]: Fixed-width wrapping with auto-follow scrolling
//! - [`OllamaBackend`]: Streaming client for Ollama's generate endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use dialogue_core::{load_config, Game, GameAction, OllamaBackend};
//!
//! let config = load_config()?;
//! let backend = Arc::new(OllamaBackend::from_settings(&config.ollama)?);
//! let mut game = Game::new(backend, &config);
//!
//! loop {
//!     // Feed input
//!     game.handle_action(GameAction::Interact);
//!     // Once per frame
//!     game.update(frame_time);
//!     let snapshot = game.snapshot();
//!     // Draw snapshot
//! }
//! ```
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod events;
pub mod game;
pub mod npc;
pub mod session;
pub mod snapshot;
pub mod streaming;
pub mod viewport;
pub mod world;

// Re-exports for convenience
pub use backend::{
    GenerateRequest, LlmBackend, ModelInfo, OllamaBackend, SamplingOptions, StreamEvent,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, ConfigError,
    ConfigOverrides, ConfigSource, DialogueSettings, GameConfig, GameSettings, NpcConfig,
    OllamaSettings,
};
pub use dialogue::{DialoguePhase, DialogueSystem};
pub use error::{BackendError, DialogueError, SubmitRejection};
pub use events::GameAction;
pub use game::Game;
pub use npc::{Npc, NpcId, NpcRoster, Personality};
pub use session::{ActivePhase, ConversationSession, HistoryEntry, SessionId, Speaker};
pub use snapshot::{DialogueSnapshot, GameSnapshot, NpcView, PlayerView, Screen};
pub use streaming::{strip_thinking, StreamProcessor, TurnOutcome};
pub use viewport::{wrap_fixed, Viewport};
pub use world::{Facing, Position, Rect, World};
