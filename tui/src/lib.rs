//! llm-rpg TUI - Terminal surface for the dialogue game
//!
//! Renders the room and the dialogue box with ratatui and feeds key presses
//! to the headless [`dialogue_core::Game`].
//!
//! # Architecture
//!
//! - **App**: Event loop, frame timing, startup health check
//! - **Input**: Key → `GameAction` mapping and held-key smoothing
//! - **Widgets**: Room, dialogue box and title card
//! - **Theme**: Colour palette

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::App;
