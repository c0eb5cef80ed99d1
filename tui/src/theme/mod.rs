//! Theme and Colors
//!
//! Palette for the room and the dialogue box. The room uses muted floor and
//! furniture tones so the NPCs and the player stand out.

use ratatui::style::Color;

// ============================================================================
// Room Palette
// ============================================================================

/// Floor fill
pub const FLOOR: Color = Color::Rgb(46, 42, 56);

/// Outer wall
pub const WALL: Color = Color::Rgb(120, 110, 140);

/// Furniture blocks
pub const FURNITURE: Color = Color::Rgb(139, 101, 72);

/// The player sprite
pub const PLAYER: Color = Color::Rgb(255, 223, 128);

/// Name label above an NPC
pub const LABEL: Color = Color::Rgb(230, 230, 230);

/// Highlight for the NPC the player can talk to
pub const INTERACT_HINT: Color = Color::Rgb(255, 223, 128);

/// NPC sprite colours, picked at random once per run
pub const NPC_PALETTE: &[Color] = &[
    Color::Rgb(255, 182, 193), // pink
    Color::Rgb(150, 180, 255), // blue
    Color::Rgb(130, 220, 130), // green
    Color::Rgb(255, 150, 120), // coral
    Color::Rgb(200, 160, 255), // lavender
    Color::Rgb(120, 220, 220), // teal
];

// ============================================================================
// Dialogue Colors
// ============================================================================

/// Dialogue box border
pub const DIALOGUE_BORDER: Color = Color::Magenta;

/// NPC reply text
pub const NPC_TEXT: Color = Color::Rgb(235, 235, 235);

/// Text shown before the thinking block closes
pub const THINKING_TEXT: Color = Color::Rgb(150, 180, 255);

/// Player input line
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Hints and status text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Scroll arrows
pub const SCROLL_INDICATOR: Color = Color::Yellow;

/// Error text
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Title card accent
pub const TITLE_ACCENT: Color = Color::Magenta;
