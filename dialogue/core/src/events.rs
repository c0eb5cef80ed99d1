//! Game Actions
//!
//! Discrete actions sent from an input surface to the game. Surfaces only
//! report what the player did; [`Game`](crate::game::Game) decides what it
//! means in the current screen and dialogue phase.

use serde::{Deserialize, Serialize};

/// Actions from an input surface to the game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ============================================
    // Room
    // ============================================
    /// Walk one step
    Move {
        /// Horizontal intent (-1, 0 or 1)
        dx: i32,
        /// Vertical intent (-1, 0 or 1)
        dy: i32,
    },

    /// Talk to the NPC in range
    Interact,

    // ============================================
    // Dialogue
    // ============================================
    /// Send the input line
    SubmitMessage,

    /// Type one character
    AppendChar(char),

    /// Delete the last character
    Backspace,

    /// Scroll the dialogue text up one line
    ScrollUp,

    /// Scroll the dialogue text down one line
    ScrollDown,

    /// Leave the dialogue
    ExitDialogue,

    // ============================================
    // Lifecycle
    // ============================================
    /// Leave the title screen
    TitleStart,

    /// Stop the game
    Quit,
}

impl GameAction {
    /// Whether this action only makes sense inside a dialogue
    #[must_use]
    pub fn is_dialogue_action(&self) -> bool {
        matches!(
            self,
            Self::SubmitMessage
                | Self::AppendChar(_)
                | Self::Backspace
                | Self::ScrollUp
                | Self::ScrollDown
                | Self::ExitDialogue
        )
    }
}
