//! Render Snapshots
//!
//! Read-only views of the game handed to a rendering surface once per frame.
//! Surfaces never reach into live state; everything they draw is in here.

use serde::{Deserialize, Serialize};

use crate::npc::{NpcId, Personality};
use crate::world::{Facing, Position, Rect};

/// Which screen is up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    /// Title card, waiting for start
    #[default]
    Title,
    /// Walking around the room
    Playing,
}

/// One NPC as drawn
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpcView {
    /// Roster id
    pub id: NpcId,
    /// Display name
    pub name: String,
    /// Cosmetic kind
    pub kind: String,
    /// Conversational style
    pub personality: Personality,
    /// Top-left corner
    pub position: Position,
    /// Whether the name label is drawn
    pub label_visible: bool,
    /// Whether the player could talk to it right now
    pub interactable: bool,
    /// Whether it is in a dialogue
    pub in_dialogue: bool,
}

/// The player as drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerView {
    /// Footprint
    pub rect: Rect,
    /// Last movement direction
    pub facing: Facing,
}

/// The open dialogue as drawn
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogueSnapshot {
    /// NPC being talked to
    pub npc_name: String,
    /// Model answering for it
    pub model: String,
    /// Wrapped lines currently in view
    pub lines: Vec<String>,
    /// First visible line
    pub scroll_offset: usize,
    /// Largest valid offset
    pub max_offset: usize,
    /// All wrapped lines
    pub total_lines: usize,
    /// Whether the view is pinned to the tail
    pub auto_follow: bool,
    /// Input line
    pub input: String,
    /// Whether the input cursor is drawn this frame
    pub cursor_visible: bool,
    /// Whether a model turn is in flight
    pub generating: bool,
    /// Whether this turn's thinking block has closed
    pub thinking_resolved: bool,
    /// One-line hint for the footer
    pub status: String,
}

impl DialogueSnapshot {
    /// Whether there is text above the view
    #[must_use]
    pub fn can_scroll_up(&self) -> bool {
        self.scroll_offset > 0
    }

    /// Whether there is text below the view
    #[must_use]
    pub fn can_scroll_down(&self) -> bool {
        self.scroll_offset < self.max_offset
    }
}

/// Everything a surface needs to draw one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Current screen
    pub screen: Screen,
    /// Room extent
    pub room: Rect,
    /// Solid furniture
    pub obstacles: Vec<Rect>,
    /// The player
    pub player: PlayerView,
    /// Every NPC
    pub npcs: Vec<NpcView>,
    /// Open dialogue (if any)
    pub dialogue: Option<DialogueSnapshot>,
    /// Model name for the title card
    pub model: String,
    /// Whether the game has been asked to stop
    pub quit_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialogue(offset: usize, max: usize) -> DialogueSnapshot {
        DialogueSnapshot {
            npc_name: "Fox".into(),
            model: "qwen3:8b".into(),
            lines: Vec::new(),
            scroll_offset: offset,
            max_offset: max,
            total_lines: max + 10,
            auto_follow: true,
            input: String::new(),
            cursor_visible: true,
            generating: false,
            thinking_resolved: false,
            status: String::new(),
        }
    }

    #[test]
    fn test_scroll_indicators() {
        let top = dialogue(0, 5);
        assert!(!top.can_scroll_up());
        assert!(top.can_scroll_down());

        let bottom = dialogue(5, 5);
        assert!(bottom.can_scroll_up());
        assert!(!bottom.can_scroll_down());

        let short = dialogue(0, 0);
        assert!(!short.can_scroll_up() && !short.can_scroll_down());
    }
}
