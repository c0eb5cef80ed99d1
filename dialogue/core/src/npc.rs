//! Non-Player Characters
//!
//! NPCs stand still in the room and talk through the model. Each one has a
//! [`Personality`] that decides the system instruction sent with every turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::NpcConfig;
use crate::world::Position;

/// Side length of an NPC's square footprint
pub const NPC_SIZE: i32 = 24;

/// Index of an NPC in its roster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpcId(pub usize);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc-{}", self.0)
    }
}

/// Conversational style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Warm and kind
    #[default]
    Friendly,
    /// Reflective and philosophical
    Wise,
    /// Cheerful, jokes around
    Playful,
    /// Cryptic, hints at secrets
    Mysterious,
    /// Logical, talks shop
    Programmer,
}

/// Shared by every personality so replies render cleanly in the dialogue box
const REPLY_RULES: &str = "Write plain sentences with ordinary punctuation. \
     Do not use special symbols or colons, and never start a reply with your own name.";

impl Personality {
    /// Parse a personality name, falling back to [`Personality::Friendly`]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "wise" => Self::Wise,
            "playful" => Self::Playful,
            "mysterious" => Self::Mysterious,
            "programmer" => Self::Programmer,
            "friendly" => Self::Friendly,
            other => {
                tracing::debug!(personality = other, "Unknown personality, using friendly");
                Self::Friendly
            }
        }
    }

    /// Lowercase name as used in config files
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friendly => "friendly",
            Self::Wise => "wise",
            Self::Playful => "playful",
            Self::Mysterious => "mysterious",
            Self::Programmer => "programmer",
        }
    }

    /// System instruction for an NPC called `name`
    #[must_use]
    pub fn system_prompt(self, name: &str) -> String {
        let style = match self {
            Self::Friendly => {
                "Speak warmly and kindly, and keep the conversation natural, the way a good friend would."
            }
            Self::Wise => {
                "Answer thoughtfully with philosophical insight, and offer reflections on life that carry meaning."
            }
            Self::Playful => {
                "Keep a cheerful, humorous tone and feel free to slip in a light joke."
            }
            Self::Mysterious => {
                "Answer in riddles and half-truths, and hint at secrets hidden somewhere in this room."
            }
            Self::Programmer => {
                "Think like a software engineer: be logical, and share insights on code or on life as seen by a developer."
            }
        };
        format!(
            "You are {name}, a {} character in a small office room. {style} {REPLY_RULES}",
            self.as_str()
        )
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A character the player can talk to
#[derive(Clone, Debug)]
pub struct Npc {
    /// Roster index
    pub id: NpcId,
    /// Display name, also the prompt's name cue
    pub name: String,
    /// Free-form kind (e.g. "cat"); cosmetic only
    pub kind: String,
    /// Conversational style
    pub personality: Personality,
    /// Top-left corner in room units
    pub position: Position,
    /// Whether a dialogue with this NPC is open
    in_dialogue: bool,
}

impl Npc {
    /// Create an NPC that is not in a dialogue
    pub fn new(
        id: NpcId,
        name: impl Into<String>,
        kind: impl Into<String>,
        personality: Personality,
        position: Position,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            personality,
            position,
            in_dialogue: false,
        }
    }

    /// Opening line of every conversation
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Hello! I'm {}. How can I help you?", self.name)
    }

    /// System instruction for this NPC
    #[must_use]
    pub fn system_prompt(&self) -> String {
        self.personality.system_prompt(&self.name)
    }

    /// Whether a dialogue with this NPC is open
    #[must_use]
    pub fn in_dialogue(&self) -> bool {
        self.in_dialogue
    }

    /// Mark the dialogue as started
    pub fn start_dialogue(&mut self) {
        self.in_dialogue = true;
        tracing::info!(npc = %self.name, "Dialogue started");
    }

    /// Mark the dialogue as over
    pub fn end_dialogue(&mut self) {
        self.in_dialogue = false;
        tracing::info!(npc = %self.name, "Dialogue ended");
    }
}

/// Everyone in the room
#[derive(Clone, Debug, Default)]
pub struct NpcRoster {
    npcs: Vec<Npc>,
}

impl NpcRoster {
    /// Build a roster from configuration, assigning ids in order
    #[must_use]
    pub fn from_configs(configs: &[NpcConfig]) -> Self {
        let npcs = configs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Npc::new(
                    NpcId(i),
                    c.name.clone(),
                    c.kind.clone(),
                    c.personality,
                    Position::new(c.x, c.y),
                )
            })
            .collect();
        Self { npcs }
    }

    /// Look up by id
    #[must_use]
    pub fn get(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(id.0)
    }

    /// Look up by id, mutably
    pub fn get_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(id.0)
    }

    /// All NPCs
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    /// Number of NPCs
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Whether the room is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}
