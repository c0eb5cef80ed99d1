//! Game State
//!
//! Ties the room, the NPCs and the dialogue system together behind a single
//! action/update/snapshot interface that a surface drives once per frame.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::LlmBackend;
use crate::config::GameConfig;
use crate::dialogue::{DialoguePhase, DialogueSystem};
use crate::events::GameAction;
use crate::npc::NpcRoster;
use crate::session::ActivePhase;
use crate::snapshot::{GameSnapshot, NpcView, PlayerView, Screen};
use crate::streaming::TurnOutcome;
use crate::world::{Rect, World, ROOM_HEIGHT, ROOM_WIDTH};

/// The whole game
pub struct Game<B: LlmBackend> {
    screen: Screen,
    world: World,
    roster: NpcRoster,
    dialogue: DialogueSystem<B>,
    quit_requested: bool,
}

impl<B: LlmBackend> Game<B> {
    /// Build the room described by `config`
    pub fn new(backend: Arc<B>, config: &GameConfig) -> Self {
        let screen = if config.game.show_title {
            Screen::Title
        } else {
            Screen::Playing
        };
        Self {
            screen,
            world: World::new(config.game.obstacles.clone()),
            roster: NpcRoster::from_configs(&config.npcs),
            dialogue: DialogueSystem::new(backend, &config.ollama, config.dialogue.clone()),
            quit_requested: false,
        }
    }

    /// Replace the room (scripted starts and tests)
    #[must_use]
    pub fn with_world(mut self, world: World) -> Self {
        self.world = world;
        self
    }

    /// Current screen
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The room
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The NPCs
    #[must_use]
    pub fn roster(&self) -> &NpcRoster {
        &self.roster
    }

    /// The dialogue system
    #[must_use]
    pub fn dialogue(&self) -> &DialogueSystem<B> {
        &self.dialogue
    }

    /// Whether `Quit` has been received
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Route one input action
    pub fn handle_action(&mut self, action: GameAction) {
        if action == GameAction::Quit {
            tracing::info!("Quit requested");
            self.dialogue.exit(&mut self.roster);
            self.quit_requested = true;
            return;
        }

        if self.screen == Screen::Title {
            if action == GameAction::TitleStart {
                tracing::info!("Leaving title screen");
                self.screen = Screen::Playing;
            }
            return;
        }

        if self.dialogue.is_active() {
            self.handle_dialogue_action(action);
        } else {
            self.handle_room_action(action);
        }
    }

    fn handle_dialogue_action(&mut self, action: GameAction) {
        match action {
            GameAction::AppendChar(c) => {
                self.dialogue.append_char(c);
            }
            GameAction::Backspace => {
                self.dialogue.backspace();
            }
            GameAction::SubmitMessage => {
                // Rejections are logged by the dialogue system and otherwise ignored
                let _ = self.dialogue.submit();
            }
            GameAction::ScrollUp => {
                self.dialogue.scroll_up();
            }
            GameAction::ScrollDown => {
                self.dialogue.scroll_down();
            }
            GameAction::ExitDialogue => {
                self.dialogue.exit(&mut self.roster);
            }
            GameAction::Move { .. }
            | GameAction::Interact
            | GameAction::TitleStart
            | GameAction::Quit => {}
        }
    }

    fn handle_room_action(&mut self, action: GameAction) {
        match action {
            GameAction::Move { dx, dy } => self.world.move_player(dx, dy),
            GameAction::Interact => match self.world.interactable_npc(&self.roster) {
                Some(npc_id) => {
                    if let Err(e) = self.dialogue.enter(&mut self.roster, npc_id) {
                        tracing::debug!(error = %e, "Could not start dialogue");
                    }
                }
                None => tracing::debug!("No NPC within reach"),
            },
            _ => {}
        }
    }

    /// Advance one frame
    ///
    /// Returns the outcome if a model turn ended this frame.
    pub fn update(&mut self, delta: Duration) -> Option<TurnOutcome> {
        self.dialogue.tick(delta);
        self.dialogue.poll_stream()
    }

    /// Whether the dialogue is mid-turn
    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(
            self.dialogue.phase(),
            DialoguePhase::Active(ActivePhase::Generating)
        )
    }

    /// Render view of the current frame
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let in_dialogue = self.dialogue.is_active();
        let interactable = if in_dialogue {
            None
        } else {
            self.world.interactable_npc(&self.roster)
        };

        let npcs = self
            .roster
            .iter()
            .map(|npc| NpcView {
                id: npc.id,
                name: npc.name.clone(),
                kind: npc.kind.clone(),
                personality: npc.personality,
                position: npc.position,
                label_visible: !in_dialogue && self.world.label_visible(npc.position),
                interactable: interactable == Some(npc.id),
                in_dialogue: npc.in_dialogue(),
            })
            .collect();

        let player = self.world.player();
        GameSnapshot {
            screen: self.screen,
            room: Rect::new(0, 0, ROOM_WIDTH, ROOM_HEIGHT),
            obstacles: self.world.obstacles().to_vec(),
            player: PlayerView {
                rect: player.footprint(),
                facing: player.facing,
            },
            npcs,
            dialogue: self.dialogue.snapshot(),
            model: self.dialogue.model().to_string(),
            quit_requested: self.quit_requested,
        }
    }
}
