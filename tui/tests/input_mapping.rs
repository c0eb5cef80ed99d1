//! Key mapping tests
//!
//! Checks that the same key means the right thing on each screen and inside
//! or outside a dialogue, and that mapped actions drive a real `Game`.

use std::sync::Arc;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use dialogue_core::{
    BackendError, Game, GameAction, GameConfig, GenerateRequest, LlmBackend, ModelInfo, NpcConfig,
    Personality, Screen, StreamEvent,
};
use llm_rpg_tui::app::hint_text;
use llm_rpg_tui::input::map_key;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn playing(code: KeyCode) -> Option<GameAction> {
    map_key(key(code), Screen::Playing, false)
}

fn talking(code: KeyCode) -> Option<GameAction> {
    map_key(key(code), Screen::Playing, true)
}

/// Never answers; these tests only care about routing
struct SilentBackend;

#[async_trait]
impl LlmBackend for SilentBackend {
    fn name(&self) -> &str {
        "Silent"
    }

    fn generate(&self, _request: GenerateRequest) -> mpsc::Receiver<StreamEvent> {
        let (_tx, rx) = mpsc::channel(1);
        rx
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        Ok(Vec::new())
    }
}

fn game_next_to_fox() -> Game<SilentBackend> {
    let mut config = GameConfig::default();
    config.npcs = vec![NpcConfig::new("Fox", "fox", Personality::Playful, 470, 300)];
    config.game.obstacles.clear();
    Game::new(Arc::new(SilentBackend), &config)
}

/// Feed keys through the mapper into the game, like the app does
fn press(game: &mut Game<SilentBackend>, code: KeyCode) {
    let in_dialogue = game.dialogue().is_active();
    if let Some(action) = map_key(key(code), game.screen(), in_dialogue) {
        game.handle_action(action);
    }
}

// =============================================================================
// Room Keys
// =============================================================================

#[test]
fn test_arrows_move_in_room() {
    assert_eq!(playing(KeyCode::Up), Some(GameAction::Move { dx: 0, dy: -1 }));
    assert_eq!(playing(KeyCode::Down), Some(GameAction::Move { dx: 0, dy: 1 }));
    assert_eq!(playing(KeyCode::Left), Some(GameAction::Move { dx: -1, dy: 0 }));
    assert_eq!(playing(KeyCode::Right), Some(GameAction::Move { dx: 1, dy: 0 }));
}

#[test]
fn test_room_letters() {
    assert_eq!(playing(KeyCode::Char('z')), Some(GameAction::Interact));
    assert_eq!(playing(KeyCode::Char('q')), Some(GameAction::Quit));
    assert_eq!(playing(KeyCode::Esc), Some(GameAction::Quit));
    assert_eq!(playing(KeyCode::Char('x')), None);
    assert_eq!(playing(KeyCode::Enter), None);
}

// =============================================================================
// Dialogue Keys
// =============================================================================

#[test]
fn test_arrows_scroll_in_dialogue() {
    assert_eq!(talking(KeyCode::Up), Some(GameAction::ScrollUp));
    assert_eq!(talking(KeyCode::Down), Some(GameAction::ScrollDown));
    assert_eq!(talking(KeyCode::Left), None);
}

#[test]
fn test_letters_type_in_dialogue() {
    assert_eq!(talking(KeyCode::Char('z')), Some(GameAction::AppendChar('z')));
    assert_eq!(talking(KeyCode::Char('q')), Some(GameAction::AppendChar('q')));
    assert_eq!(talking(KeyCode::Char(' ')), Some(GameAction::AppendChar(' ')));
    assert_eq!(talking(KeyCode::Enter), Some(GameAction::SubmitMessage));
    assert_eq!(talking(KeyCode::Backspace), Some(GameAction::Backspace));
    assert_eq!(talking(KeyCode::Esc), Some(GameAction::ExitDialogue));
}

#[test]
fn test_modified_letters_not_typed() {
    let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
    assert_eq!(map_key(alt_x, Screen::Playing, true), None);

    let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
    assert_eq!(
        map_key(shifted, Screen::Playing, true),
        Some(GameAction::AppendChar('A'))
    );
}

// =============================================================================
// Through the Game
// =============================================================================

#[test]
fn test_keys_drive_a_conversation() {
    let mut game = game_next_to_fox();

    press(&mut game, KeyCode::Char('z'));
    assert!(!game.dialogue().is_active(), "title screen ignores z");

    press(&mut game, KeyCode::Char(' '));
    assert_eq!(game.screen(), Screen::Playing);
    let (hint, _) = hint_text(&game.snapshot());
    assert!(hint.contains("talk to Fox"));

    press(&mut game, KeyCode::Char('z'));
    assert!(game.dialogue().is_active());

    for c in "zq hi".chars() {
        press(&mut game, KeyCode::Char(c));
    }
    press(&mut game, KeyCode::Backspace);
    assert_eq!(game.dialogue().session().unwrap().input(), "zq h");

    press(&mut game, KeyCode::Enter);
    assert!(game.is_generating());

    press(&mut game, KeyCode::Esc);
    assert!(!game.dialogue().is_active());
    assert!(!game.quit_requested());

    press(&mut game, KeyCode::Char('q'));
    assert!(game.quit_requested());
}
