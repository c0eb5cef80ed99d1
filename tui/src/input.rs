//! Key Mapping
//!
//! Turns crossterm key events into [`GameAction`]s. The same key can mean
//! different things depending on the screen and whether a dialogue is open
//! (`z` interacts in the room but is just a letter in the input line).
//!
//! Terminals report key presses, not held keys, so walking is smoothed by
//! [`MovementHold`]: a press keeps the player moving for a short window that
//! the terminal's key repeat keeps extending.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use dialogue_core::{GameAction, Screen};

/// How long a single arrow press keeps the player walking
pub const HOLD_WINDOW: Duration = Duration::from_millis(150);

/// Map one key press to a game action
///
/// Returns `None` for keys that mean nothing in the current context.
#[must_use]
pub fn map_key(key: KeyEvent, screen: Screen, in_dialogue: bool) -> Option<GameAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(GameAction::Quit);
    }

    match screen {
        Screen::Title => map_title_key(key),
        Screen::Playing if in_dialogue => map_dialogue_key(key),
        Screen::Playing => map_room_key(key),
    }
}

fn map_title_key(key: KeyEvent) -> Option<GameAction> {
    match key.code {
        KeyCode::Char(' ') => Some(GameAction::TitleStart),
        KeyCode::Esc | KeyCode::Char('q') => Some(GameAction::Quit),
        _ => None,
    }
}

fn map_room_key(key: KeyEvent) -> Option<GameAction> {
    let action = match key.code {
        KeyCode::Up => GameAction::Move { dx: 0, dy: -1 },
        KeyCode::Down => GameAction::Move { dx: 0, dy: 1 },
        KeyCode::Left => GameAction::Move { dx: -1, dy: 0 },
        KeyCode::Right => GameAction::Move { dx: 1, dy: 0 },
        KeyCode::Char('z' | 'Z') => GameAction::Interact,
        KeyCode::Esc | KeyCode::Char('q') => GameAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn map_dialogue_key(key: KeyEvent) -> Option<GameAction> {
    let action = match key.code {
        KeyCode::Up => GameAction::ScrollUp,
        KeyCode::Down => GameAction::ScrollDown,
        KeyCode::Enter => GameAction::SubmitMessage,
        KeyCode::Backspace => GameAction::Backspace,
        KeyCode::Esc => GameAction::ExitDialogue,
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            GameAction::AppendChar(c)
        }
        _ => return None,
    };
    Some(action)
}

/// Walking direction kept alive between key repeats
#[derive(Debug, Default)]
pub struct MovementHold {
    direction: Option<(i32, i32)>,
    until: Option<Instant>,
}

impl MovementHold {
    /// Create an idle hold
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or extend) walking in a direction
    pub fn press(&mut self, dx: i32, dy: i32, now: Instant) {
        self.direction = Some((dx, dy));
        self.until = Some(now + HOLD_WINDOW);
    }

    /// Stop walking immediately
    pub fn release(&mut self) {
        self.direction = None;
        self.until = None;
    }

    /// Direction to walk this frame, if any
    pub fn current(&mut self, now: Instant) -> Option<(i32, i32)> {
        match self.until {
            Some(until) if now < until => self.direction,
            Some(_) => {
                self.release();
                None
            }
            None => None,
        }
    }
}
