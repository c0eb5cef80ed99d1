//! Conversation Sessions
//!
//! One [`ConversationSession`] exists per open dialogue. It owns everything
//! transient about the conversation: history, the input line, the in-flight
//! turn and the scroll position. Dropping it is the whole of "exit".
//!
//! The session only refers to its NPC by id and name; the roster keeps
//! ownership of the NPC itself.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::StreamEvent;
use crate::config::DialogueSettings;
use crate::npc::{Npc, NpcId, Personality};
use crate::streaming::{StreamProcessor, TurnOutcome};
use crate::viewport::Viewport;

/// Unique session identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0.simple())
    }
}

/// Who said a history line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// The human at the keyboard
    Player,
    /// The NPC (model output or greeting)
    Npc,
}

/// One line of conversation history; immutable once appended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who said it
    pub speaker: Speaker,
    /// What was said
    pub text: String,
    /// When it was appended (record only)
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// Create an entry stamped now
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    /// How this entry appears in a prompt
    #[must_use]
    pub fn prompt_line(&self) -> String {
        match self.speaker {
            Speaker::Player => format!("Player: {}", self.text),
            Speaker::Npc => self.text.clone(),
        }
    }
}

/// Sub-state of an open dialogue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivePhase {
    /// The player may type
    #[default]
    AwaitingInput,
    /// A model turn is in flight; input is locked
    Generating,
}

/// Blinking text cursor
#[derive(Clone, Debug)]
pub struct CursorBlink {
    interval: Duration,
    elapsed: Duration,
    visible: bool,
}

impl CursorBlink {
    /// Cursor that toggles every `interval`
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            visible: true,
        }
    }

    /// Advance by one frame's worth of time
    pub fn tick(&mut self, delta: Duration) {
        if self.interval.is_zero() {
            return;
        }
        self.elapsed += delta;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.visible = !self.visible;
        }
    }

    /// Whether the cursor is drawn this frame
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }
}

/// An open dialogue with one NPC
#[derive(Debug)]
pub struct ConversationSession {
    id: SessionId,
    npc_id: NpcId,
    npc_name: String,
    personality: Personality,
    history: Vec<HistoryEntry>,
    input: String,
    max_input_chars: usize,
    phase: ActivePhase,
    processor: StreamProcessor,
    /// Whether any turn has started; until then the greeting is shown
    has_turn: bool,
    viewport: Viewport,
    cursor: CursorBlink,
    /// Receiving end of the in-flight turn's events
    turn_rx: Option<mpsc::Receiver<StreamEvent>>,
    turn_count: u32,
}

impl ConversationSession {
    /// Open a session with `npc`, seeded with its greeting
    #[must_use]
    pub fn new(npc: &Npc, settings: &DialogueSettings) -> Self {
        let greeting = npc.greeting();
        let mut viewport = Viewport::new(settings.wrap_width, settings.visible_lines);
        viewport.set_content(&greeting);

        Self {
            id: SessionId::new(),
            npc_id: npc.id,
            npc_name: npc.name.clone(),
            personality: npc.personality,
            history: vec![HistoryEntry::new(Speaker::Npc, greeting)],
            input: String::new(),
            max_input_chars: settings.max_input_chars,
            phase: ActivePhase::AwaitingInput,
            processor: StreamProcessor::new(),
            has_turn: false,
            viewport,
            cursor: CursorBlink::new(settings.cursor_blink),
            turn_rx: None,
            turn_count: 0,
        }
    }

    // ============================================
    // Identity
    // ============================================

    /// Session id
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// NPC this session talks to
    #[must_use]
    pub fn npc_id(&self) -> NpcId {
        self.npc_id
    }

    /// NPC display name
    #[must_use]
    pub fn npc_name(&self) -> &str {
        &self.npc_name
    }

    /// System instruction for every turn
    #[must_use]
    pub fn system_prompt(&self) -> String {
        self.personality.system_prompt(&self.npc_name)
    }

    // ============================================
    // History
    // ============================================

    /// Full history, oldest first
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The most recent `count` entries
    #[must_use]
    pub fn recent_history(&self, count: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    /// Append an entry
    pub fn push_entry(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.history.push(HistoryEntry::new(speaker, text));
    }

    /// Prompt for `message` using the last `window` history entries
    ///
    /// `{history lines}\nPlayer: {message}\n{npc}: `
    #[must_use]
    pub fn build_prompt(&self, message: &str, window: usize) -> String {
        let context: Vec<String> = self
            .recent_history(window)
            .iter()
            .map(HistoryEntry::prompt_line)
            .collect();
        format!(
            "{}\nPlayer: {message}\n{}: ",
            context.join("\n"),
            self.npc_name
        )
    }

    // ============================================
    // Input line
    // ============================================

    /// Current input
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Append a character. Returns whether it was accepted.
    pub fn append_char(&mut self, c: char) -> bool {
        if self.phase != ActivePhase::AwaitingInput || c == '\r' || c.is_control() {
            return false;
        }
        if self.input.chars().count() >= self.max_input_chars {
            return false;
        }
        self.input.push(c);
        true
    }

    /// Delete the last character. Returns whether anything changed.
    pub fn backspace(&mut self) -> bool {
        if self.phase != ActivePhase::AwaitingInput {
            return false;
        }
        self.input.pop().is_some()
    }

    /// Take the input line, leaving it empty
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    // ============================================
    // Turns
    // ============================================

    /// Current sub-state
    #[must_use]
    pub fn phase(&self) -> ActivePhase {
        self.phase
    }

    /// Whether a turn is in flight
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.phase == ActivePhase::Generating
    }

    /// Number of turns started
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Start observing a new turn's events
    pub fn begin_turn(&mut self, rx: mpsc::Receiver<StreamEvent>) {
        self.processor.reset();
        self.has_turn = true;
        self.turn_rx = Some(rx);
        self.phase = ActivePhase::Generating;
        self.turn_count += 1;
        self.viewport.follow();
        self.refresh_viewport();
    }

    /// Non-blocking receive from the in-flight turn
    ///
    /// `None` when nothing is queued or no turn is in flight. A sender that
    /// vanished without a terminal event yields a synthetic `Failed`.
    pub fn try_next_event(&mut self) -> Option<StreamEvent> {
        let rx = self.turn_rx.as_mut()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.turn_rx = None;
                Some(StreamEvent::Failed(
                    "response stream closed unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Apply one event. Returns the outcome if it ended the turn.
    pub fn apply_event(&mut self, event: StreamEvent) -> Option<TurnOutcome> {
        if !self.processor.apply(event) {
            return None;
        }

        self.turn_rx = None;
        self.phase = ActivePhase::AwaitingInput;

        let outcome = self.processor.outcome();
        match outcome {
            TurnOutcome::Completed => {
                let reply = self.processor.final_view().to_string();
                if !reply.is_empty() {
                    self.push_entry(Speaker::Npc, reply);
                }
            }
            TurnOutcome::Failed => self.viewport.unfollow(),
            TurnOutcome::Pending => {}
        }
        Some(outcome)
    }

    /// The turn's processor
    #[must_use]
    pub fn processor(&self) -> &StreamProcessor {
        &self.processor
    }

    /// Text currently displayed
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.has_turn {
            self.processor.display_text()
        } else {
            self.history.first().map_or("", |e| e.text.as_str())
        }
    }

    // ============================================
    // Viewport and cursor
    // ============================================

    /// Re-wrap the displayed text
    pub fn refresh_viewport(&mut self) {
        let text = if self.has_turn {
            self.processor.display_text()
        } else {
            self.history.first().map_or("", |e| e.text.as_str())
        };
        self.viewport.set_content(text);
    }

    /// Scroll state
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Scroll state, mutably
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Advance the cursor blink
    pub fn tick_cursor(&mut self, delta: Duration) {
        self.cursor.tick(delta);
    }

    /// Whether the cursor is drawn
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor.visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Position;
    use pretty_assertions::assert_eq;

    fn fox_session() -> ConversationSession {
        let fox = Npc::new(
            NpcId(0),
            "Fox",
            "fox",
            Personality::Playful,
            Position::new(0, 0),
        );
        ConversationSession::new(&fox, &DialogueSettings::default())
    }

    #[test]
    fn test_session_seeded_with_greeting() {
        let session = fox_session();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].speaker, Speaker::Npc);
        assert_eq!(session.display_text(), "Hello! I'm Fox. How can I help you?");
        assert_eq!(session.viewport().line_count(), 1);
        assert_eq!(session.phase(), ActivePhase::AwaitingInput);
    }

    #[test]
    fn test_build_prompt_from_greeting() {
        let session = fox_session();
        assert_eq!(
            session.build_prompt("Tell me a joke", 10),
            "Hello! I'm Fox. How can I help you?\nPlayer: Tell me a joke\nFox: "
        );
    }

    #[test]
    fn test_build_prompt_uses_window() {
        let mut session = fox_session();
        for i in 1..12 {
            let speaker = if i % 2 == 1 { Speaker::Player } else { Speaker::Npc };
            session.push_entry(speaker, format!("m{i}"));
        }
        assert_eq!(session.history().len(), 12);

        let prompt = session.build_prompt("next", 10);
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "m2");
        assert_eq!(lines[1], "Player: m3");
        assert_eq!(lines[9], "Player: m11");
        assert_eq!(lines[10], "Player: next");
        assert!(!prompt.contains("Hello! I'm Fox"));
        assert!(!prompt.contains("m1\n"));
    }

    #[test]
    fn test_input_limit_and_filtering() {
        let settings = DialogueSettings {
            max_input_chars: 3,
            ..Default::default()
        };
        let fox = Npc::new(NpcId(0), "Fox", "fox", Personality::Wise, Position::new(0, 0));
        let mut session = ConversationSession::new(&fox, &settings);

        assert!(session.append_char('a'));
        assert!(!session.append_char('\r'));
        assert!(!session.append_char('\u{7}'));
        assert!(session.append_char('é'));
        assert!(session.append_char('c'));
        assert!(!session.append_char('d'));
        assert_eq!(session.input(), "aéc");

        assert!(session.backspace());
        assert_eq!(session.input(), "aé");
        assert_eq!(session.take_input(), "aé");
        assert!(!session.backspace());
    }

    #[test]
    fn test_input_locked_while_generating() {
        let mut session = fox_session();
        session.append_char('x');
        let (_tx, rx) = mpsc::channel(4);
        session.begin_turn(rx);

        assert!(!session.append_char('y'));
        assert!(!session.backspace());
        assert_eq!(session.input(), "x");
    }

    #[test]
    fn test_completed_turn_appends_reply() {
        let mut session = fox_session();
        let (_tx, rx) = mpsc::channel(4);
        session.begin_turn(rx);
        assert_eq!(session.display_text(), "Thinking...");

        assert_eq!(session.apply_event(StreamEvent::Delta("Hi".into())), None);
        let outcome = session.apply_event(StreamEvent::Completed("<think>x</think>Hi".into()));

        assert_eq!(outcome, Some(TurnOutcome::Completed));
        assert_eq!(session.phase(), ActivePhase::AwaitingInput);
        assert_eq!(session.history().last().map(|e| e.text.as_str()), Some("Hi"));
    }

    #[test]
    fn test_empty_reply_not_recorded() {
        let mut session = fox_session();
        let (_tx, rx) = mpsc::channel(4);
        session.begin_turn(rx);
        session.apply_event(StreamEvent::Completed("<think>only thoughts</think>".into()));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_disconnect_becomes_failure() {
        let mut session = fox_session();
        let (tx, rx) = mpsc::channel(4);
        session.begin_turn(rx);
        drop(tx);

        let event = session.try_next_event().unwrap();
        assert_eq!(
            event,
            StreamEvent::Failed("response stream closed unexpectedly".into())
        );
        assert!(session.try_next_event().is_none());
    }

    #[test]
    fn test_cursor_blink() {
        let mut cursor = CursorBlink::new(Duration::from_millis(500));
        assert!(cursor.visible());
        cursor.tick(Duration::from_millis(499));
        assert!(cursor.visible());
        cursor.tick(Duration::from_millis(1));
        assert!(!cursor.visible());
        cursor.tick(Duration::from_millis(1000));
        assert!(!cursor.visible());
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert!(SessionId::new().to_string().starts_with("session_"));
    }
}
