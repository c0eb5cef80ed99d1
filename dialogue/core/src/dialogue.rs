//! Dialogue State Machine
//!
//! Owns the lifecycle of conversations with NPCs.
//!
//! ```text
//!            enter                     submit
//!   Idle ─────────────▶ AwaitingInput ─────────▶ Generating
//!    ▲                        ▲                      │
//!    │        exit            │  Completed / Failed  │
//!    └────────────────────────┴──────────────────────┘
//!                 (exit is allowed from either active phase)
//! ```
//!
//! Everything here runs on the game loop. The only concurrent piece is the
//! per-turn channel filled by the backend's task; [`DialogueSystem::poll_stream`]
//! drains it without blocking once per tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{GenerateRequest, LlmBackend, SamplingOptions};
use crate::config::{DialogueSettings, OllamaSettings};
use crate::error::{DialogueError, SubmitRejection};
use crate::npc::{NpcId, NpcRoster};
use crate::session::{ActivePhase, ConversationSession, SessionId, Speaker};
use crate::snapshot::DialogueSnapshot;
use crate::streaming::TurnOutcome;

/// Dialogue lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialoguePhase {
    /// No NPC selected
    Idle,
    /// Talking to an NPC
    Active(ActivePhase),
}

/// Conversation driver
pub struct DialogueSystem<B: LlmBackend> {
    /// Inference client
    backend: Arc<B>,
    /// Dialogue tuning
    settings: DialogueSettings,
    /// Model name sent with every request
    model: String,
    /// Sampling options sent with every request
    sampling: SamplingOptions,
    /// The open conversation, if any
    session: Option<ConversationSession>,
    /// Time of the last accepted submit (survives across sessions)
    last_submit: Option<Instant>,
}

impl<B: LlmBackend> DialogueSystem<B> {
    /// Create an idle dialogue system
    pub fn new(backend: Arc<B>, ollama: &OllamaSettings, settings: DialogueSettings) -> Self {
        Self {
            backend,
            settings,
            model: ollama.model.clone(),
            sampling: ollama.sampling,
            session: None,
            last_submit: None,
        }
    }

    /// Shared handle to the backend
    #[must_use]
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Current state
    #[must_use]
    pub fn phase(&self) -> DialoguePhase {
        self.session
            .as_ref()
            .map_or(DialoguePhase::Idle, |s| DialoguePhase::Active(s.phase()))
    }

    /// Whether a dialogue is open
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The open session
    #[must_use]
    pub fn session(&self) -> Option<&ConversationSession> {
        self.session.as_ref()
    }

    // ============================================
    // Enter / exit
    // ============================================

    /// Open a dialogue with `npc_id`
    ///
    /// # Errors
    ///
    /// Fails if a dialogue is already open, the NPC does not exist, or the NPC
    /// is engaged elsewhere.
    pub fn enter(&mut self, roster: &mut NpcRoster, npc_id: NpcId) -> Result<SessionId, DialogueError> {
        if let Some(ref session) = self.session {
            return Err(DialogueError::AlreadyActive(session.npc_name().to_string()));
        }
        let npc = roster
            .get_mut(npc_id)
            .ok_or(DialogueError::UnknownNpc(npc_id))?;
        if npc.in_dialogue() {
            return Err(DialogueError::NpcEngaged(npc.name.clone()));
        }

        npc.start_dialogue();
        let session = ConversationSession::new(npc, &self.settings);
        let id = session.id();
        tracing::info!(npc = %npc.name, session = %id, "Entered dialogue");
        self.session = Some(session);
        Ok(id)
    }

    /// Close the open dialogue, detaching from any in-flight turn
    ///
    /// Returns `false` if nothing was open.
    pub fn exit(&mut self, roster: &mut NpcRoster) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        if let Some(npc) = roster.get_mut(session.npc_id()) {
            npc.end_dialogue();
        }
        tracing::info!(
            npc = %session.npc_name(),
            session = %session.id(),
            turns = session.turn_count(),
            detached = session.is_generating(),
            "Exited dialogue"
        );
        // Dropping the session drops the turn receiver
        true
    }

    // ============================================
    // Input
    // ============================================

    /// Type a character into the input line
    pub fn append_char(&mut self, c: char) -> bool {
        self.session.as_mut().is_some_and(|s| s.append_char(c))
    }

    /// Delete the last input character
    pub fn backspace(&mut self) -> bool {
        self.session.as_mut().is_some_and(ConversationSession::backspace)
    }

    /// Send the input line as a new turn
    ///
    /// # Errors
    ///
    /// See [`DialogueSystem::submit_at`].
    pub fn submit(&mut self) -> Result<(), SubmitRejection> {
        self.submit_at(Instant::now())
    }

    /// Send the input line as a new turn, as if at time `now`
    ///
    /// # Errors
    ///
    /// Rejected when no dialogue is open, a turn is already in flight, the
    /// trimmed input is empty, or the previous accepted submit was less than
    /// the cool-down ago. Rejections change nothing.
    pub fn submit_at(&mut self, now: Instant) -> Result<(), SubmitRejection> {
        let result = self.try_submit(now);
        if let Err(rejection) = result {
            tracing::debug!(reason = %rejection, "Submit rejected");
        }
        result
    }

    fn try_submit(&mut self, now: Instant) -> Result<(), SubmitRejection> {
        let cooldown = self.settings.submit_cooldown;
        let session = self.session.as_mut().ok_or(SubmitRejection::NotInDialogue)?;

        if session.is_generating() {
            return Err(SubmitRejection::TurnInFlight);
        }
        let message = session.input().trim().to_string();
        if message.is_empty() {
            return Err(SubmitRejection::EmptyInput);
        }
        if let Some(last) = self.last_submit {
            if now.saturating_duration_since(last) < cooldown {
                return Err(SubmitRejection::CoolingDown(cooldown));
            }
        }

        let prompt = session.build_prompt(&message, self.settings.history_window);
        session.take_input();
        session.push_entry(Speaker::Player, message.as_str());

        let request = GenerateRequest::new(self.model.as_str(), prompt, session.system_prompt())
            .with_options(self.sampling);
        let rx = self.backend.generate(request);
        session.begin_turn(rx);
        self.last_submit = Some(now);

        tracing::info!(
            npc = %session.npc_name(),
            turn = session.turn_count(),
            len = message.len(),
            backend = self.backend.name(),
            "Submitted message"
        );
        Ok(())
    }

    // ============================================
    // Per-tick
    // ============================================

    /// Drain queued stream events without blocking
    ///
    /// Returns the outcome if the in-flight turn ended during this call.
    pub fn poll_stream(&mut self) -> Option<TurnOutcome> {
        let session = self.session.as_mut()?;

        let mut received = false;
        let mut ended = None;
        while let Some(event) = session.try_next_event() {
            received = true;
            if let Some(outcome) = session.apply_event(event) {
                ended = Some(outcome);
                break;
            }
        }

        if received {
            session.refresh_viewport();
        }

        match ended {
            Some(TurnOutcome::Completed) => tracing::info!(
                npc = %session.npc_name(),
                turn = session.turn_count(),
                len = session.processor().final_view().len(),
                "Turn complete"
            ),
            Some(TurnOutcome::Failed) => tracing::warn!(
                npc = %session.npc_name(),
                turn = session.turn_count(),
                error = %session.processor().final_view(),
                "Turn failed"
            ),
            Some(TurnOutcome::Pending) | None => {}
        }
        ended
    }

    /// Advance time-based state (cursor blink)
    pub fn tick(&mut self, delta: Duration) {
        if let Some(session) = self.session.as_mut() {
            session.tick_cursor(delta);
        }
    }

    /// Scroll the dialogue text up one line
    pub fn scroll_up(&mut self) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.viewport_mut().scroll_up())
    }

    /// Scroll the dialogue text down one line
    pub fn scroll_down(&mut self) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.viewport_mut().scroll_down())
    }

    // ============================================
    // Rendering
    // ============================================

    /// Render view of the open dialogue
    #[must_use]
    pub fn snapshot(&self) -> Option<DialogueSnapshot> {
        let session = self.session.as_ref()?;
        let viewport = session.viewport();
        let generating = session.is_generating();

        let status = if generating {
            "Generating... | Up/Down: scroll | Esc: leave"
        } else {
            "Enter: send | Up/Down: scroll | Esc: leave"
        };

        Some(DialogueSnapshot {
            npc_name: session.npc_name().to_string(),
            model: self.model.clone(),
            lines: viewport.visible().to_vec(),
            scroll_offset: viewport.offset(),
            max_offset: viewport.max_offset(),
            total_lines: viewport.line_count(),
            auto_follow: viewport.auto_follow(),
            input: session.input().to_string(),
            cursor_visible: session.cursor_visible() && !generating,
            generating,
            thinking_resolved: session.processor().thinking_resolved(),
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ModelInfo, StreamEvent};
    use crate::config::NpcConfig;
    use crate::error::BackendError;
    use crate::npc::Personality;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    /// Hands every turn's sender back to the test
    #[derive(Default)]
    struct ManualBackend {
        requests: Mutex<Vec<GenerateRequest>>,
        senders: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
    }

    #[async_trait]
    impl LlmBackend for ManualBackend {
        fn name(&self) -> &str {
            "Manual"
        }

        fn generate(&self, request: GenerateRequest) -> mpsc::Receiver<StreamEvent> {
            let (tx, rx) = mpsc::channel(16);
            self.requests.lock().push(request);
            self.senders.lock().push(tx);
            rx
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn setup() -> (Arc<ManualBackend>, DialogueSystem<ManualBackend>, NpcRoster) {
        let backend = Arc::new(ManualBackend::default());
        let system = DialogueSystem::new(
            Arc::clone(&backend),
            &OllamaSettings::default(),
            DialogueSettings::default(),
        );
        let roster = NpcRoster::from_configs(&[
            NpcConfig::new("Fox", "fox", Personality::Playful, 0, 0),
            NpcConfig::new("Owl", "owl", Personality::Wise, 50, 0),
        ]);
        (backend, system, roster)
    }

    fn type_text(system: &mut DialogueSystem<ManualBackend>, text: &str) {
        for c in text.chars() {
            system.append_char(c);
        }
    }

    #[test]
    fn test_enter_marks_npc_and_seeds_greeting() {
        let (_, mut system, mut roster) = setup();
        assert_eq!(system.phase(), DialoguePhase::Idle);

        system.enter(&mut roster, NpcId(0)).unwrap();

        assert_eq!(system.phase(), DialoguePhase::Active(ActivePhase::AwaitingInput));
        assert!(roster.get(NpcId(0)).unwrap().in_dialogue());
        let snapshot = system.snapshot().unwrap();
        assert_eq!(snapshot.lines, vec!["Hello! I'm Fox. How can I help you?".to_string()]);
        assert_eq!(snapshot.model, "qwen3:8b");
    }

    #[test]
    fn test_enter_guards() {
        let (_, mut system, mut roster) = setup();
        system.enter(&mut roster, NpcId(0)).unwrap();

        assert_eq!(
            system.enter(&mut roster, NpcId(1)),
            Err(DialogueError::AlreadyActive("Fox".into()))
        );

        system.exit(&mut roster);
        assert_eq!(
            system.enter(&mut roster, NpcId(7)),
            Err(DialogueError::UnknownNpc(NpcId(7)))
        );

        roster.get_mut(NpcId(1)).unwrap().start_dialogue();
        assert_eq!(
            system.enter(&mut roster, NpcId(1)),
            Err(DialogueError::NpcEngaged("Owl".into()))
        );
    }

    #[test]
    fn test_submit_dispatches_prompt() {
        let (backend, mut system, mut roster) = setup();
        system.enter(&mut roster, NpcId(0)).unwrap();
        type_text(&mut system, "  Tell me a joke ");

        system.submit().unwrap();

        let requests = backend.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].prompt,
            "Hello! I'm Fox. How can I help you?\nPlayer: Tell me a joke\nFox: "
        );
        assert_eq!(requests[0].model, "qwen3:8b");
        assert!(requests[0].system.starts_with("You are Fox"));
        drop(requests);

        let session = system.session().unwrap();
        assert_eq!(session.input(), "");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].text, "Tell me a joke");
        assert_eq!(system.phase(), DialoguePhase::Active(ActivePhase::Generating));
    }

    #[test]
    fn test_submit_rejections() {
        let (backend, mut system, mut roster) = setup();
        assert_eq!(system.submit(), Err(SubmitRejection::NotInDialogue));

        system.enter(&mut roster, NpcId(0)).unwrap();
        type_text(&mut system, "   ");
        assert_eq!(system.submit(), Err(SubmitRejection::EmptyInput));
        assert_eq!(system.session().unwrap().history().len(), 1);

        type_text(&mut system, "hi");
        system.submit().unwrap();
        type_text(&mut system, "again");
        assert_eq!(system.submit(), Err(SubmitRejection::TurnInFlight));
        assert_eq!(backend.requests.lock().len(), 1);
    }

    #[test]
    fn test_cooldown_between_submits() {
        let (backend, mut system, mut roster) = setup();
        system.enter(&mut roster, NpcId(0)).unwrap();
        let start = Instant::now();

        type_text(&mut system, "one");
        system.submit_at(start).unwrap();
        let tx = backend.senders.lock()[0].clone();
        tx.try_send(StreamEvent::Completed("ok".into())).unwrap();
        system.poll_stream();

        type_text(&mut system, "two");
        assert_eq!(
            system.submit_at(start + Duration::from_millis(300)),
            Err(SubmitRejection::CoolingDown(Duration::from_millis(500)))
        );
        assert_eq!(system.session().unwrap().input(), "two");

        system.submit_at(start + Duration::from_millis(500)).unwrap();
        assert_eq!(backend.requests.lock().len(), 2);
    }

    #[test]
    fn test_exit_mid_turn_detaches() {
        let (backend, mut system, mut roster) = setup();
        system.enter(&mut roster, NpcId(0)).unwrap();
        type_text(&mut system, "hello");
        system.submit().unwrap();

        assert!(system.exit(&mut roster));
        assert_eq!(system.phase(), DialoguePhase::Idle);
        assert!(!roster.get(NpcId(0)).unwrap().in_dialogue());

        let tx = backend.senders.lock()[0].clone();
        assert!(tx.is_closed());
        assert!(tx.try_send(StreamEvent::Delta("late".into())).is_err());
        assert_eq!(system.poll_stream(), None);
        assert!(!system.exit(&mut roster));
    }

    #[test]
    fn test_poll_without_events_is_noop() {
        let (_, mut system, mut roster) = setup();
        assert_eq!(system.poll_stream(), None);
        system.enter(&mut roster, NpcId(0)).unwrap();
        assert_eq!(system.poll_stream(), None);
    }

    #[test]
    fn test_cursor_hidden_while_generating() {
        let (_, mut system, mut roster) = setup();
        system.enter(&mut roster, NpcId(0)).unwrap();
        assert!(system.snapshot().unwrap().cursor_visible);

        type_text(&mut system, "x");
        system.submit().unwrap();
        let snapshot = system.snapshot().unwrap();
        assert!(snapshot.generating);
        assert!(!snapshot.cursor_visible);
        assert_eq!(snapshot.lines, vec!["Thinking...".to_string()]);
    }
}
