//! Main Application
//!
//! The App struct is a thin surface over [`Game`]:
//! - Event loop (keyboard, resize) via crossterm's async event stream
//! - Key → [`GameAction`] mapping
//! - Per-frame `Game::update` (cursor blink, stream polling)
//! - Rendering of the [`GameSnapshot`]
//!
//! All game and dialogue state lives in the core; the App only keeps what is
//! purely presentational (NPC colours, held movement, backend status line).

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use rand::seq::SliceRandom;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::{Frame, Terminal};
use tokio::sync::oneshot;

use dialogue_core::{Game, GameAction, GameConfig, GameSnapshot, LlmBackend, OllamaBackend, Screen};

use crate::input::{map_key, MovementHold};
use crate::theme::{DIM_GRAY, INTERACT_HINT, NPC_PALETTE};
use crate::widgets::{DialogueBox, RoomView, TitleCard};

/// Quick farewells printed after the terminal is restored
const FAREWELLS: &[&str] = &[
    "See you at the next stand-up!",
    "Don't forget to push your changes.",
    "The coffee machine will miss you.",
    "Bye! Go touch some grass.",
    "Later! Your colleagues will keep chatting.",
];

/// What the startup health check found
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendStatus {
    /// Still waiting for the first answer
    Checking,
    /// Server up and the model is installed
    Ready,
    /// Server up but the model is not installed
    ModelMissing {
        /// Models the server does have
        available: Vec<String>,
    },
    /// Server did not answer
    Unreachable(String),
}

impl BackendStatus {
    /// One line for the title card
    #[must_use]
    pub fn describe(&self, model: &str) -> String {
        match self {
            Self::Checking => "ollama: checking...".to_string(),
            Self::Ready => "ollama: ready".to_string(),
            Self::ModelMissing { available } if available.is_empty() => {
                format!("ollama: no models installed (try `ollama pull {model}`)")
            }
            Self::ModelMissing { available } => format!(
                "ollama: {model} not installed (have: {})",
                available.join(", ")
            ),
            Self::Unreachable(e) => format!("ollama: unreachable ({e})"),
        }
    }
}

/// Ask the server for its model list without blocking the UI
///
/// Advisory only: the game runs either way and a failed turn will show its
/// own error.
fn spawn_health_check<B: LlmBackend + 'static>(
    backend: Arc<B>,
    model: String,
) -> oneshot::Receiver<BackendStatus> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let status = match backend.list_models().await {
            Ok(models) => {
                if models.iter().any(|m| m.name == model) {
                    tracing::info!(model = %model, "Model available");
                    BackendStatus::Ready
                } else {
                    let available: Vec<String> = models.into_iter().map(|m| m.name).collect();
                    tracing::warn!(
                        model = %model,
                        available = ?available,
                        "Configured model not found on server"
                    );
                    BackendStatus::ModelMissing { available }
                }
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "Health check failed");
                BackendStatus::Unreachable(e.to_string())
            }
        };
        let _ = tx.send(status);
    });

    rx
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Farewell to print on exit
    goodbye_message: Option<String>,
    /// The game itself
    game: Game<OllamaBackend>,

    // === Presentation ===
    /// Colour per NPC, by roster index
    npc_colors: Vec<Color>,
    /// Reply text size in cells
    text_size: (u16, u16),
    /// Startup health check result
    backend_status: BackendStatus,
    /// Pending health check
    status_rx: Option<oneshot::Receiver<BackendStatus>>,

    // === Input State ===
    /// Walking direction between key repeats
    hold: MovementHold,

    // === Timing ===
    /// Target time per frame
    frame_duration: Duration,
    /// Last frame time
    last_frame: Instant,
}

impl App {
    /// Create the app and start the backend health check
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &GameConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(OllamaBackend::from_settings(&config.ollama)?);
        tracing::info!(
            url = %backend.base_url(),
            model = %config.ollama.model,
            source = ?config.source(),
            "Starting game"
        );

        let status_rx = spawn_health_check(Arc::clone(&backend), config.ollama.model.clone());
        let game = Game::new(backend, config);

        let mut rng = rand::thread_rng();
        let npc_colors = (0..game.roster().len())
            .map(|_| NPC_PALETTE.choose(&mut rng).copied().unwrap_or(Color::White))
            .collect();

        let text_size = (
            u16::try_from(config.dialogue.wrap_width).unwrap_or(u16::MAX),
            u16::try_from(config.dialogue.visible_lines).unwrap_or(u16::MAX),
        );

        Ok(Self {
            running: true,
            goodbye_message: None,
            game,
            npc_colors,
            text_size,
            backend_status: BackendStatus::Checking,
            status_rx: Some(status_rx),
            hold: MovementHold::new(),
            frame_duration: config.game.frame_duration(),
            last_frame: Instant::now(),
        })
    }

    /// Main event loop
    ///
    /// # Errors
    ///
    /// Fails if drawing to the terminal fails.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so the player sees something
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events first so typing never waits on a frame
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => self.handle_key(key),
                        Some(Ok(Event::Resize(w, h))) => {
                            tracing::debug!(width = w, height = h, "Terminal resized");
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => {
                            tracing::info!("Terminal event stream closed");
                            self.running = false;
                        }
                    }
                }

                () = tokio::time::sleep(self.frame_duration) => {}
            }

            self.update();
            self.render(terminal)?;

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_duration {
                tokio::time::sleep(self.frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            self.hold.release();
            return;
        }

        let in_dialogue = self.game.dialogue().is_active();
        match map_key(key, self.game.screen(), in_dialogue) {
            Some(GameAction::Move { dx, dy }) => self.hold.press(dx, dy, Instant::now()),
            Some(action) => self.game.handle_action(action),
            None => {}
        }

        if self.game.dialogue().is_active() {
            self.hold.release();
        }
        if self.game.quit_requested() {
            self.generate_goodbye();
            self.running = false;
        }
    }

    /// Advance one frame
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        if let Some((dx, dy)) = self.hold.current(now) {
            self.game.handle_action(GameAction::Move { dx, dy });
        }

        self.game.update(delta);

        if let Some(rx) = self.status_rx.as_mut() {
            match rx.try_recv() {
                Ok(status) => {
                    self.backend_status = status;
                    self.status_rx = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => self.status_rx = None,
            }
        }
    }

    /// Render the UI
    fn render(&self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let snapshot = self.game.snapshot();
        terminal.draw(|frame| self.draw(frame, &snapshot))?;
        Ok(())
    }

    fn draw(&self, frame: &mut Frame, snapshot: &GameSnapshot) {
        let area = frame.area();

        if snapshot.screen == Screen::Title {
            let status = self.backend_status.describe(&snapshot.model);
            frame.render_widget(TitleCard::new(&snapshot.model, &status), area);
            return;
        }

        let [room_area, hint_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

        frame.render_widget(RoomView::new(snapshot, &self.npc_colors), room_area);

        let (hint, color) = hint_text(snapshot);
        frame.render_widget(Line::styled(hint, Style::default().fg(color)), hint_area);

        if let Some(dialogue) = &snapshot.dialogue {
            let rect = dialogue_rect(room_area, self.text_size);
            frame.render_widget(DialogueBox::new(dialogue), rect);
        }
    }

    /// Pick a farewell
    fn generate_goodbye(&mut self) {
        let mut rng = rand::thread_rng();
        self.goodbye_message = FAREWELLS.choose(&mut rng).map(ToString::to_string);
    }

    /// Farewell to print after the TUI closes
    #[must_use]
    pub fn goodbye(&self) -> Option<&str> {
        self.goodbye_message.as_deref()
    }
}

/// Footer hint for the playing screen
#[must_use]
pub fn hint_text(snapshot: &GameSnapshot) -> (String, Color) {
    if snapshot.dialogue.is_some() {
        return (" Esc: leave dialogue | Ctrl+C: quit".to_string(), DIM_GRAY);
    }
    match snapshot.npcs.iter().find(|n| n.interactable) {
        Some(npc) => (format!(" z: talk to {}", npc.name), INTERACT_HINT),
        None => (" Arrows: move | z: talk | q: quit".to_string(), DIM_GRAY),
    }
}

/// Where the dialogue box goes: centred at the bottom, shrunk to fit
#[must_use]
pub fn dialogue_rect(area: Rect, text_size: (u16, u16)) -> Rect {
    let (width, height) = DialogueBox::size_for(text_size.0, text_size.1);
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + area.height - height,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dialogue_rect_bottom_centre() {
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(dialogue_rect(area, (78, 10)), Rect::new(19, 25, 82, 15));
    }

    #[test]
    fn test_dialogue_rect_shrinks_to_fit() {
        let area = Rect::new(0, 0, 60, 10);
        assert_eq!(dialogue_rect(area, (78, 10)), Rect::new(0, 0, 60, 10));
    }

    #[test]
    fn test_backend_status_lines() {
        assert_eq!(BackendStatus::Ready.describe("qwen3:8b"), "ollama: ready");
        assert_eq!(
            BackendStatus::ModelMissing {
                available: vec!["llama3".into(), "phi3".into()]
            }
            .describe("qwen3:8b"),
            "ollama: qwen3:8b not installed (have: llama3, phi3)"
        );
        assert!(BackendStatus::ModelMissing { available: vec![] }
            .describe("qwen3:8b")
            .contains("ollama pull qwen3:8b"));
        assert!(BackendStatus::Unreachable("refused".into())
            .describe("m")
            .contains("refused"));
    }
}
