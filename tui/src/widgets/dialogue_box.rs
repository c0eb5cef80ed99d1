//! Dialogue Box Widget
//!
//! Bordered panel showing the NPC's reply (already wrapped and scrolled by
//! the core), the player's input line and a one-line status hint.
//!
//! ```text
//! ┌ GTP ──────────────────────────── qwen3:8b ┐
//! │ Ha! Why did the fox cross the road?      ▲│
//! │ ...                                      ▼│
//! │───────────────────────────────────────────│
//! │ > tell me another_                        │
//! │ Enter: send | Up/Down: scroll | Esc: leave│
//! └───────────────────────────────────────────┘
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Widget};
use unicode_width::UnicodeWidthChar;

use dialogue_core::DialogueSnapshot;

use crate::theme::{
    DIALOGUE_BORDER, DIM_GRAY, ERROR_RED, NPC_TEXT, SCROLL_INDICATOR, THINKING_TEXT, USER_GREEN,
};

/// Rows around the text: two borders, separator, input, status
const CHROME_ROWS: u16 = 5;

/// Columns around the text: two borders, scroll indicator column, padding
const CHROME_COLS: u16 = 4;

/// Prefix for the input line
const INPUT_PROMPT: &str = "> ";

/// The open dialogue
pub struct DialogueBox<'a> {
    dialogue: &'a DialogueSnapshot,
}

impl<'a> DialogueBox<'a> {
    /// Draw `dialogue`
    #[must_use]
    pub fn new(dialogue: &'a DialogueSnapshot) -> Self {
        Self { dialogue }
    }

    /// Outer size needed for `text_cols` x `text_rows` of reply text
    #[must_use]
    pub fn size_for(text_cols: u16, text_rows: u16) -> (u16, u16) {
        (
            text_cols.saturating_add(CHROME_COLS),
            text_rows.saturating_add(CHROME_ROWS),
        )
    }

    fn text_style(&self) -> Style {
        let d = self.dialogue;
        if d.generating && !d.thinking_resolved {
            Style::default()
                .fg(THINKING_TEXT)
                .add_modifier(Modifier::ITALIC)
        } else if !d.generating && d.lines.first().is_some_and(|l| l.starts_with("Error: ")) {
            Style::default().fg(ERROR_RED)
        } else {
            Style::default().fg(NPC_TEXT)
        }
    }
}

impl Widget for DialogueBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let d = self.dialogue;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(Line::from(format!(" {} ", d.npc_name)))
            .title(Line::from(format!(" {} ", d.model)).alignment(Alignment::Right))
            .border_style(Style::default().fg(DIALOGUE_BORDER));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 6 || inner.height < 4 {
            return;
        }

        let [text_area, separator, input_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        // Reply text, leaving the last column for scroll arrows
        let text_width = usize::from(text_area.width.saturating_sub(2));
        let style = self.text_style();
        for (row, line) in d.lines.iter().take(usize::from(text_area.height)).enumerate() {
            let y = text_area.y + u16::try_from(row).unwrap_or(u16::MAX);
            buf.set_stringn(text_area.x + 1, y, line, text_width, style);
        }

        let arrow_x = text_area.right().saturating_sub(1);
        let arrow_style = Style::default().fg(SCROLL_INDICATOR);
        if d.can_scroll_up() {
            buf.set_string(arrow_x, text_area.y, "▲", arrow_style);
        }
        if d.can_scroll_down() {
            buf.set_string(arrow_x, text_area.bottom().saturating_sub(1), "▼", arrow_style);
        }

        buf.set_string(
            separator.x,
            separator.y,
            "─".repeat(usize::from(separator.width)),
            Style::default().fg(DIALOGUE_BORDER),
        );

        let cursor = if d.cursor_visible { "_" } else { " " };
        let room = usize::from(input_area.width.saturating_sub(1))
            .saturating_sub(INPUT_PROMPT.len() + 1);
        let input_line = format!("{INPUT_PROMPT}{}{cursor}", tail_fit(&d.input, room));
        let input_style = if d.generating {
            Style::default().fg(DIM_GRAY)
        } else {
            Style::default().fg(USER_GREEN)
        };
        buf.set_stringn(
            input_area.x + 1,
            input_area.y,
            input_line,
            usize::from(input_area.width.saturating_sub(1)),
            input_style,
        );

        buf.set_stringn(
            status_area.x + 1,
            status_area.y,
            &d.status,
            usize::from(status_area.width.saturating_sub(1)),
            Style::default().fg(DIM_GRAY),
        );
    }
}

/// Longest suffix of `text` that fits in `width` columns
///
/// Keeps the end of a long input visible as the player types.
#[must_use]
pub fn tail_fit(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &text[start..]
}
