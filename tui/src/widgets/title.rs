//! Title Card Widget

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::theme::{DIM_GRAY, TITLE_ACCENT, WALL};

/// Start screen with the model name and backend status
pub struct TitleCard<'a> {
    model: &'a str,
    backend_status: &'a str,
}

impl<'a> TitleCard<'a> {
    /// Title card for `model`, with a one-line backend status
    #[must_use]
    pub fn new(model: &'a str, backend_status: &'a str) -> Self {
        Self {
            model,
            backend_status,
        }
    }
}

impl Widget for TitleCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().border_style(Style::default().fg(WALL));
        let inner = block.inner(area);
        block.render(area, buf);

        let dim = Style::default().fg(DIM_GRAY);
        let lines = vec![
            Line::from(Span::styled(
                "LLM  RPG",
                Style::default()
                    .fg(TITLE_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Walk around the office and talk to your colleagues."),
            Line::from(""),
            Line::from(Span::styled(format!("model: {}", self.model), dim)),
            Line::from(Span::styled(self.backend_status.to_string(), dim)),
            Line::from(""),
            Line::from("Arrows: move   z: talk   Esc: leave dialogue   q: quit"),
            Line::from(""),
            Line::from(Span::styled(
                "Press SPACE to start",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];

        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let top = inner.y + inner.height.saturating_sub(height) / 2;
        let body = Rect::new(inner.x, top, inner.width, inner.height.min(height));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }
}
