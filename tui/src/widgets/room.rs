//! Room Widget
//!
//! Draws the room from a [`GameSnapshot`], scaling room units down to
//! terminal cells. The room is 900x600 units; a cell is roughly twice as tall
//! as it is wide, so both axes are scaled independently to fill the area.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Widget};
use unicode_width::UnicodeWidthStr;

use dialogue_core::npc::NPC_SIZE;
use dialogue_core::{Facing, GameSnapshot, NpcView, Rect as RoomRect};

use crate::theme::{FLOOR, FURNITURE, INTERACT_HINT, LABEL, PLAYER, WALL};

/// Maps room units onto a terminal area
#[derive(Clone, Copy, Debug)]
pub struct RoomScale {
    room: RoomRect,
    area: Rect,
}

impl RoomScale {
    /// Scale `room` onto `area`
    #[must_use]
    pub fn new(room: RoomRect, area: Rect) -> Self {
        Self { room, area }
    }

    fn axis(value: i32, room_origin: i32, room_len: i32, cells: u16) -> i64 {
        if room_len <= 0 {
            return 0;
        }
        i64::from(value - room_origin) * i64::from(cells) / i64::from(room_len)
    }

    /// Cells covered by a room rectangle, clipped to the area
    ///
    /// Anything inside the area covers at least one cell.
    #[must_use]
    pub fn rect(&self, r: &RoomRect) -> Rect {
        let x0 = Self::axis(r.x, self.room.x, self.room.width, self.area.width);
        let y0 = Self::axis(r.y, self.room.y, self.room.height, self.area.height);
        let x1 = Self::axis(r.x + r.width, self.room.x, self.room.width, self.area.width);
        let y1 = Self::axis(r.y + r.height, self.room.y, self.room.height, self.area.height);

        let max_x = i64::from(self.area.width);
        let max_y = i64::from(self.area.height);
        let x0 = x0.clamp(0, max_x);
        let y0 = y0.clamp(0, max_y);
        let x1 = x1.clamp(0, max_x).max((x0 + 1).min(max_x));
        let y1 = y1.clamp(0, max_y).max((y0 + 1).min(max_y));

        // Bounded by the area's u16 extent after clamping
        let to_u16 = |v: i64| u16::try_from(v).unwrap_or(u16::MAX);
        Rect::new(
            self.area.x + to_u16(x0),
            self.area.y + to_u16(y0),
            to_u16(x1 - x0),
            to_u16(y1 - y0),
        )
    }
}

/// The room, its furniture, the NPCs and the player
pub struct RoomView<'a> {
    snapshot: &'a GameSnapshot,
    npc_colors: &'a [Color],
}

impl<'a> RoomView<'a> {
    /// Draw `snapshot`, colouring NPC `i` with `npc_colors[i % len]`
    #[must_use]
    pub fn new(snapshot: &'a GameSnapshot, npc_colors: &'a [Color]) -> Self {
        Self {
            snapshot,
            npc_colors,
        }
    }

    fn npc_color(&self, npc: &NpcView) -> Color {
        if self.npc_colors.is_empty() {
            return Color::White;
        }
        self.npc_colors[npc.id.0 % self.npc_colors.len()]
    }
}

impl Widget for RoomView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Office ")
            .border_style(Style::default().fg(WALL));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 4 || inner.height < 4 {
            return;
        }

        buf.set_style(inner, Style::default().bg(FLOOR));
        let scale = RoomScale::new(self.snapshot.room, inner);

        for obstacle in &self.snapshot.obstacles {
            fill(buf, scale.rect(obstacle), "▒", Style::default().fg(FURNITURE).bg(FLOOR));
        }

        for npc in &self.snapshot.npcs {
            let footprint = RoomRect::new(npc.position.x, npc.position.y, NPC_SIZE, NPC_SIZE);
            let cells = scale.rect(&footprint);
            let color = self.npc_color(npc);

            let mut style = Style::default().fg(Color::Black).bg(color);
            if npc.interactable {
                style = style.add_modifier(Modifier::BOLD);
            }
            fill(buf, cells, " ", style);

            let glyph: String = npc
                .kind
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default();
            buf.set_string(cells.x, cells.y, glyph, style);

            if npc.label_visible {
                draw_label(buf, inner, cells, npc);
            }
        }

        let player = &self.snapshot.player;
        let cells = scale.rect(&player.rect);
        let style = Style::default().fg(Color::Black).bg(PLAYER);
        fill(buf, cells, " ", style);
        let arrow = match player.facing {
            Facing::Up => "▲",
            Facing::Down => "▼",
            Facing::Left => "◀",
            Facing::Right => "▶",
        };
        buf.set_string(
            cells.x + cells.width / 2,
            cells.y + cells.height / 2,
            arrow,
            style,
        );
    }
}

/// Fill every cell of `rect` with `symbol`
fn fill(buf: &mut Buffer, rect: Rect, symbol: &str, style: Style) {
    let rect = rect.intersection(buf.area);
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            buf[(x, y)].set_symbol(symbol).set_style(style);
        }
    }
}

/// Name above the NPC, centred and kept inside the room
fn draw_label(buf: &mut Buffer, inner: Rect, cells: Rect, npc: &NpcView) {
    let (text, style) = if npc.interactable {
        (
            format!("{} [z]", npc.name),
            Style::default()
                .fg(INTERACT_HINT)
                .bg(FLOOR)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (npc.name.clone(), Style::default().fg(LABEL).bg(FLOOR))
    };

    let width = u16::try_from(text.width()).unwrap_or(u16::MAX).min(inner.width);
    let center = cells.x + cells.width / 2;
    let x = center
        .saturating_sub(width / 2)
        .clamp(inner.x, inner.right().saturating_sub(width));
    let y = if cells.y > inner.y {
        cells.y - 1
    } else {
        cells.bottom().min(inner.bottom().saturating_sub(1))
    };

    buf.set_stringn(x, y, &text, usize::from(width), style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_core::world::{ROOM_HEIGHT, ROOM_WIDTH};
    use pretty_assertions::assert_eq;

    fn scale() -> RoomScale {
        RoomScale::new(
            RoomRect::new(0, 0, ROOM_WIDTH, ROOM_HEIGHT),
            Rect::new(1, 1, 90, 30),
        )
    }

    #[test]
    fn test_scale_maps_room_onto_area() {
        let s = scale();
        assert_eq!(
            s.rect(&RoomRect::new(0, 0, ROOM_WIDTH, ROOM_HEIGHT)),
            Rect::new(1, 1, 90, 30)
        );
        assert_eq!(s.rect(&RoomRect::new(450, 300, 90, 60)), Rect::new(46, 16, 9, 3));
    }

    #[test]
    fn test_small_things_cover_a_cell() {
        let s = scale();
        let r = s.rect(&RoomRect::new(100, 100, 1, 1));
        assert_eq!((r.width, r.height), (1, 1));
    }

    #[test]
    fn test_scale_clips_to_area() {
        let s = scale();
        let r = s.rect(&RoomRect::new(880, 580, 100, 100));
        assert!(r.right() <= 91);
        assert!(r.bottom() <= 31);
        assert!(r.width >= 1 && r.height >= 1);
    }
}
