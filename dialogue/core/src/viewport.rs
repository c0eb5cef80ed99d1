//! Scroll Viewport
//!
//! Fixed-width wrapping and a scroll offset over text that is still growing.
//! The offset is pinned to the tail while auto-follow is on; a manual scroll
//! that actually moves the offset turns auto-follow off until the next
//! [`Viewport::follow`].

/// Default characters per wrapped line
pub const DEFAULT_WRAP_WIDTH: usize = 78;

/// Default number of lines shown at once
pub const DEFAULT_VISIBLE_LINES: usize = 10;

/// Wrap `text` into lines of at most `width` characters.
///
/// Newlines are hard breaks; every other line is sliced every `width`
/// characters regardless of word boundaries. A zero width is treated as one.
#[must_use]
pub fn wrap_fixed(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let width = width.max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let chars: Vec<char> = paragraph.trim_end_matches('\r').chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
    }
    lines
}

/// Scroll state for the dialogue text
#[derive(Clone, Debug)]
pub struct Viewport {
    width: usize,
    visible_lines: usize,
    offset: usize,
    auto_follow: bool,
    lines: Vec<String>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_WRAP_WIDTH, DEFAULT_VISIBLE_LINES)
    }
}

impl Viewport {
    /// Create an empty viewport following the tail
    #[must_use]
    pub fn new(width: usize, visible_lines: usize) -> Self {
        Self {
            width: width.max(1),
            visible_lines: visible_lines.max(1),
            offset: 0,
            auto_follow: true,
            lines: Vec::new(),
        }
    }

    /// Replace the displayed text
    pub fn set_content(&mut self, text: &str) {
        self.lines = wrap_fixed(text, self.width);
        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Move up one line. Returns whether the offset changed.
    pub fn scroll_up(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset -= 1;
        self.auto_follow = false;
        true
    }

    /// Move down one line. Returns whether the offset changed.
    pub fn scroll_down(&mut self) -> bool {
        if self.offset >= self.max_offset() {
            return false;
        }
        self.offset += 1;
        self.auto_follow = false;
        true
    }

    /// Re-enable auto-follow and jump to the tail
    pub fn follow(&mut self) {
        self.auto_follow = true;
        self.offset = self.max_offset();
    }

    /// Turn auto-follow off without moving
    pub fn unfollow(&mut self) {
        self.auto_follow = false;
    }

    /// Largest valid offset
    #[must_use]
    pub fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_lines)
    }

    /// Lines currently in view
    #[must_use]
    pub fn visible(&self) -> &[String] {
        let end = (self.offset + self.visible_lines).min(self.lines.len());
        &self.lines[self.offset..end]
    }

    /// All wrapped lines
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of wrapped lines
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Current scroll offset
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the view is pinned to the tail
    #[must_use]
    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    /// Lines shown at once
    #[must_use]
    pub fn visible_lines(&self) -> usize {
        self.visible_lines
    }

    /// Characters per line
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}
