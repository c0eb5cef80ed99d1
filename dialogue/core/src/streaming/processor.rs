//! Per-turn stream processor
//!
//! Folds a turn's [`StreamEvent`]s into two views of the accumulating text:
//!
//! - the **live view**, shown while the turn is in flight
//! - the **final view**, the cleaned answer once thinking is resolved
//!
//! ```text
//!   Delta("<think>")          live = "<think>"          resolved = false
//!   Delta("pondering")        live = "<think>pondering"  resolved = false
//!   Delta("</think>Hi there") live = final = "Hi there"  resolved = true
//!   Completed(T)              final = strip(T)           turn over
//! ```

use super::thinking::{has_closed_block, strip_thinking, THINKING_PLACEHOLDER};
use crate::backend::StreamEvent;

/// How the current turn ended (if it has)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Still streaming (or nothing submitted yet)
    #[default]
    Pending,
    /// `Completed` was applied
    Completed,
    /// `Failed` was applied
    Failed,
}

impl TurnOutcome {
    /// Whether the turn is over
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Accumulates one turn's events
#[derive(Clone, Debug)]
pub struct StreamProcessor {
    /// Everything received this turn, untouched
    raw: String,
    /// What to show while the turn is in flight
    thinking_view: String,
    /// The cleaned answer
    final_view: String,
    /// One-way within a turn
    thinking_resolved: bool,
    outcome: TurnOutcome,
}

impl Default for StreamProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamProcessor {
    /// Create a processor for a fresh turn
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            thinking_view: THINKING_PLACEHOLDER.to_string(),
            final_view: String::new(),
            thinking_resolved: false,
            outcome: TurnOutcome::Pending,
        }
    }

    /// Forget the previous turn
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Apply one event. Returns `true` if it ended the turn.
    ///
    /// Events arriving after the turn has ended are ignored.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        if self.outcome.is_finished() {
            tracing::debug!("Ignoring stream event after end of turn");
            return false;
        }

        match event {
            StreamEvent::Delta(text) => {
                self.push_delta(&text);
                false
            }
            StreamEvent::Completed(text) => {
                self.final_view = strip_thinking(&text);
                self.thinking_view.clone_from(&self.final_view);
                self.thinking_resolved |= has_closed_block(&text);
                self.raw = text;
                self.outcome = TurnOutcome::Completed;
                true
            }
            StreamEvent::Failed(message) => {
                let shown = format!("Error: {message}");
                self.thinking_view.clone_from(&shown);
                self.final_view = shown;
                self.outcome = TurnOutcome::Failed;
                true
            }
        }
    }

    fn push_delta(&mut self, text: &str) {
        self.raw.push_str(text);

        // Markers may straddle deltas, so always look at the whole buffer
        if !self.thinking_resolved && has_closed_block(&self.raw) {
            self.thinking_resolved = true;
        }

        if self.thinking_resolved {
            self.final_view = strip_thinking(&self.raw);
            self.thinking_view.clone_from(&self.final_view);
        } else {
            self.thinking_view.clone_from(&self.raw);
        }
    }

    /// Text to display right now
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self.outcome {
            TurnOutcome::Pending => &self.thinking_view,
            TurnOutcome::Completed | TurnOutcome::Failed => &self.final_view,
        }
    }

    /// Raw accumulated text
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Live view
    #[must_use]
    pub fn thinking_view(&self) -> &str {
        &self.thinking_view
    }

    /// Final view
    #[must_use]
    pub fn final_view(&self) -> &str {
        &self.final_view
    }

    /// Whether a thinking block has closed this turn
    #[must_use]
    pub fn thinking_resolved(&self) -> bool {
        self.thinking_resolved
    }

    /// How the turn ended
    #[must_use]
    pub fn outcome(&self) -> TurnOutcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta(text.to_string())
    }

    #[test]
    fn test_placeholder_before_first_delta() {
        let processor = StreamProcessor::new();
        assert_eq!(processor.display_text(), "Thinking...");
        assert!(!processor.thinking_resolved());
        assert_eq!(processor.outcome(), TurnOutcome::Pending);
    }

    #[test]
    fn test_thinking_resolves_across_deltas() {
        let mut processor = StreamProcessor::new();

        assert!(!processor.apply(delta("<think>")));
        assert!(!processor.thinking_resolved());
        assert_eq!(processor.thinking_view(), "<think>");

        processor.apply(delta("pondering"));
        assert!(!processor.thinking_resolved());
        assert_eq!(processor.display_text(), "<think>pondering");

        processor.apply(delta("</think>Hi there"));
        assert!(processor.thinking_resolved());
        assert_eq!(processor.thinking_view(), "Hi there");
        assert_eq!(processor.final_view(), "Hi there");
    }

    #[test]
    fn test_close_marker_split_between_deltas() {
        let mut processor = StreamProcessor::new();
        processor.apply(delta("<think>hm</thi"));
        assert!(!processor.thinking_resolved());
        processor.apply(delta("nk>Answer"));
        assert!(processor.thinking_resolved());
        assert_eq!(processor.display_text(), "Answer");
    }

    #[test]
    fn test_resolved_flag_is_one_way() {
        let mut processor = StreamProcessor::new();
        processor.apply(delta("<think>a</think>b"));
        processor.apply(delta(" <think>again"));
        assert!(processor.thinking_resolved());
        assert_eq!(processor.display_text(), "b Thinking...again");
    }

    #[test]
    fn test_no_thinking_shows_raw_until_complete() {
        let mut processor = StreamProcessor::new();
        processor.apply(delta("Hello"));
        processor.apply(delta(" there "));
        assert_eq!(processor.display_text(), "Hello there ");

        assert!(processor.apply(StreamEvent::Completed("Hello there ".to_string())));
        assert_eq!(processor.display_text(), "Hello there");
        assert_eq!(processor.outcome(), TurnOutcome::Completed);
    }

    #[test]
    fn test_completed_matches_concatenated_deltas() {
        let deltas = ["<thi", "nk>plan", "</th", "ink>", "Sure", "</think>!"];
        let full: String = deltas.concat();

        let mut processor = StreamProcessor::new();
        for d in deltas {
            processor.apply(delta(d));
        }
        let streamed = strip_thinking(processor.raw());
        processor.apply(StreamEvent::Completed(full));

        assert_eq!(processor.final_view(), streamed);
        assert_eq!(processor.final_view(), "Sure!");
    }

    #[test]
    fn test_failed_overwrites_both_views() {
        let mut processor = StreamProcessor::new();
        processor.apply(delta("partial"));
        assert!(processor.apply(StreamEvent::Failed("timeout".to_string())));

        assert_eq!(processor.thinking_view(), "Error: timeout");
        assert_eq!(processor.final_view(), "Error: timeout");
        assert_eq!(processor.display_text(), "Error: timeout");
        assert_eq!(processor.outcome(), TurnOutcome::Failed);
    }

    #[test]
    fn test_events_after_end_are_ignored() {
        let mut processor = StreamProcessor::new();
        processor.apply(StreamEvent::Completed("done".to_string()));

        assert!(!processor.apply(delta(" more")));
        assert!(!processor.apply(StreamEvent::Failed("late".to_string())));
        assert_eq!(processor.display_text(), "done");
        assert_eq!(processor.outcome(), TurnOutcome::Completed);
    }

    #[test]
    fn test_reset_starts_fresh_turn() {
        let mut processor = StreamProcessor::new();
        processor.apply(delta("<think>x</think>y"));
        processor.apply(StreamEvent::Completed("<think>x</think>y".to_string()));

        processor.reset();
        assert_eq!(processor.raw(), "");
        assert!(!processor.thinking_resolved());
        assert_eq!(processor.display_text(), "Thinking...");
    }
}
