//! Thinking-block stripping
//!
//! Reasoning models wrap their chain of thought in `<think>` ... `</think>`.
//! Pairing is first-open/first-close, never nested.

/// Opening marker
pub const THINK_OPEN: &str = "<think>";

/// Closing marker
pub const THINK_CLOSE: &str = "</think>";

/// Shown in place of an unterminated block (and before any text arrives)
pub const THINKING_PLACEHOLDER: &str = "Thinking...";

/// Remove every thinking block from `text`.
///
/// 1. Excise each first-open to first-following-close block, markers included.
/// 2. Drop any close marker left over (a close with no open before it).
/// 3. Replace a dangling open marker with [`THINKING_PLACEHOLDER`].
/// 4. Trim surrounding whitespace.
///
/// The result never contains either marker, so stripping is idempotent.
#[must_use]
pub fn strip_thinking(text: &str) -> String {
    let mut output = text.to_string();

    while let Some(start) = output.find(THINK_OPEN) {
        let body = start + THINK_OPEN.len();
        let Some(relative_end) = output[body..].find(THINK_CLOSE) else {
            break;
        };
        output.replace_range(start..body + relative_end + THINK_CLOSE.len(), "");
    }

    // Removing one stray close can splice together another, hence the loop
    while let Some(idx) = output.find(THINK_CLOSE) {
        output.replace_range(idx..idx + THINK_CLOSE.len(), "");
    }

    while let Some(idx) = output.find(THINK_OPEN) {
        output.replace_range(idx..idx + THINK_OPEN.len(), THINKING_PLACEHOLDER);
    }

    output.trim().to_string()
}

/// Whether `text` contains an open marker followed later by a close marker
#[must_use]
pub fn has_closed_block(text: &str) -> bool {
    text.find(THINK_OPEN)
        .is_some_and(|start| text[start + THINK_OPEN.len()..].contains(THINK_CLOSE))
}
