//! Streaming Text Processing
//!
//! Turns the inference client's event stream into display text.
//!
//! # Example
//!
//! ```ignore
//! use dialogue_core::streaming::StreamProcessor;
//!
//! let mut processor = StreamProcessor::new();
//! while let Ok(event) = rx.try_recv() {
//!     if processor.apply(event) {
//!         break;
//!     }
//! }
//! println!("{}", processor.display_text());
//! ```

mod processor;
mod thinking;

pub use processor::{StreamProcessor, TurnOutcome};
pub use thinking::{
    has_closed_block, strip_thinking, THINKING_PLACEHOLDER, THINK_CLOSE, THINK_OPEN,
};
