//! Error Types
//!
//! Errors produced by the dialogue core. Backend failures never escape as
//! `Err` values to the game loop: the inference client normalises them into a
//! single [`StreamEvent::Failed`](crate::backend::StreamEvent::Failed) carrying
//! the human-readable message produced by the `Display` impls below.

use std::time::Duration;

use thiserror::Error;

use crate::npc::NpcId;

/// Failures talking to the model server
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, broken pipe, ...
    #[error("Network request error: {0}")]
    Transport(String),

    /// The request exceeded the fixed timeout ceiling
    #[error("API request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Non-2xx status or a stream the client could not make sense of
    #[error("API request failed: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Classify a reqwest error into the backend taxonomy
    pub fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if let Some(status) = err.status() {
            Self::Protocol(status.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Reasons a submit was dropped
///
/// These are validation outcomes, not faults: nothing is displayed and no
/// stream event is produced.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SubmitRejection {
    /// No dialogue is active
    #[error("no dialogue is active")]
    NotInDialogue,

    /// A model turn is already in flight
    #[error("a response is still being generated")]
    TurnInFlight,

    /// The trimmed input was empty
    #[error("message is empty")]
    EmptyInput,

    /// Submitted again before the cool-down elapsed
    #[error("submitted again within {}ms", .0.as_millis())]
    CoolingDown(Duration),
}

/// Reasons a dialogue could not be entered
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    /// Already talking to someone
    #[error("already in a dialogue with {0}")]
    AlreadyActive(String),

    /// The NPC is engaged in another dialogue
    #[error("{0} is already in a dialogue")]
    NpcEngaged(String),

    /// No NPC with that id
    #[error("unknown NPC {0:?}")]
    UnknownNpc(NpcId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_messages() {
        let err = BackendError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "API request timed out after 120s");

        let err = BackendError::Protocol("500 Internal Server Error".to_string());
        assert!(err.to_string().starts_with("API request failed"));

        let err = BackendError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_submit_rejection_display() {
        let rejection = SubmitRejection::CoolingDown(Duration::from_millis(500));
        assert_eq!(rejection.to_string(), "submitted again within 500ms");
    }
}
