//! Error types for stepwise-replay.

use thiserror::Error;

use crate::accumulator::FoldError;
use crate::controller::PlaybackState;

/// Result type for stepwise-replay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced at the controller and supervisor boundary.
///
/// None of these is fatal to the process; each is also mirrored to
/// subscribers as a [`Notice`](crate::Notice).
#[derive(Debug, Error)]
pub enum Error {
    /// The producer failed or returned malformed data. No session was started.
    #[error("trace unavailable: {0}")]
    TraceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A step the active transition table cannot interpret. It was skipped.
    #[error("unknown step kind `{kind}` at position {position}")]
    UnknownStepKind { position: usize, kind: &'static str },

    /// Materializing a step failed; playback halted at the last good position.
    #[error("animation step {position} failed: {cause}")]
    AnimationStepFailed {
        position: usize,
        #[source]
        cause: FoldError,
    },

    /// The operation is not allowed in the controller's current state.
    #[error("cannot {operation} while {state}")]
    InvalidOperation {
        operation: &'static str,
        state: PlaybackState,
    },
}

impl Error {
    /// Stable machine-readable name for notices.
    pub fn code(&self) -> &'static str {
        match self {
            Error::TraceUnavailable(_) => "trace_unavailable",
            Error::UnknownStepKind { .. } => "unknown_step_kind",
            Error::AnimationStepFailed { .. } => "animation_step_failed",
            Error::InvalidOperation { .. } => "invalid_operation",
        }
    }

    /// Whether retrying the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TraceUnavailable(_))
    }
}
