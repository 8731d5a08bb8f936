//! Events emitted to renderers.

use std::sync::Arc;

use serde::Serialize;
use stepwise_trace::{Position, TraceId, VisualState};

use crate::controller::PlaybackState;
use crate::error::Error;

/// One materialized position, as handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub trace: TraceId,
    pub position: Position,
    pub state: Arc<VisualState>,
    /// Caption of the step that produced this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A dismissible, user-facing description of a recovered failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Machine-readable failure name, see [`Error::code`]
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl Notice {
    pub fn warning(error: &Error) -> Self {
        Self::from_error(NoticeLevel::Warning, error)
    }

    pub fn error(error: &Error) -> Self {
        Self::from_error(NoticeLevel::Error, error)
    }

    fn from_error(level: NoticeLevel, error: &Error) -> Self {
        Self {
            level,
            code: error.code(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Everything a controller tells its subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A position was materialized
    Frame(Frame),
    /// The controller changed state
    StateChanged { state: PlaybackState },
    /// A failure was recovered
    Notice(Notice),
}

impl PlaybackEvent {
    /// The frame, if this is a frame event.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            PlaybackEvent::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}
