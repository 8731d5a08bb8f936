//! Error types for the visualization server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::producers::Algorithm;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving requests.
#[derive(Debug, Error)]
pub enum Error {
    /// No reference producer by that name
    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),

    /// The supplied input does not fit the algorithm
    #[error("{algorithm} expects {expected} input")]
    InputMismatch {
        algorithm: Algorithm,
        expected: &'static str,
    },

    /// The input is larger than the server accepts
    #[error("input of {size} elements exceeds the limit of {max}")]
    InputTooLarge { size: usize, max: usize },

    /// A playback operation arrived before any run was started
    #[error("no active session")]
    NoSession,

    /// Replay engine error
    #[error(transparent)]
    Replay(#[from] stepwise_replay::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownAlgorithm(_) => "unknown_algorithm",
            Error::InputMismatch { .. } => "input_mismatch",
            Error::InputTooLarge { .. } => "input_too_large",
            Error::NoSession => "no_session",
            Error::Replay(err) => err.code(),
            Error::Io(_) => "io",
        }
    }

    fn status(&self) -> StatusCode {
        use stepwise_replay::Error as Replay;
        match self {
            Error::UnknownAlgorithm(_)
            | Error::InputMismatch { .. }
            | Error::InputTooLarge { .. } => StatusCode::BAD_REQUEST,
            Error::NoSession => StatusCode::NOT_FOUND,
            Error::Replay(Replay::TraceUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Replay(Replay::InvalidOperation { .. }) => StatusCode::CONFLICT,
            Error::Replay(Replay::AnimationStepFailed { .. } | Replay::UnknownStepKind { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    retryable: bool,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let retryable = matches!(&self, Error::Replay(err) if err.is_retryable());
        let body = Json(ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            retryable,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            Error::UnknownAlgorithm("bogo".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::NoSession.status(), StatusCode::NOT_FOUND);
        let too_large = Error::InputTooLarge { size: 9000, max: 512 };
        assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);
        assert_eq!(too_large.code(), "input_too_large");

        let unavailable = Error::from(stepwise_replay::Error::TraceUnavailable("timed out".into()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.code(), "trace_unavailable");

        let rejected = Error::from(stepwise_replay::Error::InvalidOperation {
            operation: "seek",
            state: stepwise_replay::PlaybackState::Playing,
        });
        assert_eq!(rejected.status(), StatusCode::CONFLICT);
        assert_eq!(rejected.to_string(), "cannot seek while playing");
    }
}
