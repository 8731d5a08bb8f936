//! Error types for stepwise-trace.

use thiserror::Error;

use crate::structure::Domain;

/// Result type for stepwise-trace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ways a trace can be malformed.
#[derive(Debug, Error)]
pub enum Error {
    /// The serialized trace could not be parsed.
    #[error("malformed trace: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A snapshot describes a different kind of structure than the session.
    #[error("step {index} carries a {found} snapshot in a {expected} trace")]
    DomainMismatch {
        index: usize,
        expected: Domain,
        found: Domain,
    },
}
