//! Domain error types.

use thiserror::Error;

use crate::identity::SessionId;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No live session is registered under the identifier.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The wagon dataset has no passenger for the identity.
    #[error("passenger not found: {0}")]
    PassengerNotFound(String),

    /// The wagon dataset has no wagon with the index.
    #[error("wagon not found: {0}")]
    WagonNotFound(u32),

    /// An NPC identity string could not be parsed.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The identity belongs to a wagon other than the session's current one.
    #[error("identity {identity} does not belong to current wagon {current_wagon}")]
    WrongWagon {
        /// The identity the client referenced.
        identity: String,
        /// The wagon the session is currently in.
        current_wagon: u32,
    },

    /// The session cannot move to another wagon.
    #[error("cannot advance: {0}")]
    CannotAdvance(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A transient failure; the request may be retried as-is.
    #[error("retryable error: {0}")]
    Retryable(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
