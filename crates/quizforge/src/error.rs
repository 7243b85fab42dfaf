//! Unified error type for the Quizforge server.

use quizforge_protocol::ProtocolError;
use quizforge_room::{QuestionError, RoomError};
use quizforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (unknown command, bad code or name).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, not host, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The question bank could not be loaded.
    #[error(transparent)]
    Questions(#[from] QuestionError),

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
