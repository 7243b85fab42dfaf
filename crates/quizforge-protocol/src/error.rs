//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means "this line does not mean anything in our
//! vocabulary". It is never fatal to a connection: the session handler
//! answers with help text or a rejection and keeps reading.

/// Errors that can occur while decoding client input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not a known command.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// The line is not a well-formed room code.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// The display name is empty or contains a wire delimiter.
    #[error("invalid display name: {0}")]
    InvalidName(String),

    /// The value is not a valid answer letter.
    #[error("invalid answer letter: {0:?}")]
    InvalidAnswer(String),
}
