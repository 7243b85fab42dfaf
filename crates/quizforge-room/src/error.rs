//! Error types for the room layer.

use std::path::PathBuf;

use quizforge_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Someone in the room already uses this display name.
    #[error("name {name} already taken in room {code}")]
    NameTaken { name: String, code: RoomCode },

    /// The requester is not the room's host.
    #[error("{0} is not the host")]
    NotHost(String),

    /// No question is currently open for answers.
    #[error("no question is active")]
    NotActive,

    /// The room is in a state that doesn't allow this operation,
    /// e.g. starting a game that has already started.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The named participant is not in this room.
    #[error("{0} is not in the room")]
    NotInRoom(String),

    /// The room's command channel is closed (the actor has stopped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

/// Errors that can occur while loading a question bank.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    /// The question file could not be read.
    #[error("failed to read questions from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The question data is not valid JSON of the expected shape.
    #[error("malformed question data: {0}")]
    Parse(#[from] serde_json::Error),

    /// The data parsed but contained no questions.
    #[error("question bank is empty")]
    Empty,
}
