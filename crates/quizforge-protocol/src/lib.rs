//! Wire protocol for Quizforge.
//!
//! This crate defines the "language" that clients and the server speak
//! over the line transport:
//!
//! - **Commands** ([`Command`], [`AnswerLetter`]): what a client line
//!   means, decoded exactly once at the connection boundary.
//! - **Server messages** ([`ServerMessage`]): everything the server can
//!   say, encoded to a single line through `Display`.
//! - **Identity types** ([`RoomCode`], [`validate_display_name`]).
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (lines) → Protocol (Command / ServerMessage) → Rooms
//! ```

mod command;
mod error;
mod message;
mod types;

pub use command::{AnswerLetter, Command};
pub use error::ProtocolError;
pub use message::{QuestionPayload, ScoreEntry, ServerMessage};
pub use types::{validate_display_name, RoomCode};
