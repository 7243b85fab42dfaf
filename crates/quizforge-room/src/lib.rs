//! Rooms for Quizforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, scores, question cursor and countdown. Nothing outside the
//! actor touches that state; sessions talk to it through a [`RoomHandle`].
//!
//! # Key types
//!
//! - [`RoomRegistry`]: allocates room codes, creates and evicts rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`MessageSink`]: where a room delivers messages for one participant
//! - [`QuestionBank`] / [`QuestionCursor`]: shared questions, per-room position
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`] / [`BotConfig`] / [`RegistryConfig`]: settings

mod config;
mod error;
mod question;
mod registry;
mod room;
mod sink;

pub use config::{BotConfig, RegistryConfig, RoomConfig, RoomState};
pub use error::{QuestionError, RoomError};
pub use question::{Question, QuestionBank, QuestionCursor};
pub use registry::RoomRegistry;
pub use room::{RoomHandle, RoomInfo};
pub use sink::{MessageSink, PlayerSender, SinkClosed};
