//! # Quizforge
//!
//! Real-time multiplayer trivia server.
//!
//! Players connect over TCP and speak a line-delimited text protocol. One
//! player creates a room and shares its four-character code; others join
//! with it. The host starts the game, every participant answers timed
//! multiple-choice questions, and the room broadcasts scores as they change
//! and a final ranking at the end.
//!
//! The layers, bottom-up:
//!
//! - `quizforge-transport`: TCP listener and line-framed connections
//! - `quizforge-protocol`: commands, server messages, room codes
//! - `quizforge-tick`: epoch-tagged question countdowns
//! - `quizforge-room`: room actors, question banks, the room registry
//! - this crate: the accept loop and per-connection sessions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn run() -> Result<(), QuizforgeError> {
//! let server = QuizServer::builder()
//!     .bind("0.0.0.0:50000")
//!     .question_bank(QuestionBank::builtin())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::QuizforgeError;
pub use server::{QuizServer, QuizServerBuilder, DEFAULT_BIND_ADDR};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{QuizServer, QuizServerBuilder, QuizforgeError, ServerConfig};
    pub use quizforge_protocol::{RoomCode, ServerMessage};
    pub use quizforge_room::{
        BotConfig, Question, QuestionBank, RegistryConfig, RoomConfig,
    };
}
