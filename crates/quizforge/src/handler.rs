//! Per-connection handler: name prompt, command loop and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Prompt for a display name until a valid one arrives, then greet
//!   2. Loop: decode each line into a [`Command`] and act on it
//!   3. On EOF or read error: leave the room, close the connection
//!
//! Everything the client sees goes through one outbound channel drained by
//! a writer task. The session's direct replies and the room's broadcasts
//! share that channel, so they reach the socket in the order they were
//! produced.

use std::sync::Arc;

use quizforge_protocol::{
    AnswerLetter, Command, RoomCode, ServerMessage, validate_display_name,
};
use quizforge_room::{PlayerSender, RoomError, RoomHandle, RoomState};
use quizforge_transport::{Connection, LineConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::QuizforgeError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: LineConnection,
    state: Arc<ServerState>,
) -> Result<(), QuizforgeError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), rx));

    let result = match read_name(&conn, &tx).await {
        Ok(Some(name)) => {
            info!(%conn_id, %name, "player connected");
            let mut session = Session {
                name,
                room: None,
                awaiting_code: false,
                out: tx,
            };
            session.reply(ServerMessage::info(format!(
                "Hello {}! Type 'create' to make a game or 'join' to join one.",
                session.name
            )));
            let result = session.serve(&conn, &state).await;
            session.leave_room().await;
            info!(%conn_id, name = %session.name, "player disconnected");
            result
        }
        Ok(None) => {
            debug!(%conn_id, "connection closed before a name was given");
            Ok(())
        }
        Err(e) => Err(e),
    };

    // The peer is gone, so anything still queued has nowhere to go.
    writer.abort();
    if let Err(e) = conn.close().await {
        debug!(%conn_id, error = %e, "close failed");
    }
    result
}

/// Drains the outbound channel onto the connection.
async fn write_loop(conn: Arc<LineConnection>, mut rx: mpsc::UnboundedReceiver<ServerMessage>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = conn.send_line(&msg.to_string()).await {
            debug!(conn_id = %conn.id(), error = %e, "write failed, stopping writer");
            break;
        }
    }
}

/// Queues a message on a client's outbound channel. A closed channel means
/// the writer has stopped; the read side will notice the disconnect shortly.
fn queue(out: &PlayerSender, msg: ServerMessage) {
    if out.send(msg).is_err() {
        debug!("outbound channel closed");
    }
}

/// Prompts until the client sends a valid display name.
///
/// Returns `None` if the connection closes first.
async fn read_name(
    conn: &LineConnection,
    out: &PlayerSender,
) -> Result<Option<String>, QuizforgeError> {
    loop {
        queue(out, ServerMessage::info("Enter your name:"));
        let Some(line) = conn.recv_line().await? else {
            return Ok(None);
        };
        match validate_display_name(&line) {
            Ok(name) => return Ok(Some(name)),
            Err(e) => {
                debug!(conn_id = %conn.id(), error = %e, "rejected display name");
                queue(out, ServerMessage::Error(e.to_string()));
            }
        }
    }
}

/// State of one named player's session.
struct Session {
    name: String,
    /// The room this player is in. One room per connection.
    room: Option<RoomHandle>,
    /// Set after `join`: the next line is a room code.
    awaiting_code: bool,
    out: PlayerSender,
}

impl Session {
    /// Reads and handles lines until the client disconnects.
    async fn serve(&mut self, conn: &LineConnection, state: &ServerState) -> Result<(), QuizforgeError> {
        while let Some(line) = conn.recv_line().await? {
            if self.awaiting_code {
                self.awaiting_code = false;
                self.join(state, &line).await;
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Create) => self.create(state).await,
                Ok(Command::Join) => self.prompt_code().await,
                Ok(Command::Start) => self.start().await,
                Ok(Command::Next) => self.next().await,
                Ok(Command::Answer(letter)) => self.answer(letter).await,
                Err(e) => {
                    debug!(name = %self.name, error = %e, "unrecognized input");
                    self.help().await;
                }
            }
        }
        Ok(())
    }

    fn reply(&self, msg: ServerMessage) {
        queue(&self.out, msg);
    }

    fn info(&self, text: &str) {
        self.reply(ServerMessage::info(text));
    }

    fn error(&self, text: &str) {
        self.reply(ServerMessage::Error(text.to_string()));
    }

    // -----------------------------------------------------------------------
    // Room membership
    // -----------------------------------------------------------------------

    /// Whether this player is in a game that has not finished yet. A room
    /// that has ended or stopped is left and forgotten.
    async fn in_unfinished_game(&mut self) -> bool {
        let Some(room) = &self.room else {
            return false;
        };
        match room.info().await {
            Ok(info) if info.state != RoomState::Ended => true,
            Ok(_) => {
                self.leave_room().await;
                false
            }
            Err(e) => {
                debug!(name = %self.name, room = %room.code(), error = %e, "dropping stopped room");
                self.room = None;
                false
            }
        }
    }

    async fn create(&mut self, state: &ServerState) {
        if self.in_unfinished_game().await {
            self.error("You are already in a game.");
            return;
        }

        // Code generation and registration happen under one lock.
        let result = state
            .registry
            .lock()
            .await
            .create_room(&self.name, Box::new(self.out.clone()))
            .await;

        match result {
            Ok(room) => {
                let code = room.code().clone();
                self.room = Some(room);
                self.info(&format!("Game created! Your code is: {code}"));
                self.info("Type 'start' to begin when players have joined.");
            }
            Err(e) => {
                warn!(name = %self.name, error = %e, "room creation failed");
                self.error("Could not create a game.");
            }
        }
    }

    async fn prompt_code(&mut self) {
        if self.in_unfinished_game().await {
            self.error("You are already in a game.");
            return;
        }
        self.awaiting_code = true;
        self.info("Enter game code:");
    }

    async fn join(&mut self, state: &ServerState, input: &str) {
        let code = match RoomCode::parse(input) {
            Ok(code) => code,
            Err(e) => {
                debug!(name = %self.name, error = %e, "bad room code");
                self.reply(ServerMessage::JoinError("Invalid game code".into()));
                return;
            }
        };

        let result = state
            .registry
            .lock()
            .await
            .join_room(&code, &self.name, Box::new(self.out.clone()))
            .await;

        match result {
            Ok(room) => self.room = Some(room),
            Err(e) => {
                debug!(name = %self.name, room = %code, error = %e, "join rejected");
                let reason = match e {
                    RoomError::NotFound(_) | RoomError::Unavailable(_) => "Game not found",
                    RoomError::NameTaken { .. } => "Name already taken",
                    _ => "Could not join game",
                };
                self.reply(ServerMessage::JoinError(reason.into()));
            }
        }
    }

    async fn leave_room(&mut self) {
        let Some(room) = self.room.take() else {
            return;
        };
        if let Err(e) = room.leave(&self.name).await {
            debug!(name = %self.name, room = %room.code(), error = %e, "leave failed");
        }
    }

    // -----------------------------------------------------------------------
    // Game commands
    // -----------------------------------------------------------------------

    async fn start(&mut self) {
        let Some(room) = self.room.clone() else {
            self.error("You are not in a game.");
            return;
        };
        match room.start(&self.name).await {
            Ok(()) => {}
            Err(RoomError::NotHost(_)) => self.info("Only the host can start the game!"),
            Err(RoomError::InvalidState(_)) => self.info("Game already started!"),
            Err(e) => self.room_failed(e),
        }
    }

    async fn next(&mut self) {
        let Some(room) = self.room.clone() else {
            self.error("You are not in a game.");
            return;
        };
        match room.next(&self.name).await {
            Ok(()) => {}
            Err(RoomError::NotHost(_)) => self.info("Only the host can advance the question!"),
            Err(RoomError::NotActive) => self.info("Game not started yet!"),
            Err(e) => self.room_failed(e),
        }
    }

    async fn answer(&mut self, letter: AnswerLetter) {
        let Some(room) = self.room.clone() else {
            self.info("Game not started yet!");
            return;
        };
        match room.submit_answer(&self.name, &letter.to_string()).await {
            Ok(()) => {}
            Err(RoomError::NotActive) => self.info("Game not started yet!"),
            Err(e) => self.room_failed(e),
        }
    }

    /// Reports an unexpected room error. A stopped room is forgotten.
    fn room_failed(&mut self, e: RoomError) {
        debug!(name = %self.name, error = %e, "room operation failed");
        if matches!(e, RoomError::Unavailable(_)) {
            self.room = None;
            self.error("That game is no longer available.");
        } else {
            self.error(&e.to_string());
        }
    }

    async fn help(&self) {
        let is_host = match &self.room {
            Some(room) => room
                .info()
                .await
                .is_ok_and(|info| info.host.as_deref() == Some(self.name.as_str())),
            None => false,
        };

        self.info("Unknown command. Available commands:");
        self.info("- create: Create new game");
        self.info("- join: Join existing game");
        self.info("- start: Start game (host only)");
        self.info("- [A/B/C/D]: Answer current question (just the letter)");
        if is_host {
            self.info("- next: Move to next question (host only)");
        }
    }
}
