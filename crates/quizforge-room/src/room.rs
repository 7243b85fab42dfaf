//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor handles one command (or countdown
//! tick) at a time, so a score change and the broadcast that follows it
//! can never interleave with another player's answer. Rooms share no
//! locks with each other.

use quizforge_protocol::{RoomCode, ScoreEntry, ServerMessage};
use quizforge_tick::{Countdown, CountdownConfig, CountdownTick, Epoch};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::sink::BotSink;
use crate::{MessageSink, QuestionBank, QuestionCursor, RoomConfig, RoomError, RoomState};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a "reply channel": the
/// caller sends a command and waits for the response on that channel.
pub(crate) enum RoomCommand {
    /// Add a participant to the room.
    Join {
        name: String,
        sink: Box<dyn MessageSink>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a participant from the room.
    Leave {
        name: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Begin the game (host only).
    Start {
        requester: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Skip to the next question (host only).
    Next {
        requester: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Answer the current question.
    ///
    /// `question` pins the answer to a question index; the answer is
    /// rejected if the room has moved past it. The synthetic participant
    /// sends its answers this way, without a reply channel.
    Answer {
        name: String,
        answer: String,
        question: Option<usize>,
        reply: Option<oneshot::Sender<Result<(), RoomError>>>,
    },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A read-only snapshot of a room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's code.
    pub code: RoomCode,
    /// Current lifecycle state.
    pub state: RoomState,
    /// Display names of the current participants, in join order.
    pub participants: Vec<String>,
    /// The current host, if any networked participant is present.
    pub host: Option<String>,
    /// Number of participants backed by a connection.
    pub networked_count: usize,
    /// Index of the open question while the game is active.
    pub question_index: Option<usize>,
    /// Number of questions in the room's bank.
    pub total_questions: usize,
    /// Scores of everyone who has ever joined, in join order.
    pub scores: Vec<ScoreEntry>,
    /// When the game ended, if it has.
    pub ended_at: Option<Instant>,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// This is cheap to clone: it's just an `mpsc::Sender` wrapper.
/// The `RoomRegistry` holds one of these per room and every session in
/// the room holds another.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command carrying a reply channel and waits for the answer.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Adds a participant. The room greets them through `sink`.
    pub async fn join(&self, name: &str, sink: Box<dyn MessageSink>) -> Result<(), RoomError> {
        let name = name.to_string();
        self.request(|reply| RoomCommand::Join { name, sink, reply })
            .await?
    }

    /// Removes a participant. Their score stays on the board.
    pub async fn leave(&self, name: &str) -> Result<(), RoomError> {
        let name = name.to_string();
        self.request(|reply| RoomCommand::Leave { name, reply })
            .await?
    }

    /// Starts the game on behalf of `requester`.
    pub async fn start(&self, requester: &str) -> Result<(), RoomError> {
        let requester = requester.to_string();
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await?
    }

    /// Advances to the next question on behalf of `requester`.
    pub async fn next(&self, requester: &str) -> Result<(), RoomError> {
        let requester = requester.to_string();
        self.request(|reply| RoomCommand::Next { requester, reply })
            .await?
    }

    /// Submits `answer` for the currently open question.
    pub async fn submit_answer(&self, name: &str, answer: &str) -> Result<(), RoomError> {
        let name = name.to_string();
        let answer = answer.to_string();
        self.request(|reply| RoomCommand::Answer {
            name,
            answer,
            question: None,
            reply: Some(reply),
        })
        .await?
    }

    /// Requests a snapshot of the room.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// One entry of the roster.
struct Participant {
    name: String,
    sink: Box<dyn MessageSink>,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    state: RoomState,
    config: RoomConfig,
    /// Current participants, in join order.
    participants: Vec<Participant>,
    /// Everyone who has ever joined, in join order.
    scores: Vec<ScoreEntry>,
    cursor: QuestionCursor,
    /// Bumped whenever the open question changes; ticks from older
    /// countdowns are discarded.
    epoch: Epoch,
    countdown: Option<Countdown>,
    ended_at: Option<Instant>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Weak handle to our own channel, handed to the synthetic participant.
    commands: mpsc::WeakSender<RoomCommand>,
    tick_tx: mpsc::UnboundedSender<CountdownTick>,
    tick_rx: mpsc::UnboundedReceiver<CountdownTick>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands and ticks until shutdown.
    async fn run(mut self) {
        info!(room = %self.code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                Some(tick) = self.tick_rx.recv() => self.handle_tick(tick),
            }
        }

        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        info!(room = %self.code, "room actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { name, sink, reply } => {
                let _ = reply.send(self.handle_join(name, sink));
            }
            RoomCommand::Leave { name, reply } => {
                let _ = reply.send(self.handle_leave(&name));
            }
            RoomCommand::Start { requester, reply } => {
                let _ = reply.send(self.handle_start(&requester));
            }
            RoomCommand::Next { requester, reply } => {
                let _ = reply.send(self.handle_next(&requester));
            }
            RoomCommand::Answer {
                name,
                answer,
                question,
                reply,
            } => {
                let result = self.handle_answer(&name, &answer, question);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            trace!(room = %self.code, %name, error = %e, "answer discarded");
                        }
                    }
                }
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.code, "room shutting down");
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    fn handle_join(&mut self, name: String, sink: Box<dyn MessageSink>) -> Result<(), RoomError> {
        if self.participants.iter().any(|p| p.name == name) {
            return Err(RoomError::NameTaken {
                name,
                code: self.code.clone(),
            });
        }

        // The very first participant is the room's creator.
        let creator = self.scores.is_empty();
        let greeting = if creator {
            ServerMessage::RoomCode(self.code.clone())
        } else {
            ServerMessage::JoinSuccess(self.code.clone())
        };
        if sink.deliver(&greeting).is_err() {
            debug!(room = %self.code, %name, "joining participant's sink already closed");
        }

        self.add_participant(name, sink);

        if creator {
            if let Some(bot) = self.config.bot.clone() {
                let bot_name = self.unused_name(&bot.name);
                let sink = BotSink::new(bot_name.clone(), bot, self.commands.clone());
                self.add_participant(bot_name, Box::new(sink));
            }
        }
        Ok(())
    }

    /// `base`, or `base 2`, `base 3`, ... if the name is already taken.
    fn unused_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.scores.iter().any(|s| s.name == candidate);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn add_participant(&mut self, name: String, sink: Box<dyn MessageSink>) {
        if !self.scores.iter().any(|s| s.name == name) {
            self.scores.push(ScoreEntry::new(name.clone(), 0));
        }
        info!(
            room = %self.code,
            %name,
            synthetic = sink.is_synthetic(),
            participants = self.participants.len() + 1,
            "participant joined"
        );
        self.participants.push(Participant {
            name: name.clone(),
            sink,
        });
        self.broadcast(&ServerMessage::PlayerList(self.names()));
        self.broadcast(&ServerMessage::info(format!("{name} has joined the room.")));
    }

    fn handle_leave(&mut self, name: &str) -> Result<(), RoomError> {
        let pos = self
            .participants
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| RoomError::NotInRoom(name.to_string()))?;
        self.participants.remove(pos);

        info!(
            room = %self.code,
            %name,
            participants = self.participants.len(),
            "participant left"
        );
        self.broadcast(&ServerMessage::info(format!("{name} has left the room.")));
        self.broadcast(&ServerMessage::PlayerList(self.names()));

        if self.state.is_active() && self.networked_count() == 0 {
            info!(room = %self.code, "no players left, ending game");
            self.end_game();
        }
        Ok(())
    }

    /// The host is the earliest-joined participant backed by a connection.
    fn host(&self) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| !p.sink.is_synthetic())
            .map(|p| p.name.as_str())
    }

    fn require_host(&self, requester: &str) -> Result<(), RoomError> {
        if self.host() == Some(requester) {
            Ok(())
        } else {
            Err(RoomError::NotHost(requester.to_string()))
        }
    }

    fn networked_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| !p.sink.is_synthetic())
            .count()
    }

    fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    // -----------------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------------

    fn handle_start(&mut self, requester: &str) -> Result<(), RoomError> {
        self.require_host(requester)?;
        if !self.state.can_transition_to(RoomState::Active) {
            return Err(RoomError::InvalidState(format!(
                "cannot start a game in state {}",
                self.state
            )));
        }

        self.state = RoomState::Active;
        info!(
            room = %self.code,
            participants = self.participants.len(),
            questions = self.cursor.total(),
            "game started"
        );
        self.broadcast(&ServerMessage::GameStarted);
        self.advance();
        Ok(())
    }

    fn handle_next(&mut self, requester: &str) -> Result<(), RoomError> {
        self.require_host(requester)?;
        if !self.state.is_active() {
            return Err(RoomError::NotActive);
        }
        debug!(room = %self.code, %requester, "host skipped question");
        self.advance();
        Ok(())
    }

    /// Moves to the next question, or ends the game when none is left.
    fn advance(&mut self) {
        self.epoch = self.epoch.next();
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }

        let total = self.cursor.total();
        let secs = self.config.time_limit_secs();
        let next = self
            .cursor
            .next_question()
            .map(|(index, q)| q.payload(index, total, secs));

        match next {
            Some(payload) => {
                debug!(
                    room = %self.code,
                    question = payload.number,
                    total,
                    epoch = self.epoch.get(),
                    "question opened"
                );
                self.broadcast(&ServerMessage::Question(payload));
                self.countdown = Some(Countdown::start(
                    self.epoch,
                    CountdownConfig::with_secs(secs),
                    self.tick_tx.clone(),
                ));
            }
            None => self.end_game(),
        }
    }

    fn end_game(&mut self) {
        if self.state == RoomState::Ended {
            return;
        }
        self.epoch = self.epoch.next();
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        self.state = RoomState::Ended;
        self.ended_at = Some(Instant::now());

        // Stable sort: equal scores keep join order.
        let mut standings = self.scores.clone();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        info!(room = %self.code, "game ended");
        self.broadcast(&ServerMessage::FinalScores(standings));
    }

    fn handle_tick(&mut self, tick: CountdownTick) {
        if tick.epoch != self.epoch || !self.state.is_active() {
            trace!(
                room = %self.code,
                tick_epoch = tick.epoch.get(),
                epoch = self.epoch.get(),
                "stale tick discarded"
            );
            return;
        }

        self.broadcast(&ServerMessage::TimerUpdate {
            fraction: tick.fraction(),
            seconds_left: tick.remaining_secs,
        });
        if !tick.is_expired() {
            return;
        }

        self.countdown = None;
        self.broadcast(&ServerMessage::TimeUp);
        if let Some((_, q)) = self.cursor.current() {
            let msg = ServerMessage::info(format!("Time's up! Correct answer was: {}", q.correct));
            self.broadcast(&msg);
        }
        self.broadcast(&ServerMessage::Scores(self.scores.clone()));
        self.advance();
    }

    fn handle_answer(
        &mut self,
        name: &str,
        answer: &str,
        question: Option<usize>,
    ) -> Result<(), RoomError> {
        if !self.state.is_active() {
            return Err(RoomError::NotActive);
        }
        let (index, correct, correct_answer) = match self.cursor.current() {
            Some((index, q)) => (index, q.is_correct(answer), q.correct.clone()),
            None => return Err(RoomError::NotActive),
        };
        if question.is_some_and(|q| q != index) {
            return Err(RoomError::InvalidState(format!(
                "question {index} is open, answer was for another"
            )));
        }
        if !self.participants.iter().any(|p| p.name == name) {
            return Err(RoomError::NotInRoom(name.to_string()));
        }

        let entry = self
            .scores
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| RoomError::NotInRoom(name.to_string()))?;
        if correct {
            entry.score += 1;
        }
        let score = entry.score;
        debug!(room = %self.code, %name, correct, score, "answer judged");

        self.send_to(
            name,
            &ServerMessage::AnswerResult {
                correct,
                score,
                correct_answer,
            },
        );
        self.broadcast(&ServerMessage::Scores(self.scores.clone()));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Delivers to every participant. A failed delivery affects only that
    /// recipient.
    fn broadcast(&self, msg: &ServerMessage) {
        for p in &self.participants {
            if p.sink.deliver(msg).is_err() {
                debug!(room = %self.code, name = %p.name, "delivery failed, sink closed");
            }
        }
    }

    fn send_to(&self, name: &str, msg: &ServerMessage) {
        if let Some(p) = self.participants.iter().find(|p| p.name == name) {
            if p.sink.deliver(msg).is_err() {
                debug!(room = %self.code, %name, "delivery failed, sink closed");
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            state: self.state,
            participants: self.names(),
            host: self.host().map(str::to_string),
            networked_count: self.networked_count(),
            question_index: if self.state.is_active() {
                self.cursor.current().map(|(i, _)| i)
            } else {
                None
            },
            total_questions: self.cursor.total(),
            scores: self.scores.clone(),
            ended_at: self.ended_at,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: if the channel fills up,
/// senders will wait (bounded channel).
pub(crate) fn spawn_room(
    code: RoomCode,
    config: RoomConfig,
    questions: &QuestionBank,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let (tick_tx, tick_rx) = mpsc::unbounded_channel();

    let actor = RoomActor {
        code: code.clone(),
        state: RoomState::Lobby,
        config,
        participants: Vec::new(),
        scores: Vec::new(),
        cursor: questions.cursor(),
        epoch: Epoch::ZERO,
        countdown: None,
        ended_at: None,
        receiver: rx,
        commands: tx.downgrade(),
        tick_tx,
        tick_rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
