//! Message sinks: where a room delivers messages for one participant.
//!
//! A room never knows whether it is talking to a socket or to the
//! synthetic participant. Both sit behind [`MessageSink`]:
//!
//! - [`PlayerSender`]: the outbound channel of a network session. The
//!   session's writer task drains it onto the connection.
//! - `BotSink`: reacts to `QUESTION` messages by scheduling a delayed
//!   answer back into the room.

use std::time::Duration;

use quizforge_protocol::{AnswerLetter, QuestionPayload, ServerMessage};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::BotConfig;
use crate::room::RoomCommand;

/// Returned when a sink can no longer accept messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("message sink closed")]
pub struct SinkClosed;

/// Something a room can deliver [`ServerMessage`]s to.
pub trait MessageSink: Send + 'static {
    /// Delivers one message. Must not block.
    fn deliver(&self, msg: &ServerMessage) -> Result<(), SinkClosed>;

    /// `true` for participants that are not backed by a connection.
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// Channel sender for delivering outbound messages to a network session.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

impl MessageSink for PlayerSender {
    fn deliver(&self, msg: &ServerMessage) -> Result<(), SinkClosed> {
        self.send(msg.clone()).map_err(|_| SinkClosed)
    }
}

// ---------------------------------------------------------------------------
// Synthetic participant
// ---------------------------------------------------------------------------

/// Smallest gap kept between the bot's answer and the end of the countdown.
const ANSWER_MARGIN: Duration = Duration::from_millis(500);

/// The synthetic participant.
///
/// Holds only a weak sender to its room so that a pending answer never
/// keeps a finished room alive.
pub(crate) struct BotSink {
    name: String,
    config: BotConfig,
    room: mpsc::WeakSender<RoomCommand>,
}

impl BotSink {
    pub(crate) fn new(name: String, config: BotConfig, room: mpsc::WeakSender<RoomCommand>) -> Self {
        Self {
            name,
            config: config.validated(),
            room,
        }
    }

    /// Picks an answer and a delay for `question`.
    fn plan<R: Rng>(&self, question: &QuestionPayload, rng: &mut R) -> (String, Duration) {
        let answer = if rng.random_bool(self.config.accuracy) {
            question.correct.clone()
        } else {
            let i = rng.random_range(0..AnswerLetter::ALL.len());
            AnswerLetter::ALL[i].to_string()
        };

        let limit = Duration::from_secs(u64::from(question.time_limit_secs));
        let upper = self.config.max_delay.min(limit.saturating_sub(ANSWER_MARGIN));
        let lower = self.config.min_delay.min(upper);
        let (lo, hi) = (lower.as_millis() as u64, upper.as_millis() as u64);
        let delay = if hi > lo {
            Duration::from_millis(rng.random_range(lo..=hi))
        } else {
            lower
        };

        (answer, delay)
    }
}

impl MessageSink for BotSink {
    fn deliver(&self, msg: &ServerMessage) -> Result<(), SinkClosed> {
        let Some(question) = msg.as_question() else {
            return Ok(());
        };
        if self.room.strong_count() == 0 {
            return Err(SinkClosed);
        }

        let (answer, delay) = self.plan(question, &mut rand::rng());
        let index = question.number.saturating_sub(1);
        let name = self.name.clone();
        let room = self.room.clone();
        trace!(%name, index, ?delay, "bot answer scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(room) = room.upgrade() else {
                trace!(%name, "room gone before bot answered");
                return;
            };
            let cmd = RoomCommand::Answer {
                name,
                answer,
                question: Some(index),
                reply: None,
            };
            if room.send(cmd).await.is_err() {
                debug!("room closed before bot answer was delivered");
            }
        });

        Ok(())
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}
