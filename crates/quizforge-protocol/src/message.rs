//! Server → client messages.
//!
//! [`ServerMessage`] is the complete set of things the server can say.
//! Each variant encodes to exactly one line via `Display`; the line
//! prefixes and `|`/`,`/`:` field delimiters are the wire contract that
//! clients parse, so the tests below pin every shape.

use std::fmt;

use crate::RoomCode;

/// One row of a score table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Everything a client needs to render one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPayload {
    /// 1-based position of this question in the bank.
    pub number: usize,
    /// Total number of questions in the bank.
    pub total: usize,
    pub text: String,
    /// Option texts in A-D order.
    pub options: [String; 4],
    /// The correct-answer field exactly as stored (letter or text).
    pub correct: String,
    /// Seconds allowed for this question.
    pub time_limit_secs: u32,
}

/// A message from the server to one client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Free-form informational text (prompts, announcements, rejections).
    Info(String),
    /// `ERROR:<text>`
    Error(String),
    /// `ROOM_CODE:<code>`, sent once to a room's creator.
    RoomCode(RoomCode),
    /// `JOIN_SUCCESS:<code>`
    JoinSuccess(RoomCode),
    /// `JOIN_ERROR:<reason>`
    JoinError(String),
    /// `PLAYER_LIST:<name>,<name>,...` in join order.
    PlayerList(Vec<String>),
    /// `QUESTION:<n>/<total>:<text>|<A>|<B>|<C>|<D>|<correct>|<secs>`
    Question(QuestionPayload),
    /// `ANSWER_RESULT:<feedback>|<correct>`, sent only to the answerer.
    AnswerResult {
        correct: bool,
        score: u32,
        correct_answer: String,
    },
    /// `SCORES:<name>:<score>,...`
    Scores(Vec<ScoreEntry>),
    /// `FINAL_SCORES:<name>:<score>,...`, highest first.
    FinalScores(Vec<ScoreEntry>),
    /// `GAME_STARTED`
    GameStarted,
    /// `TIMER_UPDATE:<fraction>|<seconds>`
    TimerUpdate { fraction: f64, seconds_left: u32 },
    /// `TIME_UP`
    TimeUp,
}

impl ServerMessage {
    /// Builds a [`ServerMessage::Info`] from anything string-like.
    pub fn info(text: impl Into<String>) -> Self {
        Self::Info(text.into())
    }

    /// Returns the question payload if this is a `QUESTION` message.
    pub fn as_question(&self) -> Option<&QuestionPayload> {
        match self {
            Self::Question(q) => Some(q),
            _ => None,
        }
    }
}

fn write_scores(f: &mut fmt::Formatter<'_>, scores: &[ScoreEntry]) -> fmt::Result {
    for (i, entry) in scores.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}:{}", entry.name, entry.score)?;
    }
    Ok(())
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(text) => f.write_str(text),
            Self::Error(text) => write!(f, "ERROR:{text}"),
            Self::RoomCode(code) => write!(f, "ROOM_CODE:{code}"),
            Self::JoinSuccess(code) => write!(f, "JOIN_SUCCESS:{code}"),
            Self::JoinError(reason) => write!(f, "JOIN_ERROR:{reason}"),
            Self::PlayerList(names) => {
                write!(f, "PLAYER_LIST:{}", names.join(","))
            }
            Self::Question(q) => {
                let [a, b, c, d] = &q.options;
                write!(
                    f,
                    "QUESTION:{}/{}:{}|{a}|{b}|{c}|{d}|{}|{}",
                    q.number, q.total, q.text, q.correct, q.time_limit_secs
                )
            }
            Self::AnswerResult {
                correct: true,
                score,
                correct_answer,
            } => write!(
                f,
                "ANSWER_RESULT:Correct! Your score:{score}|{correct_answer}"
            ),
            Self::AnswerResult {
                correct: false,
                correct_answer,
                ..
            } => write!(
                f,
                "ANSWER_RESULT:Incorrect! The correct answer was: {correct_answer}|{correct_answer}"
            ),
            Self::Scores(scores) => {
                f.write_str("SCORES:")?;
                write_scores(f, scores)
            }
            Self::FinalScores(scores) => {
                f.write_str("FINAL_SCORES:")?;
                write_scores(f, scores)
            }
            Self::GameStarted => f.write_str("GAME_STARTED"),
            Self::TimerUpdate {
                fraction,
                seconds_left,
            } => write!(f, "TIMER_UPDATE:{fraction}|{seconds_left}"),
            Self::TimeUp => f.write_str("TIME_UP"),
        }
    }
}
