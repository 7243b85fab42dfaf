//! Client → server commands.
//!
//! Every line a client sends after its display name is decoded here, once,
//! into a closed [`Command`] enum. Code further down never looks at the raw
//! string again.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    /// All letters in option order.
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Maps a character (either case) to a letter.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Position of the option this letter addresses (A = 0).
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// The uppercase character for this letter.
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AnswerLetter {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c)
                .ok_or_else(|| ProtocolError::InvalidAnswer(s.to_string())),
            _ => Err(ProtocolError::InvalidAnswer(s.to_string())),
        }
    }
}

/// A decoded client command.
///
/// `join` is a two-line exchange: the code arrives on the following line
/// and is read by the session handler, so it is not part of this variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create a new room and become its host.
    Create,
    /// Join an existing room (room code follows on the next line).
    Join,
    /// Start the game (host only).
    Start,
    /// Skip to the next question (host only).
    Next,
    /// Answer the current question.
    Answer(AnswerLetter),
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let word = line.trim();
        if word.eq_ignore_ascii_case("create") {
            Ok(Self::Create)
        } else if word.eq_ignore_ascii_case("join") {
            Ok(Self::Join)
        } else if word.eq_ignore_ascii_case("start") {
            Ok(Self::Start)
        } else if word.eq_ignore_ascii_case("next") {
            Ok(Self::Next)
        } else if let Ok(letter) = word.parse::<AnswerLetter>() {
            Ok(Self::Answer(letter))
        } else {
            Err(ProtocolError::UnknownCommand(line.to_string()))
        }
    }
}
