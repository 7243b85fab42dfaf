//! Questions, question banks and per-room cursors.
//!
//! A [`QuestionBank`] is immutable and cheap to clone: every room created by
//! a registry shares the same storage. Each room walks the bank with its own
//! [`QuestionCursor`], so two games never disturb each other's position.

use std::path::Path;
use std::sync::Arc;

use quizforge_protocol::{AnswerLetter, QuestionPayload};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::QuestionError;

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// One multiple-choice question.
///
/// `correct` holds either the literal text of the right option or its
/// letter (`A`-`D`); [`is_correct`](Self::is_correct) accepts both forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: [String; 4],
    pub correct: String,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: [&str; 4],
        correct: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.map(str::to_string),
            correct: correct.into(),
        }
    }

    /// The option text a letter refers to.
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.index()]
    }

    /// Judges an answer.
    ///
    /// Correct when the trimmed, case-folded answer equals the case-folded
    /// correct field, or when the answer is a single letter `A`-`D` whose
    /// option text case-folds to the correct field.
    pub fn is_correct(&self, answer: &str) -> bool {
        let answer = answer.trim().to_lowercase();
        let correct = self.correct.trim().to_lowercase();
        if answer == correct {
            return true;
        }
        match answer.parse::<AnswerLetter>() {
            Ok(letter) => self.option(letter).trim().to_lowercase() == correct,
            Err(_) => false,
        }
    }

    /// Builds the wire payload for this question at `index` (0-based).
    pub fn payload(&self, index: usize, total: usize, time_limit_secs: u32) -> QuestionPayload {
        QuestionPayload {
            number: index + 1,
            total,
            text: self.text.clone(),
            options: self.options.clone(),
            correct: self.correct.clone(),
            time_limit_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// QuestionBank
// ---------------------------------------------------------------------------

/// An immutable, ordered list of questions with shared storage.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Arc<[Question]>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into(),
        }
    }

    /// Parses a JSON array of `{ "text", "options": [4], "correct" }`
    /// objects. An empty array is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, QuestionError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        if questions.is_empty() {
            return Err(QuestionError::Empty);
        }
        Ok(Self::new(questions))
    }

    /// Reads and parses a JSON question file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, QuestionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| QuestionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = Self::from_json_str(&json)?;
        info!(path = %path.display(), questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    /// A small general-knowledge bank used when no file is configured.
    pub fn builtin() -> Self {
        Self::new(vec![
            Question::new(
                "What is the largest planet in our solar system?",
                ["Mars", "Jupiter", "Saturn", "Neptune"],
                "Jupiter",
            ),
            Question::new(
                "Which element has the chemical symbol O?",
                ["Gold", "Osmium", "Oxygen", "Iron"],
                "Oxygen",
            ),
            Question::new(
                "How many continents are there on Earth?",
                ["Five", "Six", "Seven", "Eight"],
                "C",
            ),
            Question::new(
                "Who wrote 'Romeo and Juliet'?",
                ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"],
                "William Shakespeare",
            ),
            Question::new(
                "What is the boiling point of water at sea level in Celsius?",
                ["90", "100", "110", "120"],
                "100",
            ),
            Question::new(
                "Which ocean is the largest?",
                ["Atlantic", "Indian", "Arctic", "Pacific"],
                "D",
            ),
            Question::new(
                "What is the capital of Japan?",
                ["Kyoto", "Osaka", "Tokyo", "Nagoya"],
                "Tokyo",
            ),
            Question::new(
                "How many sides does a hexagon have?",
                ["Five", "Six", "Seven", "Eight"],
                "Six",
            ),
        ])
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// A fresh cursor positioned before the first question.
    pub fn cursor(&self) -> QuestionCursor {
        QuestionCursor {
            bank: self.clone(),
            current: None,
            exhausted: false,
        }
    }
}

// ---------------------------------------------------------------------------
// QuestionCursor
// ---------------------------------------------------------------------------

/// A room's position in a [`QuestionBank`].
#[derive(Debug, Clone)]
pub struct QuestionCursor {
    bank: QuestionBank,
    current: Option<usize>,
    exhausted: bool,
}

impl QuestionCursor {
    /// Moves to the next question and returns it with its index.
    ///
    /// Returns `None` once the bank is exhausted, and keeps returning
    /// `None` on every later call.
    pub fn next_question(&mut self) -> Option<(usize, &Question)> {
        if self.exhausted {
            return None;
        }
        let next = self.current.map_or(0, |i| i + 1);
        if next >= self.bank.len() {
            self.exhausted = true;
            self.current = None;
            return None;
        }
        self.current = Some(next);
        self.bank.get(next).map(|q| (next, q))
    }

    /// The question most recently returned by
    /// [`next_question`](Self::next_question), unless exhausted.
    pub fn current(&self) -> Option<(usize, &Question)> {
        let index = self.current?;
        self.bank.get(index).map(|q| (index, q))
    }

    /// Total number of questions in the underlying bank.
    pub fn total(&self) -> usize {
        self.bank.len()
    }
}
