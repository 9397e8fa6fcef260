//! Error types for loading questions and driving survey sessions.
//!
//! Defined here so the front end can match on the exact failure instead of
//! inspecting messages.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{CategoryLabel, QuestionId};
use crate::session::SessionId;

/// Errors raised while loading a question bank. No partial bank is exposed
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The question file could not be opened or read.
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV itself could not be parsed.
    #[error("malformed question bank: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("question bank is missing the `{0}` column")]
    MissingColumn(String),

    /// A question id cell is not an unsigned integer.
    #[error("row {row}: invalid question id `{value}`")]
    InvalidQuestionId { row: usize, value: String },

    /// A question has an empty prompt.
    #[error("question {question} has no prompt")]
    MissingPrompt { question: QuestionId },

    /// A question has no sentence for one of the categories.
    #[error("question {question} has no sentence for {category}")]
    MissingSentence {
        question: QuestionId,
        category: CategoryLabel,
    },

    /// A question lists the same category twice.
    #[error("question {question} lists {category} more than once")]
    DuplicateCategory {
        question: QuestionId,
        category: CategoryLabel,
    },

    /// Two rows share a question id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(QuestionId),

    /// The source held a header but no questions.
    #[error("question bank contains no questions")]
    Empty,

    #[error("malformed question bank: {0}")]
    Malformed(String),
}

/// Errors raised by session transitions and response recording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session cannot start without an evaluator identifier.
    #[error("evaluator id must not be empty")]
    EmptyEvaluatorId,

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// The session has already answered every question.
    #[error("session already completed")]
    AlreadyComplete,

    /// A recording targeted a question other than the one being answered.
    #[error("session is on question index {current}, not {requested}")]
    NotCurrentQuestion { current: usize, requested: usize },

    /// A question index past the end of the bank.
    #[error("question index {index} is out of range (bank has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    /// The plan belongs to a question other than the one at this index.
    #[error("question {question} does not belong at index {index}")]
    WrongQuestion { index: usize, question: QuestionId },

    #[error("expected {expected} selections, got {actual}")]
    SelectionCount { expected: usize, actual: usize },

    /// Strict policy: some positions were left unanswered (1-based).
    #[error("unanswered sentence positions: {0:?}")]
    Unanswered(Vec<u8>),

    /// Strict policy: a category was assigned to more than one sentence.
    #[error("category {0} chosen more than once")]
    DuplicateChoice(CategoryLabel),

    #[error("already at the first question")]
    AtFirstQuestion,

    #[error(transparent)]
    Incomplete(#[from] IncompleteSessionError),
}

/// Aggregation was requested for a session with nothing recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session for evaluator `{evaluator_id}` has no recorded responses")]
pub struct IncompleteSessionError {
    pub evaluator_id: String,
}
