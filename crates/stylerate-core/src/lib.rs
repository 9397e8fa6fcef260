//! stylerate-core: survey sessions and their results.
//!
//! Holds the question bank and per-evaluator session state. Judgments are
//! flattened here into the rows the export crate writes out.

pub mod aggregate;
pub mod bank;
pub mod engine;
pub mod error;
pub mod model;
pub mod randomizer;
pub mod session;
pub mod traits;

pub use aggregate::flatten;
pub use bank::QuestionBank;
pub use engine::{SurveyEngine, SurveyEngineConfig, SurveyView};
pub use error::{IncompleteSessionError, LoadError, SessionError};
pub use model::{CategoryLabel, Question, QuestionId, ResultRow, Selection};
pub use session::{AnswerPolicy, SessionId, SessionState};
