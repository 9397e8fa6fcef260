//! Central survey engine.
//!
//! Coordinates many concurrent evaluator sessions over one shared question
//! bank. Each session has its own state and its own cached presentation
//! plans; nothing is shared between sessions except the read-only bank.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::aggregate::flatten;
use crate::bank::QuestionBank;
use crate::error::SessionError;
use crate::model::{Question, QuestionId, ResultRow, Selection};
use crate::randomizer::{PresentationPlan, PresentationRandomizer};
use crate::session::{AnswerPolicy, ResponseRecorder, SessionId, SessionPhase, SessionState};

/// Configuration for the survey engine.
#[derive(Debug, Clone, Default)]
pub struct SurveyEngineConfig {
    /// How incomplete or repeated selections are treated on advance.
    pub policy: AnswerPolicy,
    /// Seed for presentation shuffles; `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// What a session should currently be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SurveyView {
    Question(QuestionView),
    Complete,
}

/// The current question together with its fixed layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// 0-based page index.
    pub index: usize,
    /// Number of questions in the bank.
    pub total: usize,
    pub question_id: QuestionId,
    pub prompt: String,
    pub plan: PresentationPlan,
}

/// The survey engine.
pub struct SurveyEngine {
    bank: Arc<QuestionBank>,
    randomizer: Mutex<PresentationRandomizer>,
    sessions: Mutex<HashMap<SessionId, SessionState>>,
    recorder: ResponseRecorder,
}

impl SurveyEngine {
    pub fn new(bank: Arc<QuestionBank>, config: SurveyEngineConfig) -> Self {
        let randomizer = match config.seed {
            Some(seed) => PresentationRandomizer::seeded(seed),
            None => PresentationRandomizer::from_os_rng(),
        };
        Self::with_randomizer(bank, randomizer, ResponseRecorder::new(config.policy))
    }

    /// Build an engine around an explicit randomizer and recorder.
    pub fn with_randomizer(
        bank: Arc<QuestionBank>,
        randomizer: PresentationRandomizer,
        recorder: ResponseRecorder,
    ) -> Self {
        Self {
            bank,
            randomizer: Mutex::new(randomizer),
            sessions: Mutex::new(HashMap::new()),
            recorder,
        }
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.recorder.policy()
    }

    /// Start a session for an evaluator. No state is created for a blank id.
    pub fn start_session(&self, evaluator_id: &str) -> Result<SessionId, SessionError> {
        let question_ids: Vec<QuestionId> = self.bank.iter().map(Question::id).collect();
        let state = SessionState::for_questions(evaluator_id, &question_ids)?;
        let id = state.id();
        tracing::info!(
            session = %id,
            evaluator = state.evaluator_id(),
            questions = self.bank.len(),
            "session started"
        );
        lock(&self.sessions).insert(id, state);
        Ok(id)
    }

    /// The question the session is on, with its cached layout.
    pub fn view(&self, session: SessionId) -> Result<SurveyView, SessionError> {
        let sessions = lock(&self.sessions);
        let state = sessions
            .get(&session)
            .ok_or(SessionError::UnknownSession(session))?;

        match state.phase() {
            SessionPhase::Complete => Ok(SurveyView::Complete),
            SessionPhase::AnsweringQuestion(index) => {
                let plan = self.plan(session, index)?;
                let question = self.question(index)?;
                Ok(SurveyView::Question(QuestionView {
                    index,
                    total: self.bank.len(),
                    question_id: question.id(),
                    prompt: question.prompt().to_string(),
                    plan,
                }))
            }
        }
    }

    /// Commit the current question's selections and move on.
    pub fn advance(
        &self,
        session: SessionId,
        selections: &[Selection],
    ) -> Result<SessionPhase, SessionError> {
        let mut sessions = lock(&self.sessions);
        let state = sessions
            .get_mut(&session)
            .ok_or(SessionError::UnknownSession(session))?;

        let index = match state.phase() {
            SessionPhase::Complete => return Err(SessionError::AlreadyComplete),
            SessionPhase::AnsweringQuestion(index) => index,
        };
        let plan = self.plan(session, index)?;
        self.recorder.record(state, index, &plan, selections)?;

        let phase = state.advance()?;
        if phase == SessionPhase::Complete {
            tracing::info!(
                session = %session,
                evaluator = state.evaluator_id(),
                answered = state.responses().len(),
                "session complete"
            );
        }
        Ok(phase)
    }

    /// Re-open the previous question. Its layout is reused.
    pub fn back(&self, session: SessionId) -> Result<SessionPhase, SessionError> {
        let mut sessions = lock(&self.sessions);
        let state = sessions
            .get_mut(&session)
            .ok_or(SessionError::UnknownSession(session))?;
        state.back()
    }

    /// Flattened result rows for a session.
    pub fn results(&self, session: SessionId) -> Result<Vec<ResultRow>, SessionError> {
        let sessions = lock(&self.sessions);
        let state = sessions
            .get(&session)
            .ok_or(SessionError::UnknownSession(session))?;
        Ok(flatten(state)?)
    }

    /// A copy of the session's current state.
    pub fn snapshot(&self, session: SessionId) -> Result<SessionState, SessionError> {
        lock(&self.sessions)
            .get(&session)
            .cloned()
            .ok_or(SessionError::UnknownSession(session))
    }

    /// Tear a session down, dropping its state and cached plans.
    pub fn end_session(&self, session: SessionId) -> Option<SessionState> {
        let removed = lock(&self.sessions).remove(&session);
        lock(&self.randomizer).forget_session(session);
        if removed.is_some() {
            tracing::debug!(session = %session, "session ended");
        }
        removed
    }

    pub fn active_sessions(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn question(&self, index: usize) -> Result<&Question, SessionError> {
        self.bank.get(index).ok_or(SessionError::QuestionOutOfRange {
            index,
            len: self.bank.len(),
        })
    }

    fn plan(&self, session: SessionId, index: usize) -> Result<PresentationPlan, SessionError> {
        let question = self.question(index)?;
        Ok(lock(&self.randomizer)
            .plan_for(session, index, question)
            .clone())
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
