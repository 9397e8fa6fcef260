//! Per-evaluator session state and response recording.
//!
//! A session moves from `Init` (no state yet) through one
//! `AnsweringQuestion(k)` per question to `Complete`. Judgments for a
//! question are committed by the [`ResponseRecorder`] before the pointer
//! moves on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{CategoryLabel, Judgment, QuestionId, Selection, CATEGORY_COUNT};
use crate::randomizer::PresentationPlan;

/// Opaque token identifying one evaluator's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a session is in the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Answering the question at this 0-based index.
    AnsweringQuestion(usize),
    Complete,
}

/// The judgments recorded for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: QuestionId,
    /// In display-position order.
    pub judgments: [Judgment; CATEGORY_COUNT],
}

/// Recorded questions, kept in the order they were first recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responses {
    entries: Vec<QuestionResponse>,
}

impl Responses {
    /// Insert or replace the judgments for a question. A replaced question
    /// keeps its original position.
    pub fn upsert(&mut self, response: QuestionResponse) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.question_id == response.question_id)
        {
            Some(existing) => *existing = response,
            None => self.entries.push(response),
        }
    }

    pub fn get(&self, question_id: QuestionId) -> Option<&QuestionResponse> {
        self.entries.iter().find(|e| e.question_id == question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuestionResponse> {
        self.entries.iter()
    }
}

/// Mutable state of one evaluator's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    id: SessionId,
    evaluator_id: String,
    current_page: usize,
    question_count: usize,
    /// Question id expected at each page, once known.
    pages: Vec<Option<QuestionId>>,
    responses: Responses,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// `Init -> AnsweringQuestion(0)`. Refuses an empty evaluator id.
    pub fn start(evaluator_id: &str, question_count: usize) -> Result<Self, SessionError> {
        let evaluator_id = evaluator_id.trim();
        if evaluator_id.is_empty() {
            return Err(SessionError::EmptyEvaluatorId);
        }
        Ok(Self {
            id: SessionId::new(),
            evaluator_id: evaluator_id.to_string(),
            current_page: 0,
            question_count,
            pages: vec![None; question_count],
            responses: Responses::default(),
            started_at: Utc::now(),
            completed_at: if question_count == 0 {
                Some(Utc::now())
            } else {
                None
            },
        })
    }

    /// Like [`SessionState::start`], with the question at every page fixed
    /// up front so recordings for the wrong question are refused.
    pub fn for_questions(
        evaluator_id: &str,
        question_ids: &[QuestionId],
    ) -> Result<Self, SessionError> {
        let mut state = Self::start(evaluator_id, question_ids.len())?;
        state.pages = question_ids.iter().copied().map(Some).collect();
        Ok(state)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn evaluator_id(&self) -> &str {
        &self.evaluator_id
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn phase(&self) -> SessionPhase {
        if self.current_page >= self.question_count {
            SessionPhase::Complete
        } else {
            SessionPhase::AnsweringQuestion(self.current_page)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SessionPhase::Complete
    }

    /// Move to the next question, or to `Complete` after the last one.
    pub(crate) fn advance(&mut self) -> Result<SessionPhase, SessionError> {
        if self.is_complete() {
            return Err(SessionError::AlreadyComplete);
        }
        self.current_page += 1;
        if self.is_complete() {
            self.completed_at = Some(Utc::now());
        }
        Ok(self.phase())
    }

    /// Return to the previous question.
    pub(crate) fn back(&mut self) -> Result<SessionPhase, SessionError> {
        match self.phase() {
            SessionPhase::Complete => Err(SessionError::AlreadyComplete),
            SessionPhase::AnsweringQuestion(0) => Err(SessionError::AtFirstQuestion),
            SessionPhase::AnsweringQuestion(k) => {
                self.current_page = k - 1;
                Ok(self.phase())
            }
        }
    }
}

/// Whether unanswered or repeated choices may be committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPolicy {
    /// Record whatever was selected, placeholders included.
    #[default]
    Lenient,
    /// Every position must be answered, each category at most once.
    Strict,
}

impl fmt::Display for AnswerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerPolicy::Lenient => write!(f, "lenient"),
            AnswerPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for AnswerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(AnswerPolicy::Lenient),
            "strict" => Ok(AnswerPolicy::Strict),
            other => Err(format!("unknown answer policy: {other}")),
        }
    }
}

/// Validates one question's selections and writes them into a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseRecorder {
    policy: AnswerPolicy,
}

impl ResponseRecorder {
    pub fn new(policy: AnswerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    /// Build judgments from `plan` and `selections` (display order) and store
    /// them under the plan's question, replacing any earlier set.
    pub fn record(
        &self,
        state: &mut SessionState,
        question_index: usize,
        plan: &PresentationPlan,
        selections: &[Selection],
    ) -> Result<(), SessionError> {
        match state.phase() {
            SessionPhase::Complete => return Err(SessionError::AlreadyComplete),
            SessionPhase::AnsweringQuestion(current) if current != question_index => {
                return Err(SessionError::NotCurrentQuestion {
                    current,
                    requested: question_index,
                })
            }
            SessionPhase::AnsweringQuestion(_) => {}
        }

        let question_id = plan.question_id();
        let misplaced = state.pages[question_index].is_some_and(|id| id != question_id)
            || state
                .pages
                .iter()
                .enumerate()
                .any(|(page, id)| page != question_index && *id == Some(question_id));
        if misplaced {
            return Err(SessionError::WrongQuestion {
                index: question_index,
                question: question_id,
            });
        }

        let selections: [Selection; CATEGORY_COUNT] =
            selections
                .try_into()
                .map_err(|_| SessionError::SelectionCount {
                    expected: CATEGORY_COUNT,
                    actual: selections.len(),
                })?;

        if self.policy == AnswerPolicy::Strict {
            check_strict(&selections)?;
        }

        let judgments: [Judgment; CATEGORY_COUNT] = std::array::from_fn(|i| {
            let pair = &plan.sentence_order()[i];
            Judgment {
                position: (i + 1) as u8,
                sentence: pair.sentence.clone(),
                chosen: selections[i],
                correct: pair.category,
            }
        });

        tracing::debug!(
            session = %state.id,
            question = %plan.question_id(),
            answered = selections.iter().filter(|s| s.is_answered()).count(),
            "recorded judgments"
        );

        state.pages[question_index] = Some(question_id);
        state.responses.upsert(QuestionResponse {
            question_id: plan.question_id(),
            judgments,
        });
        Ok(())
    }
}

fn check_strict(selections: &[Selection; CATEGORY_COUNT]) -> Result<(), SessionError> {
    let unanswered: Vec<u8> = selections
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_answered())
        .map(|(i, _)| (i + 1) as u8)
        .collect();
    if !unanswered.is_empty() {
        return Err(SessionError::Unanswered(unanswered));
    }

    let mut seen: Vec<CategoryLabel> = Vec::with_capacity(CATEGORY_COUNT);
    for category in selections.iter().filter_map(|s| s.category()) {
        if seen.contains(&category) {
            return Err(SessionError::DuplicateChoice(category));
        }
        seen.push(category);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::question;
    use crate::randomizer::PresentationRandomizer;

    fn all_chosen(order: [CategoryLabel; CATEGORY_COUNT]) -> Vec<Selection> {
        order.into_iter().map(Selection::Chosen).collect()
    }

    #[test]
    fn start_rejects_blank_evaluator() {
        assert_eq!(
            SessionState::start("   ", 3).unwrap_err(),
            SessionError::EmptyEvaluatorId
        );
        let state = SessionState::start(" E1 ", 3).unwrap();
        assert_eq!(state.evaluator_id(), "E1");
        assert_eq!(state.phase(), SessionPhase::AnsweringQuestion(0));
        assert!(state.responses().is_empty());
    }

    #[test]
    fn advance_walks_to_complete() {
        let mut state = SessionState::start("E1", 2).unwrap();
        assert_eq!(state.advance().unwrap(), SessionPhase::AnsweringQuestion(1));
        assert!(state.completed_at().is_none());
        assert_eq!(state.advance().unwrap(), SessionPhase::Complete);
        assert!(state.completed_at().is_some());
        assert_eq!(state.advance().unwrap_err(), SessionError::AlreadyComplete);
        assert_eq!(state.back().unwrap_err(), SessionError::AlreadyComplete);
    }

    #[test]
    fn back_stops_at_first_question() {
        let mut state = SessionState::start("E1", 3).unwrap();
        assert_eq!(state.back().unwrap_err(), SessionError::AtFirstQuestion);
        state.advance().unwrap();
        assert_eq!(state.back().unwrap(), SessionPhase::AnsweringQuestion(0));
    }

    #[test]
    fn record_builds_judgments_in_display_order() {
        let q = question(5);
        let mut state = SessionState::start("E1", 1).unwrap();
        let mut randomizer = PresentationRandomizer::seeded(9);
        let plan = randomizer.plan_for(state.id(), 0, &q).clone();

        let selections = all_chosen(CategoryLabel::ALL);
        ResponseRecorder::default()
            .record(&mut state, 0, &plan, &selections)
            .unwrap();

        let response = state.responses().get(q.id()).unwrap();
        for (i, judgment) in response.judgments.iter().enumerate() {
            assert_eq!(judgment.position as usize, i + 1);
            assert_eq!(judgment.sentence, plan.sentence_order()[i].sentence);
            assert_eq!(judgment.correct, plan.sentence_order()[i].category);
            assert_eq!(judgment.chosen, selections[i]);
        }

        let mut correct: Vec<_> = response.judgments.iter().map(|j| j.correct).collect();
        correct.sort();
        assert_eq!(correct, CategoryLabel::ALL.to_vec());
    }

    #[test]
    fn record_overwrites_in_place() {
        let (q1, q2) = (question(1), question(2));
        let mut state = SessionState::start("E1", 2).unwrap();
        let recorder = ResponseRecorder::default();
        let p1 = PresentationPlan::canonical(&q1);
        let p2 = PresentationPlan::canonical(&q2);

        recorder
            .record(&mut state, 0, &p1, &[Selection::Unanswered; 8])
            .unwrap();
        state.advance().unwrap();
        recorder
            .record(&mut state, 1, &p2, &all_chosen(CategoryLabel::ALL))
            .unwrap();
        state.back().unwrap();
        recorder
            .record(&mut state, 0, &p1, &all_chosen(CategoryLabel::ALL))
            .unwrap();

        let ids: Vec<_> = state.responses().iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![q1.id(), q2.id()]);
        assert!(state.responses().get(q1.id()).unwrap().judgments[0].is_correct());
    }

    #[test]
    fn record_rejects_other_question_and_wrong_count() {
        let q = question(1);
        let plan = PresentationPlan::canonical(&q);
        let mut state = SessionState::start("E1", 2).unwrap();
        let recorder = ResponseRecorder::default();

        assert_eq!(
            recorder
                .record(&mut state, 1, &plan, &[Selection::Unanswered; 8])
                .unwrap_err(),
            SessionError::NotCurrentQuestion {
                current: 0,
                requested: 1
            }
        );
        assert_eq!(
            recorder
                .record(&mut state, 0, &plan, &[Selection::Unanswered; 7])
                .unwrap_err(),
            SessionError::SelectionCount {
                expected: 8,
                actual: 7
            }
        );
        assert!(state.responses().is_empty());
    }

    #[test]
    fn record_rejects_plan_for_another_question() {
        let (q1, q2) = (question(1), question(2));
        let recorder = ResponseRecorder::default();

        let mut state = SessionState::for_questions("E1", &[q1.id(), q2.id()]).unwrap();
        assert_eq!(
            recorder
                .record(&mut state, 0, &PresentationPlan::canonical(&q2), &[Selection::Unanswered; 8])
                .unwrap_err(),
            SessionError::WrongQuestion {
                index: 0,
                question: q2.id()
            }
        );
        assert!(state.responses().is_empty());

        // Without known ids, the first recording binds the page.
        let mut state = SessionState::start("E1", 2).unwrap();
        recorder
            .record(&mut state, 0, &PresentationPlan::canonical(&q1), &[Selection::Unanswered; 8])
            .unwrap();
        state.advance().unwrap();
        assert_eq!(
            recorder
                .record(&mut state, 1, &PresentationPlan::canonical(&q1), &[Selection::Unanswered; 8])
                .unwrap_err(),
            SessionError::WrongQuestion {
                index: 1,
                question: q1.id()
            }
        );
        state.back().unwrap();
        assert!(recorder
            .record(&mut state, 0, &PresentationPlan::canonical(&q2), &[Selection::Unanswered; 8])
            .is_err());
        assert_eq!(state.responses().len(), 1);
    }

    #[test]
    fn lenient_records_unanswered() {
        let q = question(1);
        let plan = PresentationPlan::canonical(&q);
        let mut state = SessionState::start("E1", 1).unwrap();
        ResponseRecorder::new(AnswerPolicy::Lenient)
            .record(&mut state, 0, &plan, &[Selection::Unanswered; 8])
            .unwrap();
        let response = state.responses().get(q.id()).unwrap();
        assert!(response
            .judgments
            .iter()
            .all(|j| j.chosen == Selection::Unanswered));
    }

    #[test]
    fn strict_rejects_unanswered_and_duplicates() {
        let q = question(1);
        let plan = PresentationPlan::canonical(&q);
        let mut state = SessionState::start("E1", 1).unwrap();
        let recorder = ResponseRecorder::new(AnswerPolicy::Strict);

        let mut selections = all_chosen(CategoryLabel::ALL);
        selections[2] = Selection::Unanswered;
        selections[6] = Selection::Unanswered;
        assert_eq!(
            recorder.record(&mut state, 0, &plan, &selections).unwrap_err(),
            SessionError::Unanswered(vec![3, 7])
        );

        let mut selections = all_chosen(CategoryLabel::ALL);
        selections[7] = Selection::Chosen(CategoryLabel::LowerElementary);
        assert_eq!(
            recorder.record(&mut state, 0, &plan, &selections).unwrap_err(),
            SessionError::DuplicateChoice(CategoryLabel::LowerElementary)
        );

        recorder
            .record(&mut state, 0, &plan, &all_chosen(CategoryLabel::ALL))
            .unwrap();
    }

    #[test]
    fn complete_session_rejects_recording() {
        let q = question(1);
        let plan = PresentationPlan::canonical(&q);
        let mut state = SessionState::start("E1", 1).unwrap();
        state.advance().unwrap();
        assert_eq!(
            ResponseRecorder::default()
                .record(&mut state, 0, &plan, &[Selection::Unanswered; 8])
                .unwrap_err(),
            SessionError::AlreadyComplete
        );
    }

    #[test]
    fn policy_parse() {
        assert_eq!("STRICT".parse::<AnswerPolicy>().unwrap(), AnswerPolicy::Strict);
        assert_eq!(AnswerPolicy::default().to_string(), "lenient");
        assert!("loose".parse::<AnswerPolicy>().is_err());
    }
}
