//! Randomized, cached presentation of questions.
//!
//! Each (session, question index) gets one shuffled sentence order and one
//! independently shuffled menu order. Both are drawn on the first visit and
//! reused on every later render of that question in that session.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::model::{CategoryLabel, Question, QuestionId, Selection, SentencePair, CATEGORY_COUNT};
use crate::session::SessionId;

/// The fixed layout shown for one question within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationPlan {
    question_id: QuestionId,
    sentence_order: [SentencePair; CATEGORY_COUNT],
    option_order: [CategoryLabel; CATEGORY_COUNT],
}

impl PresentationPlan {
    /// Shuffle a question's pairs and, separately, the category menu.
    pub fn draw<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Self {
        let mut sentence_order = question.pairs().clone();
        sentence_order.shuffle(rng);
        let mut option_order = CategoryLabel::ALL;
        option_order.shuffle(rng);
        Self {
            question_id: question.id(),
            sentence_order,
            option_order,
        }
    }

    /// The unshuffled layout: pairs and menu both in canonical order.
    pub fn canonical(question: &Question) -> Self {
        Self {
            question_id: question.id(),
            sentence_order: question.pairs().clone(),
            option_order: CategoryLabel::ALL,
        }
    }

    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// Pairs in display order.
    pub fn sentence_order(&self) -> &[SentencePair; CATEGORY_COUNT] {
        &self.sentence_order
    }

    /// Category menu order.
    pub fn option_order(&self) -> &[CategoryLabel; CATEGORY_COUNT] {
        &self.option_order
    }

    /// Menu for the sentence at `position` (0-based), leaving out categories
    /// already chosen at earlier positions.
    pub fn options_for(&self, position: usize, selections: &[Selection]) -> Vec<CategoryLabel> {
        let taken: Vec<CategoryLabel> = selections
            .iter()
            .take(position)
            .filter_map(|s| s.category())
            .collect();
        self.option_order
            .iter()
            .copied()
            .filter(|c| !taken.contains(c))
            .collect()
    }
}

/// Key of a cached plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub session: SessionId,
    pub question_index: usize,
}

/// Draws presentation plans from an injected random source and caches them
/// per (session, question index).
pub struct PresentationRandomizer<R = StdRng> {
    rng: R,
    plans: HashMap<PlanKey, PresentationPlan>,
}

impl PresentationRandomizer<StdRng> {
    /// Reproducible plans for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Plans seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> PresentationRandomizer<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            plans: HashMap::new(),
        }
    }

    /// Get the plan for `(session, question_index)`, drawing it on first use.
    pub fn plan_for(
        &mut self,
        session: SessionId,
        question_index: usize,
        question: &Question,
    ) -> &PresentationPlan {
        let key = PlanKey {
            session,
            question_index,
        };
        let rng = &mut self.rng;
        self.plans.entry(key).or_insert_with(|| {
            tracing::debug!(%session, question_index, "drawing presentation plan");
            PresentationPlan::draw(question, rng)
        })
    }

    /// The cached plan, without drawing one.
    pub fn cached(&self, session: SessionId, question_index: usize) -> Option<&PresentationPlan> {
        self.plans.get(&PlanKey {
            session,
            question_index,
        })
    }

    /// Drop every plan belonging to `session`.
    pub fn forget_session(&mut self, session: SessionId) {
        self.plans.retain(|key, _| key.session != session);
    }

    /// Number of cached plans across all sessions.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }
}
