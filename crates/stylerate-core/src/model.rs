//! Core data model types for stylerate.
//!
//! These are the fundamental types the rest of the workspace uses to
//! represent questions, category labels, judgments, and exported rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;

/// Number of category labels, and so of sentences per question.
pub const CATEGORY_COUNT: usize = 8;

/// Text written for a sentence the evaluator left unanswered.
pub const UNANSWERED: &str = "unanswered";

/// One of the eight fixed age bands an evaluator can assign a sentence to.
///
/// The variant order is the canonical order used whenever nothing has been
/// shuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryLabel {
    LowerElementary,
    UpperElementary,
    JuniorHigh,
    SeniorHigh,
    YoungAdult,
    MidCareerAdult,
    MatureAdult,
    Elderly,
}

impl CategoryLabel {
    /// All labels in canonical order.
    pub const ALL: [CategoryLabel; CATEGORY_COUNT] = [
        CategoryLabel::LowerElementary,
        CategoryLabel::UpperElementary,
        CategoryLabel::JuniorHigh,
        CategoryLabel::SeniorHigh,
        CategoryLabel::YoungAdult,
        CategoryLabel::MidCareerAdult,
        CategoryLabel::MatureAdult,
        CategoryLabel::Elderly,
    ];

    /// Display label, also used as the column header in question files.
    pub fn label(self) -> &'static str {
        match self {
            CategoryLabel::LowerElementary => "小学校低学年（6–8歳）",
            CategoryLabel::UpperElementary => "小学校高学年（9–12歳）",
            CategoryLabel::JuniorHigh => "中学生（13–15歳）",
            CategoryLabel::SeniorHigh => "高校生（16–18歳）",
            CategoryLabel::YoungAdult => "若年成人（19–29歳）",
            CategoryLabel::MidCareerAdult => "中堅社会人（30–44歳）",
            CategoryLabel::MatureAdult => "壮年層（45–64歳）",
            CategoryLabel::Elderly => "高齢者（65歳以上）",
        }
    }

    /// ASCII identifier accepted anywhere a label is.
    pub fn slug(self) -> &'static str {
        match self {
            CategoryLabel::LowerElementary => "lower-elementary",
            CategoryLabel::UpperElementary => "upper-elementary",
            CategoryLabel::JuniorHigh => "junior-high",
            CategoryLabel::SeniorHigh => "senior-high",
            CategoryLabel::YoungAdult => "young-adult",
            CategoryLabel::MidCareerAdult => "mid-career-adult",
            CategoryLabel::MatureAdult => "mature-adult",
            CategoryLabel::Elderly => "elderly",
        }
    }

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CategoryLabel::ALL
            .into_iter()
            .find(|c| c.label() == s || c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

impl TryFrom<String> for CategoryLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryLabel> for String {
    fn from(value: CategoryLabel) -> Self {
        value.label().to_string()
    }
}

/// Stable identifier of a question in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sentence together with the category it was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub category: CategoryLabel,
    pub sentence: String,
}

/// A survey question: a prompt and one exemplar sentence per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    /// Held in canonical category order.
    pairs: [SentencePair; CATEGORY_COUNT],
}

impl Question {
    /// Build a question, checking that every category appears exactly once.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        pairs: Vec<SentencePair>,
    ) -> Result<Self, LoadError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(LoadError::MissingPrompt { question: id });
        }

        let mut slots: [Option<SentencePair>; CATEGORY_COUNT] = Default::default();
        for pair in pairs {
            if pair.sentence.trim().is_empty() {
                return Err(LoadError::MissingSentence {
                    question: id,
                    category: pair.category,
                });
            }
            let slot = &mut slots[pair.category.index()];
            if slot.is_some() {
                return Err(LoadError::DuplicateCategory {
                    question: id,
                    category: pair.category,
                });
            }
            *slot = Some(pair);
        }

        let mut ordered = Vec::with_capacity(CATEGORY_COUNT);
        for (category, slot) in CategoryLabel::ALL.into_iter().zip(slots) {
            match slot {
                Some(pair) => ordered.push(pair),
                None => {
                    return Err(LoadError::MissingSentence {
                        question: id,
                        category,
                    })
                }
            }
        }
        let pairs = ordered
            .try_into()
            .map_err(|_| LoadError::Malformed(format!("question {id} has the wrong pair count")))?;

        Ok(Self { id, prompt, pairs })
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Pairs in canonical category order.
    pub fn pairs(&self) -> &[SentencePair; CATEGORY_COUNT] {
        &self.pairs
    }

    /// The exemplar sentence written for `category`.
    pub fn sentence_for(&self, category: CategoryLabel) -> &str {
        &self.pairs[category.index()].sentence
    }
}

/// What the evaluator picked for one displayed sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selection {
    Chosen(CategoryLabel),
    Unanswered,
}

impl Selection {
    pub fn category(self) -> Option<CategoryLabel> {
        match self {
            Selection::Chosen(c) => Some(c),
            Selection::Unanswered => None,
        }
    }

    pub fn is_answered(self) -> bool {
        matches!(self, Selection::Chosen(_))
    }
}

impl From<CategoryLabel> for Selection {
    fn from(value: CategoryLabel) -> Self {
        Selection::Chosen(value)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Chosen(c) => f.write_str(c.label()),
            Selection::Unanswered => f.write_str(UNANSWERED),
        }
    }
}

impl TryFrom<String> for Selection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim() == UNANSWERED {
            Ok(Selection::Unanswered)
        } else {
            value.parse().map(Selection::Chosen)
        }
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        value.to_string()
    }
}

/// One evaluator's assignment for one displayed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    /// 1-based display position.
    pub position: u8,
    pub sentence: String,
    pub chosen: Selection,
    pub correct: CategoryLabel,
}

impl Judgment {
    pub fn is_correct(&self) -> bool {
        self.chosen == Selection::Chosen(self.correct)
    }
}

/// A flattened, exportable record of a single judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub evaluator_id: String,
    pub question_id: QuestionId,
    pub sentence_position: u8,
    pub sentence_text: String,
    pub chosen_category: Selection,
    pub correct_category: CategoryLabel,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display_and_parse() {
        assert_eq!(CategoryLabel::JuniorHigh.to_string(), "中学生（13–15歳）");
        assert_eq!(
            "中学生（13–15歳）".parse::<CategoryLabel>().unwrap(),
            CategoryLabel::JuniorHigh
        );
        assert_eq!(
            "Mid-Career-Adult".parse::<CategoryLabel>().unwrap(),
            CategoryLabel::MidCareerAdult
        );
        assert!("toddler".parse::<CategoryLabel>().is_err());
    }

    #[test]
    fn canonical_order_matches_index() {
        for (i, c) in CategoryLabel::ALL.into_iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn question_orders_pairs_canonically() {
        let mut pairs: Vec<SentencePair> = CategoryLabel::ALL
            .into_iter()
            .map(|category| SentencePair {
                category,
                sentence: category.slug().to_string(),
            })
            .collect();
        pairs.reverse();

        let q = Question::new(QuestionId(3), "Which age?", pairs).unwrap();
        let order: Vec<_> = q.pairs().iter().map(|p| p.category).collect();
        assert_eq!(order, CategoryLabel::ALL.to_vec());
        assert_eq!(q.sentence_for(CategoryLabel::Elderly), "elderly");
    }

    #[test]
    fn question_rejects_missing_category() {
        let pairs = CategoryLabel::ALL[..7]
            .iter()
            .map(|&category| SentencePair {
                category,
                sentence: "x".into(),
            })
            .collect();
        let err = Question::new(QuestionId(1), "p", pairs).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingSentence {
                category: CategoryLabel::Elderly,
                ..
            }
        ));
    }

    #[test]
    fn question_rejects_repeated_category() {
        let mut pairs: Vec<SentencePair> = CategoryLabel::ALL
            .into_iter()
            .map(|category| SentencePair {
                category,
                sentence: "x".into(),
            })
            .collect();
        pairs[7].category = CategoryLabel::YoungAdult;
        let err = Question::new(QuestionId(1), "p", pairs).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateCategory { .. }));
    }

    #[test]
    fn selection_serde_uses_labels() {
        let json = serde_json::to_string(&Selection::Chosen(CategoryLabel::Elderly)).unwrap();
        assert_eq!(json, "\"高齢者（65歳以上）\"");
        let back: Selection = serde_json::from_str("\"unanswered\"").unwrap();
        assert_eq!(back, Selection::Unanswered);
    }

    #[test]
    fn result_row_uses_camel_case_fields() {
        let row = ResultRow {
            evaluator_id: "E1".into(),
            question_id: QuestionId(1),
            sentence_position: 1,
            sentence_text: "hello".into(),
            chosen_category: Selection::Unanswered,
            correct_category: CategoryLabel::SeniorHigh,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["evaluatorId"], "E1");
        assert_eq!(value["questionId"], 1);
        assert_eq!(value["chosenCategory"], "unanswered");
    }
}
