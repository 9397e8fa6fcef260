//! Question bank loading and validation.
//!
//! Loads the read-only question table from CSV, one row per question, with a
//! column per category holding that category's exemplar sentence.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::model::{CategoryLabel, Question, QuestionId, SentencePair, CATEGORY_COUNT};

const ID_COLUMNS: &[&str] = &["questionId", "question_id", "質問ID"];
const PROMPT_COLUMNS: &[&str] = &["prompt", "質問文"];

/// Immutable, ordered table of survey questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Load a question bank from a CSV file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = Self::from_reader(file)?;
        tracing::info!(
            "loaded {} questions from {}",
            bank.len(),
            path.display()
        );
        Ok(bank)
    }

    /// Parse a question bank from any CSV reader (useful for testing).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let layout = ColumnLayout::resolve(&headers)?;

        let mut questions = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record?;
            // Header is row 1.
            let row = i + 2;
            let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

            let raw_id = cell(layout.id);
            let id = raw_id
                .parse::<u32>()
                .map(QuestionId)
                .map_err(|_| LoadError::InvalidQuestionId {
                    row,
                    value: raw_id.to_string(),
                })?;

            let pairs = CategoryLabel::ALL
                .into_iter()
                .zip(layout.categories)
                .map(|(category, idx)| SentencePair {
                    category,
                    sentence: cell(idx).to_string(),
                })
                .collect();

            questions.push(Question::new(id, cell(layout.prompt), pairs)?);
        }

        Self::from_questions(questions)
    }

    /// Build a bank from already-constructed questions.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, LoadError> {
        if questions.is_empty() {
            return Err(LoadError::Empty);
        }
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(LoadError::DuplicateQuestionId(q.id()));
            }
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question shown at `index` (0-based page).
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl<'a> IntoIterator for &'a QuestionBank {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

/// Column indices resolved from the header row.
struct ColumnLayout {
    id: usize,
    prompt: usize,
    /// Indexed by canonical category order.
    categories: [usize; CATEGORY_COUNT],
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> Result<Self, LoadError> {
        let id = find_column(headers, ID_COLUMNS)
            .ok_or_else(|| LoadError::MissingColumn(ID_COLUMNS[0].into()))?;
        let prompt = find_column(headers, PROMPT_COLUMNS)
            .ok_or_else(|| LoadError::MissingColumn(PROMPT_COLUMNS[0].into()))?;

        let mut categories = [0usize; CATEGORY_COUNT];
        for category in CategoryLabel::ALL {
            categories[category.index()] = headers
                .iter()
                .position(|h| h.as_str() == category.label() || h.eq_ignore_ascii_case(category.slug()))
                .ok_or_else(|| LoadError::MissingColumn(category.label().into()))?;
        }

        Ok(Self {
            id,
            prompt,
            categories,
        })
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| *n == h.as_str()))
}

/// A non-fatal issue found in a loaded bank.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question concerned (if applicable).
    pub question_id: Option<QuestionId>,
    /// Warning message.
    pub message: String,
}

/// Check a loaded bank for issues that do not prevent a survey from running.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Ids are expected to ascend with row order
    for pair in bank.questions().windows(2) {
        if pair[1].id() < pair[0].id() {
            warnings.push(ValidationWarning {
                question_id: Some(pair[1].id()),
                message: format!(
                    "question id {} follows {}; ids are not in ascending order",
                    pair[1].id(),
                    pair[0].id()
                ),
            });
        }
    }

    for q in bank {
        let mut seen = HashSet::new();
        for pair in q.pairs() {
            if !seen.insert(pair.sentence.as_str()) {
                warnings.push(ValidationWarning {
                    question_id: Some(q.id()),
                    message: format!(
                        "sentence for {} duplicates another sentence in this question",
                        pair.category
                    ),
                });
            }
        }
    }

    let mut prompts = HashSet::new();
    for q in bank {
        if !prompts.insert(q.prompt()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id()),
                message: "prompt repeats an earlier question's prompt".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const SAMPLE_CSV: &str = "\
質問ID,質問文,小学校低学年（6–8歳）,小学校高学年（9–12歳）,中学生（13–15歳）,高校生（16–18歳）,若年成人（19–29歳）,中堅社会人（30–44歳）,壮年層（45–64歳）,高齢者（65歳以上）
1,Describe the weather,It is sunny!,The sky is clear today.,Pretty nice out I guess.,Weather's decent.,Great day for a run.,Clear skies for the commute.,A pleasant mild morning.,Fine weather we're having.
2,Talk about lunch,I ate a big apple!,I had curry for lunch.,Lunch was okay.,Grabbed a sandwich.,Tried a new ramen place.,Quick bento at my desk.,A light meal of soba.,Rice porridge suits me.
";

    #[test]
    fn parse_sample_bank() {
        let bank = QuestionBank::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(bank.len(), 2);
        let q = bank.get(0).unwrap();
        assert_eq!(q.id(), QuestionId(1));
        assert_eq!(q.prompt(), "Describe the weather");
        assert_eq!(q.sentence_for(CategoryLabel::LowerElementary), "It is sunny!");
        assert_eq!(
            q.sentence_for(CategoryLabel::Elderly),
            "Fine weather we're having."
        );
        assert!(bank.get(2).is_none());
    }

    #[test]
    fn parse_slug_headers_and_bom() {
        let csv = "\u{feff}questionId, prompt ,elderly,mature-adult,mid-career-adult,young-adult,senior-high,junior-high,upper-elementary,lower-elementary
7,P,h,g,f,e,d,c,b,a
";
        let bank = QuestionBank::from_reader(csv.as_bytes()).unwrap();
        let q = bank.get(0).unwrap();
        assert_eq!(q.id(), QuestionId(7));
        assert_eq!(q.sentence_for(CategoryLabel::LowerElementary), "a");
        assert_eq!(q.sentence_for(CategoryLabel::Elderly), "h");
    }

    #[test]
    fn missing_category_column_fails() {
        let csv = "questionId,prompt,lower-elementary\n1,P,a\n";
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(_)));
    }

    #[test]
    fn missing_prompt_column_fails() {
        let csv = "questionId,lower-elementary\n1,a\n";
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn empty_sentence_cell_fails() {
        let csv = SAMPLE_CSV.replace("Rice porridge suits me.", "");
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingSentence {
                question: QuestionId(2),
                category: CategoryLabel::Elderly
            }
        ));
    }

    #[test]
    fn empty_prompt_fails() {
        let csv = SAMPLE_CSV.replace("Talk about lunch", " ");
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingPrompt { .. }));
    }

    #[test]
    fn invalid_question_id_fails() {
        let csv = SAMPLE_CSV.replace("\n2,", "\nabc,");
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidQuestionId { row: 3, .. }));
    }

    #[test]
    fn duplicate_question_id_fails() {
        let csv = SAMPLE_CSV.replace("\n2,", "\n1,");
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateQuestionId(QuestionId(1))));
    }

    #[test]
    fn header_only_fails() {
        let header = SAMPLE_CSV.lines().next().unwrap();
        let err = QuestionBank::from_reader(header.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn ragged_row_fails() {
        let csv = format!("{}3,only two\n", SAMPLE_CSV);
        let err = QuestionBank::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn missing_file_fails() {
        let err = QuestionBank::load(Path::new("/nonexistent/questions.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let bank = QuestionBank::load(&path).unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn validate_clean_bank() {
        let bank = QuestionBank::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn validate_flags_order_and_duplicates() {
        let csv = SAMPLE_CSV
            .replace("\n2,Talk about lunch", "\n0,Describe the weather")
            .replace("Lunch was okay.", "I had curry for lunch.");
        let bank = QuestionBank::from_reader(csv.as_bytes()).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("ascending")));
        assert!(warnings.iter().any(|w| w.message.contains("duplicates")));
        assert!(warnings.iter().any(|w| w.message.contains("prompt repeats")));
    }
}
