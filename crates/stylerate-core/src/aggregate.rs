//! Flattening of recorded responses into exportable rows.

use crate::error::IncompleteSessionError;
use crate::model::ResultRow;
use crate::session::SessionState;

/// One row per judgment: questions in the order they were recorded, and
/// within each question in display-position order.
///
/// A session with nothing recorded is reported as an error rather than
/// producing an empty table.
pub fn flatten(state: &SessionState) -> Result<Vec<ResultRow>, IncompleteSessionError> {
    let responses = state.responses();
    if responses.is_empty() {
        return Err(IncompleteSessionError {
            evaluator_id: state.evaluator_id().to_string(),
        });
    }

    let rows = responses
        .iter()
        .flat_map(|response| {
            response.judgments.iter().map(move |j| ResultRow {
                evaluator_id: state.evaluator_id().to_string(),
                question_id: response.question_id,
                sentence_position: j.position,
                sentence_text: j.sentence.clone(),
                chosen_category: j.chosen,
                correct_category: j.correct,
            })
        })
        .collect();

    Ok(rows)
}
