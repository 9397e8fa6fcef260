//! CSV encoding of result rows and export file naming.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use stylerate_core::model::{QuestionId, ResultRow, Selection};

use crate::error::ExportError;

/// UTF-8 byte order mark, so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Knobs for the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Prefix the file with a UTF-8 BOM.
    pub bom: bool,
    /// Keep the `correctCategory` column. Off for blind exports.
    pub include_ground_truth: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bom: true,
            include_ground_truth: true,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlindRow<'a> {
    evaluator_id: &'a str,
    question_id: QuestionId,
    sentence_position: u8,
    sentence_text: &'a str,
    chosen_category: Selection,
}

impl<'a> From<&'a ResultRow> for BlindRow<'a> {
    fn from(row: &'a ResultRow) -> Self {
        Self {
            evaluator_id: &row.evaluator_id,
            question_id: row.question_id,
            sentence_position: row.sentence_position,
            sentence_text: &row.sentence_text,
            chosen_category: row.chosen_category,
        }
    }
}

/// Encode rows as CSV with a header line.
pub fn encode_rows(rows: &[ResultRow], options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoRows);
    }

    let mut buf = Vec::new();
    if options.bom {
        buf.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::Writer::from_writer(buf);
    for row in rows {
        if options.include_ground_truth {
            writer.serialize(row)?;
        } else {
            writer.serialize(BlindRow::from(row))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.into_error()))
}

/// Replace anything that is not a letter, digit, `-` or `_`.
fn sanitize(evaluator_id: &str) -> String {
    evaluator_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `evaluation_{evaluator}_{YYYYmmdd_HHMMSS}.csv`, stamped in local time.
pub fn local_filename(evaluator_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "evaluation_{}_{}.csv",
        sanitize(evaluator_id),
        at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
    )
}

/// Name offered for the downloaded copy.
pub fn download_filename(evaluator_id: &str) -> String {
    format!("評価結果_{}.csv", sanitize(evaluator_id))
}
