//! The `stylerate validate` command.

use std::path::PathBuf;

use anyhow::Result;

use stylerate_core::bank::{validate_bank, QuestionBank};

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let bank = QuestionBank::load(&questions_path)?;
    println!(
        "Question bank: {} ({} questions)",
        questions_path.display(),
        bank.len()
    );

    let warnings = validate_bank(&bank);
    for w in &warnings {
        let prefix = w
            .question_id
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Question bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
