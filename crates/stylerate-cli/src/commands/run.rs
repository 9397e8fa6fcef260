//! The `stylerate run` command.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use stylerate_core::engine::{QuestionView, SurveyEngine, SurveyEngineConfig, SurveyView};
use stylerate_core::model::{CategoryLabel, ResultRow, Selection, CATEGORY_COUNT};
use stylerate_core::{AnswerPolicy, QuestionBank, SessionError, SessionId};
use stylerate_export::{ExportGateway, ExportReceipt};
use stylerate_sync::config::load_config_from;
use stylerate_sync::create_sync;

/// Line-oriented prompt over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

/// One parsed answer for a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Pick(Selection),
    Back,
}

/// What the evaluator did with a whole question.
enum Step {
    Submit([Selection; CATEGORY_COUNT]),
    Back,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `text` and read one trimmed line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn require(&mut self, text: &str) -> Result<String> {
        self.prompt(text)?
            .context("input ended before the survey was finished")
    }

    /// Start a session, asking for the evaluator ID until a usable one is given.
    fn start(&mut self, engine: &SurveyEngine, evaluator: Option<&str>) -> Result<SessionId> {
        if let Some(id) = evaluator {
            return Ok(engine.start_session(id)?);
        }
        loop {
            let id = self.require("Evaluator ID: ")?;
            match engine.start_session(&id) {
                Ok(session) => return Ok(session),
                Err(SessionError::EmptyEvaluatorId) => {
                    writeln!(self.output, "Evaluator ID must not be empty.")?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Walk a session from its current question to completion.
    pub fn survey(&mut self, engine: &SurveyEngine, session: SessionId) -> Result<()> {
        while let SurveyView::Question(view) = engine.view(session)? {
            match self.ask(&view)? {
                Step::Submit(selections) => match engine.advance(session, &selections) {
                    Ok(_) => {}
                    Err(e @ (SessionError::Unanswered(_) | SessionError::DuplicateChoice(_))) => {
                        writeln!(self.output, "{e}. Please answer this question again.")?;
                    }
                    Err(e) => return Err(e.into()),
                },
                Step::Back => match engine.back(session) {
                    Ok(_) => {}
                    Err(SessionError::AtFirstQuestion) => {
                        writeln!(self.output, "Already at the first question.")?;
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
        writeln!(self.output, "\nAll questions answered.")?;
        Ok(())
    }

    fn ask(&mut self, view: &QuestionView) -> Result<Step> {
        let sentences = view.plan.sentence_order();

        writeln!(
            self.output,
            "\nQuestion {}/{} (ID {})",
            view.index + 1,
            view.total,
            view.question_id
        )?;
        writeln!(self.output, "{}", view.prompt)?;
        for (i, pair) in sentences.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, pair.sentence)?;
        }

        let mut selections = [Selection::Unanswered; CATEGORY_COUNT];
        for (position, pair) in sentences.iter().enumerate() {
            writeln!(self.output, "\nSentence {}: {}", position + 1, pair.sentence)?;
            let options = view.plan.options_for(position, &selections);
            for (n, category) in options.iter().enumerate() {
                writeln!(self.output, "  {}) {}", n + 1, category)?;
            }

            loop {
                let line = self.require("Choice (number, blank = unanswered, b = back): ")?;
                match parse_answer(&line, &options) {
                    Some(Answer::Back) => return Ok(Step::Back),
                    Some(Answer::Pick(selection)) => {
                        selections[position] = selection;
                        break;
                    }
                    None => writeln!(
                        self.output,
                        "Enter a number from 1 to {}, leave blank, or b.",
                        options.len()
                    )?,
                }
            }
        }

        Ok(Step::Submit(selections))
    }
}

fn parse_answer(line: &str, options: &[CategoryLabel]) -> Option<Answer> {
    let line = line.trim();
    if line.is_empty() {
        return Some(Answer::Pick(Selection::Unanswered));
    }
    if line.eq_ignore_ascii_case("b") {
        return Some(Answer::Back);
    }
    let n: usize = line.parse().ok()?;
    options
        .get(n.checked_sub(1)?)
        .map(|&category| Answer::Pick(Selection::Chosen(category)))
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    questions: Option<PathBuf>,
    evaluator: Option<String>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    download: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_sync: bool,
    strict: bool,
    blind: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let questions = questions.or(config.questions.clone()).context(
        "no question bank given; pass --questions or set `questions` in stylerate.toml",
    )?;
    let bank = QuestionBank::load(&questions)?;

    let engine = SurveyEngine::new(
        Arc::new(bank),
        SurveyEngineConfig {
            policy: if strict {
                AnswerPolicy::Strict
            } else {
                config.policy
            },
            seed: seed.or(config.seed),
        },
    );

    let mut options = config.export;
    if blind {
        options.include_ground_truth = false;
    }
    let mut gateway = ExportGateway::new(output.unwrap_or(config.output_dir.clone()), options);
    match (&config.sync, no_sync) {
        (Some(sync), false) => gateway = gateway.with_remote(create_sync(sync)?),
        (Some(_), true) => tracing::info!("remote sync disabled by --no-sync"),
        (None, _) => {}
    }

    let session = {
        let mut console = Console::new(io::stdin().lock(), io::stdout().lock());
        let session = console.start(&engine, evaluator.as_deref())?;
        console.survey(&engine, session)?;
        session
    };

    let rows = engine.results(session)?;
    let state = engine.snapshot(session)?;
    engine.end_session(session);

    print_results(&rows, options.include_ground_truth);

    let completed_at = state.completed_at().unwrap_or_else(Utc::now);
    let receipt = gateway
        .deliver(state.evaluator_id(), &rows, completed_at)
        .await?;
    report_receipt(&receipt, download.as_deref())
}

fn print_results(rows: &[ResultRow], include_ground_truth: bool) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    let mut header = vec!["Question", "#", "Sentence", "Chosen"];
    if include_ground_truth {
        header.push("Correct");
    }
    table.set_header(header);

    for row in rows {
        let mut cells = vec![
            Cell::new(row.question_id),
            Cell::new(row.sentence_position),
            Cell::new(&row.sentence_text),
            Cell::new(row.chosen_category),
        ];
        if include_ground_truth {
            cells.push(Cell::new(row.correct_category));
        }
        table.add_row(cells);
    }

    println!("\n{table}");
}

fn report_receipt(receipt: &ExportReceipt, download_dir: Option<&Path>) -> Result<()> {
    match &receipt.local {
        Ok(path) => println!("Results saved to: {}", path.display()),
        Err(e) => eprintln!("Warning: could not save results locally: {e}"),
    }

    let artifact = &receipt.download;
    match download_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(&artifact.filename);
            std::fs::write(&path, &artifact.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Download copy: {}", path.display());
        }
        None => println!(
            "Download copy: {} ({} bytes, {})",
            artifact.filename,
            artifact.bytes.len(),
            artifact.mime
        ),
    }

    match &receipt.remote {
        Some(outcome) if outcome.is_success() => println!("Remote sync: {outcome}"),
        Some(outcome) => eprintln!("Warning: remote sync failed: {outcome}"),
        None => {}
    }

    Ok(())
}
