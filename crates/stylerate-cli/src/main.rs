//! stylerate CLI: terminal front end for the age-rating survey.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "stylerate",
    version,
    about = "Linguistic age-rating survey for human evaluators"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the survey interactively and export the results
    Run {
        /// Question bank CSV (overrides `questions` in the config)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Evaluator ID (prompted for when omitted)
        #[arg(long)]
        evaluator: Option<String>,

        /// Fixed shuffle seed for reproducible layouts
        #[arg(long)]
        seed: Option<u64>,

        /// Results directory (overrides `output_dir` in the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also save the download copy into this directory
        #[arg(long)]
        download: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip remote sync even when an endpoint is configured
        #[arg(long)]
        no_sync: bool,

        /// Require every sentence to get a distinct category
        #[arg(long)]
        strict: bool,

        /// Leave the correct category out of the export
        #[arg(long)]
        blind: bool,
    },

    /// Check a question bank CSV
    Validate {
        /// Path to the question bank
        #[arg(long)]
        questions: PathBuf,
    },

    /// Create a starter config and sample question bank
    Init,
}

fn default_directive() -> Directive {
    "stylerate=info"
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            questions,
            evaluator,
            seed,
            output,
            download,
            config,
            no_sync,
            strict,
            blind,
        } => {
            commands::run::execute(
                questions, evaluator, seed, output, download, config, no_sync, strict, blind,
            )
            .await
        }
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
