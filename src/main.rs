mod config;
mod error;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};

use crate::config::ScorerConfig;
use crate::error::ScoreError;
use crate::pipeline::stage1_prepare::prepare_record;
use crate::pipeline::stage2_model::{load_or_train, train_and_persist};
use crate::pipeline::stage3_score::score;
use crate::report::json::{render_error_json, render_scoring_json, render_training_json};
use crate::report::text::render_length_explanation;

/// Scores identity-verification records with a random forest and explains
/// each decision with per-feature SHAP values.
#[derive(Parser, Debug)]
#[command(name = "verif-scorer", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    score: ScoreArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Score one record (the default when no subcommand is given)
    Score(ScoreArgs),
    /// Train from the corpus and persist the model, replacing any existing one
    Train(PathArgs),
    /// Length-based placeholder confidence for a piece of text
    ExplainText {
        /// Text to rate; empty or absent means nothing was detected
        text: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
struct ScoreArgs {
    /// JSON object with similarityScore, liveness, tipoDocumentoDetectado,
    /// OCR_match and edad_valida; missing fields take defaults
    record: Option<String>,

    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
struct PathArgs {
    /// Persisted model blob
    #[arg(long)]
    model: Option<PathBuf>,

    /// Training corpus (CSV, optionally .gz), read only when training
    #[arg(long)]
    corpus: Option<PathBuf>,
}

fn main() {
    logging::init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => fail(ScoreError::MalformedInput(err.to_string().trim().to_string())),
    };

    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(err) => fail(err),
    }
}

fn fail(err: ScoreError) -> ! {
    tracing::error!("{err}");
    println!("{}", render_error_json(&err));
    std::process::exit(1);
}

fn run(cli: Cli) -> Result<String, ScoreError> {
    match resolve_command(cli) {
        Command::Score(args) => {
            let config = build_config(&args.paths);
            let record = prepare_record(args.record.as_deref())?;
            let ctx = load_or_train(&config)?;
            let result = score(&ctx, &record)?;
            render_scoring_json(&result)
        }
        Command::Train(paths) => {
            let config = build_config(&paths);
            let (_ctx, summary) = train_and_persist(&config)?;
            render_training_json(&config.model_path, &summary)
        }
        Command::ExplainText { text } => {
            Ok(render_length_explanation(text.as_deref().unwrap_or("")))
        }
    }
}

fn resolve_command(cli: Cli) -> Command {
    cli.command.unwrap_or(Command::Score(cli.score))
}

fn build_config(paths: &PathArgs) -> ScorerConfig {
    ScorerConfig::default_v1().with_paths(paths.model.clone(), paths.corpus.clone())
}

#[cfg(test)]
#[path = "../tests/src_inline/testutil.rs"]
mod testutil;

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
