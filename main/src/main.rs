use std::{fs, path::Path};

use common::utils::config::{get_config, AppConfig};
use question_bank::QuestionBank;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;
    ensure_directories(&config)?;

    // The index is loaded once and only read from here on
    let bank = QuestionBank::from_config(&config);
    log_catalog(&bank);

    // Optional one-shot query: <question_type> <subject> <lesson>
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [question_type, subject, lesson] = args.as_slice() {
        let outcome = bank.load_questions_with_report(question_type, subject, lesson);
        if !outcome.diagnostics.is_clean() {
            warn!(diagnostics = ?outcome.diagnostics, "Question load degraded");
        }
        println!("{}", serde_json::to_string_pretty(&outcome.questions)?);
    } else if !args.is_empty() {
        warn!("Expected arguments: <question_type> <subject> <lesson>");
    }

    Ok(())
}

fn ensure_directories(config: &AppConfig) -> std::io::Result<()> {
    for dir in [&config.manifests_dir, &config.data_root] {
        if !Path::new(dir).exists() {
            info!(path = %dir, "Creating missing directory");
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

fn log_catalog(bank: &QuestionBank) {
    let index = bank.index();

    for question_type in index.enabled_question_types() {
        let subjects = index.list_subjects(Some(question_type));
        let lessons: usize = subjects
            .iter()
            .map(|subject| index.list_lessons(question_type, subject).len())
            .sum();
        info!(
            question_type,
            entries = index.entries(question_type).len(),
            subjects = subjects.len(),
            lessons,
            "Question type ready"
        );
    }

    let diagnostics = index.diagnostics();
    if diagnostics.is_clean() {
        info!(
            subjects = index.unified_subjects().len(),
            templates = index.worksheet_templates().len(),
            "Manifest index loaded"
        );
    } else {
        warn!(
            degraded = diagnostics.total(),
            diagnostics = ?diagnostics,
            "Manifest index loaded with degradations"
        );
    }
}
