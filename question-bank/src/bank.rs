use std::path::PathBuf;

use common::{error::AppError, utils::config::AppConfig};
use tracing::{debug, error, warn};

use crate::{
    diagnostics::Degradation,
    manifest::{IndexOptions, ManifestIndex},
    parser::{ParseOutcome, QuestionBlockParser},
    question::{Question, QuestionKind},
};

#[derive(Debug, Clone)]
pub struct BankOptions {
    /// Manifest file paths are resolved relative to this directory.
    pub data_root: PathBuf,
    pub fallback_encoding: String,
}

impl BankOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            data_root: PathBuf::from(&config.data_root),
            fallback_encoding: config.fallback_encoding.clone(),
        }
    }
}

impl Default for BankOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Query surface over a loaded [`ManifestIndex`].
///
/// Question files are re-read on every call; nothing parsed is cached.
#[derive(Debug)]
pub struct QuestionBank {
    index: ManifestIndex,
    options: BankOptions,
}

impl QuestionBank {
    pub fn new(index: ManifestIndex, options: BankOptions) -> Self {
        Self { index, options }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let index = ManifestIndex::load(
            config.master_manifest_path(),
            &config.manifests_dir,
            IndexOptions::from_config(config),
        );
        Self::new(index, BankOptions::from_config(config))
    }

    pub fn index(&self) -> &ManifestIndex {
        &self.index
    }

    pub fn options(&self) -> &BankOptions {
        &self.options
    }

    pub fn load_questions(&self, question_type: &str, subject: &str, lesson: &str) -> Vec<Question> {
        self.load_questions_with_report(question_type, subject, lesson)
            .questions
    }

    /// Like [`QuestionBank::load_questions`], also returning what degraded along the way.
    pub fn load_questions_with_report(
        &self,
        question_type: &str,
        subject: &str,
        lesson: &str,
    ) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let kind = match question_type.parse::<QuestionKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!(question_type, error = %err, "Cannot load questions of unknown type");
                outcome.diagnostics.record(Degradation::UnknownQuestionType);
                return outcome;
            }
        };

        let Some(relative) = self.index.resolve_path(kind.as_str(), subject, lesson) else {
            outcome.diagnostics.record(Degradation::EntryNotFound);
            return outcome;
        };

        let path = self.options.data_root.join(relative);
        match QuestionBlockParser::new(kind).parse_file(&path, &self.options.fallback_encoding) {
            Ok(parsed) => {
                debug!(
                    path = %path.display(),
                    questions = parsed.questions.len(),
                    degraded = parsed.diagnostics.total(),
                    "Parsed question file"
                );
                parsed
            }
            Err(err) => {
                let degradation = match &err {
                    err if err.is_not_found() => Degradation::FileNotFound,
                    AppError::Decode(_) => Degradation::DecodeFailure,
                    _ => Degradation::ReadFailure,
                };
                if degradation == Degradation::FileNotFound {
                    warn!(path = %path.display(), "Question file not found");
                } else {
                    error!(path = %path.display(), error = %err, "Failed to read question file");
                }
                outcome.diagnostics.record(degradation);
                outcome
            }
        }
    }
}
