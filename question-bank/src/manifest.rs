use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::Path,
};

use common::{
    error::AppError,
    utils::config::{AppConfig, PathRewrite},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{
    diagnostics::{Degradation, Diagnostics},
    normalize::NameNormalizer,
};

/// One row of an individual manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTypeConfig {
    #[serde(default)]
    pub manifest_file: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Named worksheet layout: how many questions of each type, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorksheetTemplate {
    pub name: String,
    pub sections: Vec<(String, u32)>,
}

#[derive(Debug, Default, Deserialize)]
struct MasterManifest {
    #[serde(default)]
    question_types: Map<String, Value>,
    #[serde(default)]
    subjects: Vec<String>,
    #[serde(default)]
    worksheet_templates: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub normalizer: NameNormalizer,
    pub path_rewrites: Vec<PathRewrite>,
}

impl IndexOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            normalizer: NameNormalizer::with_aliases(&config.name_aliases),
            path_rewrites: config.path_rewrites.clone(),
        }
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Master manifest plus one individual manifest per enabled question type.
///
/// Built once and read-only afterwards, so it can be shared between threads
/// without locking.
#[derive(Debug, Default)]
pub struct ManifestIndex {
    question_types: Vec<(String, QuestionTypeConfig)>,
    subjects: Vec<String>,
    worksheet_templates: Vec<WorksheetTemplate>,
    manifests: HashMap<String, Vec<(String, ManifestEntry)>>,
    normalizer: NameNormalizer,
    path_rewrites: Vec<PathRewrite>,
    diagnostics: Diagnostics,
}

impl ManifestIndex {
    /// Loads the master manifest and every enabled individual manifest.
    ///
    /// Never fails: missing or corrupt files leave that part of the index empty
    /// and are recorded in [`ManifestIndex::diagnostics`].
    pub fn load(
        master_path: impl AsRef<Path>,
        manifests_dir: impl AsRef<Path>,
        options: IndexOptions,
    ) -> Self {
        let master_path = master_path.as_ref();
        let manifests_dir = manifests_dir.as_ref();

        let mut index = Self {
            normalizer: options.normalizer,
            path_rewrites: options.path_rewrites,
            ..Self::default()
        };

        let master = match read_json::<MasterManifest>(master_path) {
            Ok(master) => master,
            Err(err) => {
                index.record_manifest_failure("master", master_path, &err);
                return index;
            }
        };

        index.apply_master(master);
        info!(
            question_types = index.question_types.len(),
            subjects = index.subjects.len(),
            "Loaded master manifest"
        );

        let to_load: Vec<(String, String)> = index
            .question_types
            .iter()
            .filter(|(_, config)| config.enabled)
            .filter_map(|(name, config)| {
                config
                    .manifest_file
                    .as_ref()
                    .map(|file| (name.clone(), file.clone()))
            })
            .collect();

        for (question_type, manifest_file) in to_load {
            let path = manifests_dir.join(&manifest_file);
            let entries = match read_json::<Map<String, Value>>(&path) {
                Ok(raw) => index.collect_entries(&question_type, raw),
                Err(err) => {
                    index.record_manifest_failure(&question_type, &path, &err);
                    Vec::new()
                }
            };
            info!(
                question_type = %question_type,
                entries = entries.len(),
                "Loaded question type manifest"
            );
            index.manifests.insert(question_type, entries);
        }

        index
    }

    fn apply_master(&mut self, master: MasterManifest) {
        for (name, raw) in master.question_types {
            match serde_json::from_value::<QuestionTypeConfig>(raw) {
                Ok(config) => self.question_types.push((name, config)),
                Err(err) => {
                    warn!(question_type = %name, error = %err, "Skipping malformed question type config");
                    self.diagnostics.record(Degradation::MalformedEntry);
                }
            }
        }

        self.subjects = master.subjects;

        for (name, raw) in master.worksheet_templates {
            let Value::Object(counts) = raw else {
                warn!(template = %name, "Skipping worksheet template that is not an object");
                self.diagnostics.record(Degradation::MalformedEntry);
                continue;
            };

            let mut sections = Vec::with_capacity(counts.len());
            for (question_type, count) in counts {
                match count.as_u64().and_then(|count| u32::try_from(count).ok()) {
                    Some(count) => sections.push((question_type, count)),
                    None => {
                        warn!(template = %name, question_type = %question_type, "Skipping non-integer worksheet count");
                        self.diagnostics.record(Degradation::MalformedEntry);
                    }
                }
            }
            self.worksheet_templates.push(WorksheetTemplate { name, sections });
        }
    }

    /// Keeps entries in document order; later duplicates of a normalized
    /// (subject, lesson) pair are kept but never win a lookup.
    fn collect_entries(
        &mut self,
        question_type: &str,
        raw: Map<String, Value>,
    ) -> Vec<(String, ManifestEntry)> {
        let mut entries = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();

        for (key, value) in raw {
            let entry = match serde_json::from_value::<ManifestEntry>(value) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(question_type, entry = %key, error = %err, "Skipping malformed manifest entry");
                    self.diagnostics.record(Degradation::MalformedEntry);
                    continue;
                }
            };

            let normalized = (
                self.normalizer.normalize(&entry.subject),
                self.normalizer.normalize(&entry.lesson),
            );
            let blank = normalized.0.is_empty() && normalized.1.is_empty();
            if !blank && !seen.insert(normalized) {
                warn!(
                    question_type,
                    entry = %key,
                    subject = %entry.subject,
                    lesson = %entry.lesson,
                    "Manifest entry duplicates an earlier subject/lesson; the earlier entry wins"
                );
                self.diagnostics.record(Degradation::AmbiguousEntry);
            }

            entries.push((key, entry));
        }

        entries
    }

    fn record_manifest_failure(&mut self, label: &str, path: &Path, err: &AppError) {
        if err.is_not_found() {
            warn!(manifest = label, path = %path.display(), "Manifest not found");
            self.diagnostics.record(Degradation::ManifestMissing);
        } else {
            error!(manifest = label, path = %path.display(), error = %err, "Failed to load manifest");
            self.diagnostics.record(Degradation::ManifestCorrupt);
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn normalize_name(&self, name: &str) -> String {
        self.normalizer.normalize(name)
    }

    pub fn names_match(&self, a: &str, b: &str) -> bool {
        self.normalizer.names_match(a, b)
    }

    /// Enabled question types in master manifest order.
    pub fn enabled_question_types(&self) -> Vec<&str> {
        self.question_types
            .iter()
            .filter(|(_, config)| config.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn question_type_config(&self, question_type: &str) -> Option<&QuestionTypeConfig> {
        self.question_types
            .iter()
            .find(|(name, _)| name == question_type)
            .map(|(_, config)| config)
    }

    pub fn entries(&self, question_type: &str) -> &[(String, ManifestEntry)] {
        self.manifests
            .get(question_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find_entry(
        &self,
        question_type: &str,
        subject: &str,
        lesson: &str,
    ) -> Option<&ManifestEntry> {
        let subject = self.normalizer.normalize(subject);
        let lesson = self.normalizer.normalize(lesson);

        self.entries(question_type)
            .iter()
            .map(|(_, entry)| entry)
            .find(|entry| {
                self.normalizer.normalize(&entry.subject) == subject
                    && self.normalizer.normalize(&entry.lesson) == lesson
            })
    }

    /// File path for a (type, subject, lesson) request, with legacy prefixes rewritten.
    pub fn resolve_path(&self, question_type: &str, subject: &str, lesson: &str) -> Option<String> {
        let Some(entry) = self.find_entry(question_type, subject, lesson) else {
            debug!(question_type, subject, lesson, "No manifest entry found");
            return None;
        };

        if entry.file_path.is_empty() {
            return None;
        }

        Some(self.rewrite_path(&entry.file_path))
    }

    fn rewrite_path(&self, file_path: &str) -> String {
        self.path_rewrites
            .iter()
            .find_map(|rewrite| {
                file_path
                    .strip_prefix(rewrite.from.as_str())
                    .map(|rest| format!("{}{rest}", rewrite.to))
            })
            .unwrap_or_else(|| file_path.to_string())
    }

    /// Subjects seen in one type's manifest (sorted), or the master manifest's
    /// declared subject list when no type is given.
    pub fn list_subjects(&self, question_type: Option<&str>) -> Vec<String> {
        match question_type {
            Some(question_type) => self
                .entries(question_type)
                .iter()
                .map(|(_, entry)| entry.subject.as_str())
                .filter(|subject| !subject.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => self.subjects.clone(),
        }
    }

    pub fn list_lessons(&self, question_type: &str, subject: &str) -> Vec<String> {
        let subject = self.normalizer.normalize(subject);

        self.entries(question_type)
            .iter()
            .map(|(_, entry)| entry)
            .filter(|entry| {
                !entry.lesson.is_empty() && self.normalizer.normalize(&entry.subject) == subject
            })
            .map(|entry| entry.lesson.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn subjects_lessons(&self, question_type: &str) -> BTreeMap<String, BTreeSet<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (_, entry) in self.entries(question_type) {
            if entry.subject.is_empty() || entry.lesson.is_empty() {
                continue;
            }
            grouped
                .entry(entry.subject.clone())
                .or_default()
                .insert(entry.lesson.clone());
        }
        grouped
    }

    /// Subjects across every enabled question type.
    pub fn unified_subjects(&self) -> Vec<String> {
        self.enabled_question_types()
            .into_iter()
            .flat_map(|question_type| self.list_subjects(Some(question_type)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn unified_lessons(&self, subject: &str) -> Vec<String> {
        self.enabled_question_types()
            .into_iter()
            .flat_map(|question_type| self.list_lessons(question_type, subject))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Enabled types that have a file for this lesson, in master manifest order.
    pub fn list_question_types_for_lesson(&self, subject: &str, lesson: &str) -> Vec<String> {
        self.enabled_question_types()
            .into_iter()
            .filter(|question_type| self.resolve_path(question_type, subject, lesson).is_some())
            .map(str::to_string)
            .collect()
    }

    pub fn worksheet_templates(&self) -> &[WorksheetTemplate] {
        &self.worksheet_templates
    }

    pub fn worksheet_template(&self, name: &str) -> Option<&WorksheetTemplate> {
        self.worksheet_templates
            .iter()
            .find(|template| template.name == name)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    if !path.is_file() {
        return Err(AppError::NotFound(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
