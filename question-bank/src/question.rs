use std::{fmt, str::FromStr};

use common::error::AppError;
use serde::{Deserialize, Serialize};

/// Questions whose text is shorter than this (in characters) are discarded.
pub const MIN_TEXT_CHARS: usize = 10;
pub const DEFAULT_MARKS: u32 = 1;
pub const DEFAULT_DIFFICULTY: &str = "Medium";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    Assertion,
    Matching,
    Chronology,
    Visual,
    VeryShort,
    Short,
    Long,
    Source,
    Competency,
    Map,
}

impl QuestionKind {
    pub const ALL: [Self; 11] = [
        Self::Mcq,
        Self::Assertion,
        Self::Matching,
        Self::Chronology,
        Self::Visual,
        Self::VeryShort,
        Self::Short,
        Self::Long,
        Self::Source,
        Self::Competency,
        Self::Map,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Assertion => "assertion",
            Self::Matching => "matching",
            Self::Chronology => "chronology",
            Self::Visual => "visual",
            Self::VeryShort => "very_short",
            Self::Short => "short",
            Self::Long => "long",
            Self::Source => "source",
            Self::Competency => "competency",
            Self::Map => "map",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mcq => "Multiple Choice Questions",
            Self::Assertion => "Assertion & Reasoning",
            Self::Matching => "Matching Questions",
            Self::Chronology => "Chronology Questions",
            Self::Visual => "Visual Questions",
            Self::VeryShort => "Very Short Answer",
            Self::Short => "Short Answer",
            Self::Long => "Long Answer",
            Self::Source => "Source-Based Questions",
            Self::Competency => "Competency-Based Questions",
            Self::Map => "Map Questions",
        }
    }

    /// Choice-style questions are expected to carry `Options:`.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::Mcq | Self::Assertion)
    }

    /// Question files of these kinds sit next to the images they reference.
    pub fn references_images(self) -> bool {
        matches!(self, Self::Visual | Self::Map)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == canonical)
            .ok_or_else(|| AppError::Validation(format!("Unknown question type: {s}")))
    }
}

/// A parsed question record, serialized with the field names the front end expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "Type")]
    pub kind: QuestionKind,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Answer", default)]
    pub answer: String,
    #[serde(rename = "Options", default)]
    pub options: Vec<String>,
    #[serde(rename = "Marks", default = "default_marks")]
    pub marks: u32,
    #[serde(rename = "Difficulty", default = "default_difficulty")]
    pub difficulty: String,
    #[serde(rename = "Concept", default)]
    pub concept: String,
    #[serde(rename = "SourceText", default)]
    pub source_text: String,
    #[serde(rename = "Events", default)]
    pub events: Vec<String>,
    #[serde(rename = "ColumnA", default)]
    pub column_a: Vec<String>,
    #[serde(rename = "ColumnB", default)]
    pub column_b: Vec<String>,
    #[serde(
        rename = "ImageFolder",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_folder: Option<String>,
}

fn default_marks() -> u32 {
    DEFAULT_MARKS
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

impl Question {
    /// An empty record of the given kind carrying the default marks and difficulty.
    pub fn new(kind: QuestionKind) -> Self {
        Self {
            kind,
            text: String::new(),
            answer: String::new(),
            options: Vec::new(),
            marks: DEFAULT_MARKS,
            difficulty: default_difficulty(),
            concept: String::new(),
            source_text: String::new(),
            events: Vec::new(),
            column_a: Vec::new(),
            column_b: Vec::new(),
            image_folder: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.text.trim().chars().count() >= MIN_TEXT_CHARS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_loose_spellings() {
        assert_eq!("mcq".parse::<QuestionKind>().unwrap(), QuestionKind::Mcq);
        assert_eq!(
            "Very Short".parse::<QuestionKind>().unwrap(),
            QuestionKind::VeryShort
        );
        assert_eq!(
            "very-short".parse::<QuestionKind>().unwrap(),
            QuestionKind::VeryShort
        );
        assert!(matches!(
            "essay".parse::<QuestionKind>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn kind_round_trips_through_as_str() {
        for kind in QuestionKind::ALL {
            assert_eq!(kind.as_str().parse::<QuestionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn new_question_has_defaults() {
        let question = Question::new(QuestionKind::Short);
        assert_eq!(question.marks, 1);
        assert_eq!(question.difficulty, "Medium");
        assert!(!question.is_valid());
    }

    #[test]
    fn validity_counts_characters_not_bytes() {
        let mut question = Question::new(QuestionKind::Short);
        question.text = "ééééééééé".to_string();
        assert!(!question.is_valid());
        question.text.push('é');
        assert!(question.is_valid());
    }

    #[test]
    fn serializes_with_front_end_field_names() {
        let mut question = Question::new(QuestionKind::VeryShort);
        question.text = "What is federalism?".to_string();

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["Type"], "very_short");
        assert_eq!(value["Text"], "What is federalism?");
        assert_eq!(value["Marks"], 1);
        assert!(value.get("ImageFolder").is_none());
    }
}
