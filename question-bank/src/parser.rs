use std::path::Path;

use common::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    decode::decode_text,
    diagnostics::{Degradation, Diagnostics},
    question::{Question, QuestionKind, DEFAULT_MARKS},
};

pub const QUESTION_DELIMITER: &str = "[QUESTION]";

#[allow(clippy::expect_used)]
static OPTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-Z])\)").expect("option marker pattern is valid"));
#[allow(clippy::expect_used)]
static ASSERTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Assertion\s*(?:\(A\))?\s*:").expect("assertion pattern is valid"));
#[allow(clippy::expect_used)]
static REASON_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Reason\s*(?:\(R\))?\s*:").expect("reason pattern is valid"));

/// The record field a line writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Type,
    Text,
    Answer,
    Options,
    Marks,
    Concept,
    Difficulty,
    SourceText,
    Events,
    ColumnA,
    ColumnB,
}

struct FieldSpec {
    prefix: &'static str,
    slot: Slot,
    /// Whether unprefixed lines after this one keep writing to the slot.
    multiline: bool,
}

static FIELD_SPECS: [FieldSpec; 11] = [
    FieldSpec { prefix: "Type:", slot: Slot::Type, multiline: false },
    FieldSpec { prefix: "Text:", slot: Slot::Text, multiline: true },
    FieldSpec { prefix: "Answer:", slot: Slot::Answer, multiline: true },
    FieldSpec { prefix: "Options:", slot: Slot::Options, multiline: true },
    FieldSpec { prefix: "Marks:", slot: Slot::Marks, multiline: false },
    FieldSpec { prefix: "Concept:", slot: Slot::Concept, multiline: false },
    FieldSpec { prefix: "Difficulty:", slot: Slot::Difficulty, multiline: false },
    FieldSpec { prefix: "SourceText:", slot: Slot::SourceText, multiline: true },
    FieldSpec { prefix: "Events:", slot: Slot::Events, multiline: true },
    FieldSpec { prefix: "ColumnA:", slot: Slot::ColumnA, multiline: true },
    FieldSpec { prefix: "ColumnB:", slot: Slot::ColumnB, multiline: true },
];

fn match_field(line: &str) -> Option<(&'static FieldSpec, &str)> {
    FIELD_SPECS.iter().find_map(|spec| {
        line.strip_prefix(spec.prefix)
            .map(|value| (spec, value.trim()))
    })
}

/// Line-driven state machine for a single question block.
///
/// The cursor is the continuation state: `None` until a multi-line field is
/// seen, and reset to `None` by every single-value field.
#[derive(Debug)]
pub struct BlockParser {
    question: Question,
    cursor: Option<Slot>,
    diagnostics: Diagnostics,
}

impl BlockParser {
    pub fn new(kind: QuestionKind) -> Self {
        Self {
            question: Question::new(kind),
            cursor: None,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn cursor(&self) -> Option<Slot> {
        self.cursor
    }

    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some((spec, value)) = match_field(line) {
            self.set_field(spec.slot, value);
            self.cursor = spec.multiline.then_some(spec.slot);
            return;
        }

        if let Some(slot) = self.cursor {
            self.continue_field(slot, line);
        }
    }

    fn set_field(&mut self, slot: Slot, value: &str) {
        let question = &mut self.question;
        match slot {
            Slot::Type => match value.parse::<QuestionKind>() {
                Ok(kind) => question.kind = kind,
                Err(_) if value.is_empty() => {}
                Err(_) => {
                    debug!(value, "Unknown Type: value, keeping requested type");
                    self.diagnostics.record(Degradation::UnknownType);
                }
            },
            Slot::Text => question.text = value.to_string(),
            Slot::Answer => question.answer = value.to_string(),
            Slot::SourceText => question.source_text = value.to_string(),
            Slot::Concept => question.concept = value.to_string(),
            Slot::Difficulty => {
                if !value.is_empty() {
                    question.difficulty = value.to_string();
                }
            }
            Slot::Marks => {
                question.marks = parse_marks(value).unwrap_or_else(|| {
                    self.diagnostics.record(Degradation::InvalidMarks);
                    DEFAULT_MARKS
                });
            }
            Slot::Options => {
                if !value.is_empty() {
                    question.options.clear();
                    for option in split_options(value) {
                        push_unique(&mut question.options, option);
                    }
                }
            }
            Slot::Events => replace_list(&mut question.events, value),
            Slot::ColumnA => replace_list(&mut question.column_a, value),
            Slot::ColumnB => replace_list(&mut question.column_b, value),
        }
    }

    fn continue_field(&mut self, slot: Slot, line: &str) {
        let question = &mut self.question;
        match slot {
            Slot::Text => append_joined(&mut question.text, line),
            Slot::Answer => append_joined(&mut question.answer, line),
            Slot::SourceText => append_joined(&mut question.source_text, line),
            Slot::Options => {
                if starts_with_option_marker(line) {
                    push_unique(&mut question.options, line.to_string());
                } else if let Some(last) = question.options.last_mut() {
                    append_joined(last, line);
                } else {
                    self.diagnostics.record(Degradation::OrphanOptionLine);
                }
            }
            Slot::Events => question.events.push(line.to_string()),
            Slot::ColumnA => question.column_a.push(line.to_string()),
            Slot::ColumnB => question.column_b.push(line.to_string()),
            Slot::Type | Slot::Marks | Slot::Concept | Slot::Difficulty => {}
        }
    }

    /// Ends the block. Yields no record when the text is too short.
    pub fn finish(self) -> (Option<Question>, Diagnostics) {
        let Self {
            mut question,
            mut diagnostics,
            ..
        } = self;

        question.text = question.text.trim().to_string();
        question.answer = question.answer.trim().to_string();
        question.source_text = question.source_text.trim().to_string();

        if !question.is_valid() {
            diagnostics.record(Degradation::BlockDropped);
            return (None, diagnostics);
        }

        if let Some(formatted) = format_assertion_reason(&question.text) {
            question.text = formatted;
        }

        if question.kind.is_choice() && question.options.is_empty() {
            diagnostics.record(Degradation::MissingOptions);
        }

        (Some(question), diagnostics)
    }
}

fn append_joined(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

fn replace_list(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() {
        *list = vec![value.to_string()];
    }
}

fn push_unique(options: &mut Vec<String>, option: String) {
    if !options.contains(&option) {
        options.push(option);
    }
}

fn starts_with_option_marker(line: &str) -> bool {
    OPTION_MARKER.find(line).is_some_and(|m| m.start() == 0)
}

/// Parses a `Marks:` value. Anything that is not a positive integer yields `None`.
pub fn parse_marks(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|marks| *marks >= 1)
}

/// Splits text such as `"(A) Delhi (B) Mumbai"` into options.
///
/// A marker opens a new option only when it starts a word and carries the
/// letter after the previous option's, so `(A)` or `(R)` quoted inside an
/// option's text stay put. Text before the first marker is dropped.
pub fn split_options(text: &str) -> Vec<String> {
    let mut starts = Vec::new();
    let mut expected: Option<u8> = None;

    for captures in OPTION_MARKER.captures_iter(text) {
        let (Some(marker), Some(letter)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let Some(letter) = letter.as_str().bytes().next() else {
            continue;
        };
        let starts_word = text
            .get(..marker.start())
            .is_some_and(|before| before.is_empty() || before.ends_with(char::is_whitespace));
        let in_sequence = match expected {
            Some(next) => next == letter,
            None => true,
        };

        if starts_word && in_sequence {
            starts.push(marker.start());
            expected = letter.checked_add(1);
        }
    }

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, start)| {
            let end = starts.get(i.saturating_add(1)).copied().unwrap_or(text.len());
            text.get(*start..end)
        })
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lays out text carrying `Assertion:` and `Reason:` markers as two bold-labelled
/// paragraphs. Text before the assertion is kept as a leading paragraph.
pub fn format_assertion_reason(text: &str) -> Option<String> {
    let assertion = ASSERTION_MARKER.find(text)?;
    let reason = REASON_MARKER.find_at(text, assertion.end())?;

    let preamble = text.get(..assertion.start())?.trim();
    let assertion_body = text.get(assertion.end()..reason.start())?.trim();
    let reason_body = text.get(reason.end()..)?.trim();

    let mut formatted = String::new();
    if !preamble.is_empty() {
        formatted.push_str(preamble);
        formatted.push_str("\n\n");
    }
    formatted.push_str("**Assertion:** ");
    formatted.push_str(assertion_body);
    formatted.push_str("\n\n**Reason:** ");
    formatted.push_str(reason_body);

    Some(formatted)
}

/// Result of parsing one question file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub questions: Vec<Question>,
    pub diagnostics: Diagnostics,
}

/// Parses `[QUESTION]`-delimited files of one question type.
#[derive(Debug, Clone, Copy)]
pub struct QuestionBlockParser {
    kind: QuestionKind,
}

impl QuestionBlockParser {
    pub fn new(kind: QuestionKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn parse_block(&self, block: &str) -> (Option<Question>, Diagnostics) {
        let mut parser = BlockParser::new(self.kind);
        for line in block.lines() {
            parser.feed_line(line);
        }
        parser.finish()
    }

    /// Parses every block after the first delimiter. Blocks are independent:
    /// a dropped block never affects its neighbours.
    pub fn parse_str(&self, content: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for block in content.split(QUESTION_DELIMITER).skip(1) {
            if block.trim().is_empty() {
                continue;
            }

            let (question, diagnostics) = self.parse_block(block);
            outcome.diagnostics.merge(&diagnostics);
            if let Some(question) = question {
                outcome.questions.push(question);
            }
        }

        outcome
    }

    /// Reads, decodes and parses a question file. Visual questions get the
    /// file's directory as their image folder.
    pub fn parse_file(&self, path: &Path, fallback_encoding: &str) -> Result<ParseOutcome, AppError> {
        let bytes = std::fs::read(path)?;
        let decoded = decode_text(&bytes, fallback_encoding)?;

        let mut outcome = self.parse_str(&decoded.text);
        if decoded.used_fallback {
            debug!(
                path = %path.display(),
                encoding = decoded.encoding,
                "Decoded question file with fallback encoding"
            );
            outcome.diagnostics.record(Degradation::DecodeFallback);
        }

        if self.kind == QuestionKind::Visual {
            let folder = path
                .parent()
                .map(|parent| parent.display().to_string())
                .unwrap_or_default();
            for question in &mut outcome.questions {
                question.image_folder = Some(folder.clone());
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: QuestionKind, content: &str) -> ParseOutcome {
        QuestionBlockParser::new(kind).parse_str(content)
    }

    #[test]
    fn short_blocks_are_dropped() {
        let outcome = parse(
            QuestionKind::Short,
            "[QUESTION]\nText: What is federalism?\nAnswer: A system of government\nMarks: 2\n[QUESTION]\nText: hi\n",
        );

        assert_eq!(outcome.questions.len(), 1);
        let question = &outcome.questions[0];
        assert_eq!(question.text, "What is federalism?");
        assert_eq!(question.answer, "A system of government");
        assert_eq!(question.marks, 2);
        assert_eq!(outcome.diagnostics.block_dropped, 1);
    }

    #[test]
    fn preamble_before_first_delimiter_is_ignored() {
        let outcome = parse(
            QuestionKind::Short,
            "Text: This preamble is not a question\n[QUESTION]\nText: Explain the term coalition government.\n",
        );

        assert_eq!(outcome.questions.len(), 1);
        assert_eq!(
            outcome.questions[0].text,
            "Explain the term coalition government."
        );
    }

    #[test]
    fn multi_line_fields_are_space_joined() {
        let outcome = parse(
            QuestionKind::Long,
            "[QUESTION]\nText: Describe the impact\nof the Non-Cooperation Movement\n\non the economy.\nAnswer: Foreign goods\nwere boycotted.\nConcept: Boycott\nthis line is ignored\n",
        );

        let question = &outcome.questions[0];
        assert_eq!(
            question.text,
            "Describe the impact of the Non-Cooperation Movement on the economy."
        );
        assert_eq!(question.answer, "Foreign goods were boycotted.");
        assert_eq!(question.concept, "Boycott");
    }

    #[test]
    fn options_continuation_builds_ordered_unique_list() {
        let outcome = parse(
            QuestionKind::Mcq,
            "[QUESTION]\nText: Which is the capital of India?\nOptions: (A) First\n(B) Second\n(C) Third\n(B) Second\nAnswer: (A)\n",
        );

        assert_eq!(
            outcome.questions[0].options,
            vec!["(A) First", "(B) Second", "(C) Third"]
        );
        assert!(outcome.diagnostics.is_clean());
    }

    #[test]
    fn inline_options_are_split_on_markers() {
        let outcome = parse(
            QuestionKind::Mcq,
            "[QUESTION]\nText: Which river is the longest?\nOptions: (A) Ganga (B) Yamuna (C) Godavari (D) Kaveri\n",
        );

        assert_eq!(
            outcome.questions[0].options,
            vec!["(A) Ganga", "(B) Yamuna", "(C) Godavari", "(D) Kaveri"]
        );
    }

    #[test]
    fn unmarked_option_lines_extend_previous_option() {
        let outcome = parse(
            QuestionKind::Mcq,
            "[QUESTION]\nText: Which statement is correct?\nOptions:\nnot an option yet\n(A) Both statements are\ntrue\n(B) Neither\n",
        );

        assert_eq!(
            outcome.questions[0].options,
            vec!["(A) Both statements are true", "(B) Neither"]
        );
        assert_eq!(outcome.diagnostics.orphan_option_line, 1);
    }

    #[test]
    fn invalid_marks_fall_back_to_one() {
        let outcome = parse(
            QuestionKind::Short,
            "[QUESTION]\nText: Define the term sovereignty.\nMarks: two\n[QUESTION]\nText: Define the term federation.\nMarks:\n[QUESTION]\nText: Define the term democracy.\nMarks: 0\n",
        );

        assert_eq!(outcome.questions.len(), 3);
        assert!(outcome.questions.iter().all(|q| q.marks == 1));
        assert_eq!(outcome.diagnostics.invalid_marks, 3);
    }

    #[test]
    fn assertion_reason_text_is_reformatted() {
        let outcome = parse(
            QuestionKind::Assertion,
            "[QUESTION]\nText: Assertion: Gandhiji withdrew the movement.\nReason: Chauri Chaura turned violent.\nAnswer: (A)\nMarks: 1\nOptions: (A) Both true (B) Both false\n",
        );

        let question = &outcome.questions[0];
        assert_eq!(
            question.text,
            "**Assertion:** Gandhiji withdrew the movement.\n\n**Reason:** Chauri Chaura turned violent."
        );
        assert_eq!(question.answer, "(A)");
        assert_eq!(question.marks, 1);
    }

    #[test]
    fn assertion_reason_keeps_instructions_as_preamble() {
        let formatted =
            format_assertion_reason("Read both statements. Assertion (A): X holds. Reason (R): Y holds.")
                .unwrap();
        assert_eq!(
            formatted,
            "Read both statements.\n\n**Assertion:** X holds.\n\n**Reason:** Y holds."
        );
        assert!(format_assertion_reason("Reason: Y. Assertion: X.").is_none());
        assert!(format_assertion_reason("Plain question text").is_none());
    }

    #[test]
    fn single_value_fields_reset_the_cursor() {
        let mut parser = BlockParser::new(QuestionKind::Short);
        assert_eq!(parser.cursor(), None);

        parser.feed_line("Text: Explain the role of the judiciary.");
        assert_eq!(parser.cursor(), Some(Slot::Text));

        parser.feed_line("Difficulty: Hard");
        assert_eq!(parser.cursor(), None);

        parser.feed_line("dangling line");
        parser.feed_line("SourceText: An excerpt");
        assert_eq!(parser.cursor(), Some(Slot::SourceText));
        parser.feed_line("continues here");

        let (question, diagnostics) = parser.finish();
        let question = question.unwrap();
        assert_eq!(question.text, "Explain the role of the judiciary.");
        assert_eq!(question.difficulty, "Hard");
        assert_eq!(question.source_text, "An excerpt continues here");
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn events_and_columns_collect_one_entry_per_line() {
        let outcome = parse(
            QuestionKind::Chronology,
            "[QUESTION]\nText: Arrange the events in order.\nEvents: Dandi March\nJallianwala Bagh\nQuit India\nColumnA:\nTreaty of Vienna\nColumnB: 1815\n",
        );

        let question = &outcome.questions[0];
        assert_eq!(
            question.events,
            vec!["Dandi March", "Jallianwala Bagh", "Quit India"]
        );
        assert_eq!(question.column_a, vec!["Treaty of Vienna"]);
        assert_eq!(question.column_b, vec!["1815"]);
    }

    #[test]
    fn type_line_overrides_kind_unless_unknown() {
        let outcome = parse(
            QuestionKind::Short,
            "[QUESTION]\nType: very_short\nText: Name the first Prime Minister.\n[QUESTION]\nType: essay\nText: Name the first President.\n",
        );

        assert_eq!(outcome.questions[0].kind, QuestionKind::VeryShort);
        assert_eq!(outcome.questions[1].kind, QuestionKind::Short);
        assert_eq!(outcome.diagnostics.unknown_type, 1);
    }

    #[test]
    fn choice_questions_without_options_are_kept_and_counted() {
        let outcome = parse(
            QuestionKind::Mcq,
            "[QUESTION]\nText: Which of these is a federal country?\nAnswer: India\n",
        );

        assert_eq!(outcome.questions.len(), 1);
        assert_eq!(outcome.diagnostics.missing_options, 1);
    }

    #[test]
    fn parsing_is_deterministic() {
        let content = "[QUESTION]\nText: What is federalism?\nOptions: (A) One (B) Two\nMarks: 3\n[QUESTION]\nText: Why do we need power sharing?\n";
        let parser = QuestionBlockParser::new(QuestionKind::Mcq);

        let first = serde_json::to_vec(&parser.parse_str(content).questions).unwrap();
        let second = serde_json::to_vec(&parser.parse_str(content).questions).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn split_options_ignores_text_before_first_marker() {
        assert_eq!(
            split_options("pick one: (A) yes (B) no"),
            vec!["(A) yes", "(B) no"]
        );
        assert!(split_options("no markers here").is_empty());
    }

    #[test]
    fn split_options_keeps_markers_quoted_inside_an_option() {
        assert_eq!(
            split_options("(A) Both (A) and (R) are true (B) Only (A) is true (C) (R) alone"),
            vec![
                "(A) Both (A) and (R) are true",
                "(B) Only (A) is true",
                "(C) (R) alone"
            ]
        );
    }

    #[test]
    fn assertion_option_lines_are_kept_whole() {
        let outcome = parse(
            QuestionKind::Assertion,
            "[QUESTION]\nText: Assertion (A): Federalism divides power. Reason (R): India has many languages.\nOptions:\n(A) Both Assertion (A) and Reason (R) are true\n(B) Only (A) is true\nAnswer: (A)\n",
        );

        assert_eq!(
            outcome.questions[0].options,
            vec![
                "(A) Both Assertion (A) and Reason (R) are true",
                "(B) Only (A) is true"
            ]
        );
        assert!(outcome.diagnostics.is_clean());
    }
}
