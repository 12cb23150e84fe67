#![allow(clippy::arithmetic_side_effects)]

use serde::Serialize;

/// A fallback taken instead of failing. Every degraded path records one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    ManifestMissing,
    ManifestCorrupt,
    MalformedEntry,
    AmbiguousEntry,
    UnknownQuestionType,
    EntryNotFound,
    FileNotFound,
    ReadFailure,
    DecodeFallback,
    DecodeFailure,
    BlockDropped,
    InvalidMarks,
    MissingOptions,
    OrphanOptionLine,
    UnknownType,
}

/// Counted degradations for one load (manifest index or question file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub manifest_missing: usize,
    pub manifest_corrupt: usize,
    pub malformed_entry: usize,
    pub ambiguous_entry: usize,
    pub unknown_question_type: usize,
    pub entry_not_found: usize,
    pub file_not_found: usize,
    pub read_failure: usize,
    pub decode_fallback: usize,
    pub decode_failure: usize,
    pub block_dropped: usize,
    pub invalid_marks: usize,
    pub missing_options: usize,
    pub orphan_option_line: usize,
    pub unknown_type: usize,
}

impl Diagnostics {
    pub fn record(&mut self, degradation: Degradation) {
        *self.slot_mut(degradation) += 1;
    }

    pub fn count(&self, degradation: Degradation) -> usize {
        match degradation {
            Degradation::ManifestMissing => self.manifest_missing,
            Degradation::ManifestCorrupt => self.manifest_corrupt,
            Degradation::MalformedEntry => self.malformed_entry,
            Degradation::AmbiguousEntry => self.ambiguous_entry,
            Degradation::UnknownQuestionType => self.unknown_question_type,
            Degradation::EntryNotFound => self.entry_not_found,
            Degradation::FileNotFound => self.file_not_found,
            Degradation::ReadFailure => self.read_failure,
            Degradation::DecodeFallback => self.decode_fallback,
            Degradation::DecodeFailure => self.decode_failure,
            Degradation::BlockDropped => self.block_dropped,
            Degradation::InvalidMarks => self.invalid_marks,
            Degradation::MissingOptions => self.missing_options,
            Degradation::OrphanOptionLine => self.orphan_option_line,
            Degradation::UnknownType => self.unknown_type,
        }
    }

    pub fn total(&self) -> usize {
        ALL_DEGRADATIONS.iter().map(|d| self.count(*d)).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &Self) {
        for degradation in ALL_DEGRADATIONS {
            *self.slot_mut(degradation) += other.count(degradation);
        }
    }

    fn slot_mut(&mut self, degradation: Degradation) -> &mut usize {
        match degradation {
            Degradation::ManifestMissing => &mut self.manifest_missing,
            Degradation::ManifestCorrupt => &mut self.manifest_corrupt,
            Degradation::MalformedEntry => &mut self.malformed_entry,
            Degradation::AmbiguousEntry => &mut self.ambiguous_entry,
            Degradation::UnknownQuestionType => &mut self.unknown_question_type,
            Degradation::EntryNotFound => &mut self.entry_not_found,
            Degradation::FileNotFound => &mut self.file_not_found,
            Degradation::ReadFailure => &mut self.read_failure,
            Degradation::DecodeFallback => &mut self.decode_fallback,
            Degradation::DecodeFailure => &mut self.decode_failure,
            Degradation::BlockDropped => &mut self.block_dropped,
            Degradation::InvalidMarks => &mut self.invalid_marks,
            Degradation::MissingOptions => &mut self.missing_options,
            Degradation::OrphanOptionLine => &mut self.orphan_option_line,
            Degradation::UnknownType => &mut self.unknown_type,
        }
    }
}

const ALL_DEGRADATIONS: [Degradation; 15] = [
    Degradation::ManifestMissing,
    Degradation::ManifestCorrupt,
    Degradation::MalformedEntry,
    Degradation::AmbiguousEntry,
    Degradation::UnknownQuestionType,
    Degradation::EntryNotFound,
    Degradation::FileNotFound,
    Degradation::ReadFailure,
    Degradation::DecodeFallback,
    Degradation::DecodeFailure,
    Degradation::BlockDropped,
    Degradation::InvalidMarks,
    Degradation::MissingOptions,
    Degradation::OrphanOptionLine,
    Degradation::UnknownType,
];
