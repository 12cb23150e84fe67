pub mod bank;
pub mod decode;
pub mod diagnostics;
pub mod manifest;
pub mod normalize;
pub mod parser;
pub mod practice;
pub mod question;
pub mod worksheet;

pub use bank::{BankOptions, QuestionBank};
pub use diagnostics::{Degradation, Diagnostics};
pub use manifest::{IndexOptions, ManifestEntry, ManifestIndex, QuestionTypeConfig, WorksheetTemplate};
pub use normalize::{names_match, normalize_name, NameNormalizer};
pub use parser::{ParseOutcome, QuestionBlockParser};
pub use practice::{AnswerFeedback, PracticeSession};
pub use question::{Question, QuestionKind};
pub use worksheet::{select_by_marks, total_marks, Worksheet, WorksheetSection};
