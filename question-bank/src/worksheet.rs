use rand::{seq::SliceRandom, Rng};
use serde::Serialize;
use tracing::{info, warn};

use crate::{bank::QuestionBank, question::Question};

pub fn total_marks(questions: &[Question]) -> u32 {
    questions
        .iter()
        .fold(0u32, |total, question| total.saturating_add(question.marks))
}

/// Shuffles the pool, then keeps every question whose marks still fit under
/// `target_marks`, stopping once the target is reached.
pub fn select_by_marks<R: Rng + ?Sized>(
    mut questions: Vec<Question>,
    target_marks: u32,
    rng: &mut R,
) -> Vec<Question> {
    questions.shuffle(rng);

    let mut selected = Vec::new();
    let mut current = 0u32;
    for question in questions {
        if current >= target_marks {
            break;
        }
        let next = current.saturating_add(question.marks);
        if next <= target_marks {
            current = next;
            selected.push(question);
        }
    }
    selected
}

#[derive(Debug, Clone, Serialize)]
pub struct WorksheetSection {
    pub question_type: String,
    pub requested: u32,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Worksheet {
    pub template: String,
    pub subject: String,
    pub sections: Vec<WorksheetSection>,
}

impl Worksheet {
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|section| section.questions.len()).sum()
    }

    pub fn total_marks(&self) -> u32 {
        self.sections
            .iter()
            .fold(0u32, |total, section| total.saturating_add(total_marks(&section.questions)))
    }
}

impl QuestionBank {
    fn pool<'a>(
        &self,
        subject: &str,
        lessons: &[String],
        question_types: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Question> {
        let question_types: Vec<&str> = question_types.into_iter().collect();
        lessons
            .iter()
            .flat_map(|lesson| {
                question_types
                    .iter()
                    .flat_map(move |question_type| self.load_questions(question_type, subject, lesson))
            })
            .collect()
    }

    /// Random question set over the given lessons and types, filled up to `target_marks`.
    pub fn generate_question_set<R: Rng + ?Sized>(
        &self,
        subject: &str,
        lessons: &[String],
        question_types: &[String],
        target_marks: u32,
        rng: &mut R,
    ) -> Vec<Question> {
        let pool = self.pool(subject, lessons, question_types.iter().map(String::as_str));
        let selected = select_by_marks(pool, target_marks, rng);
        info!(
            subject,
            questions = selected.len(),
            marks = total_marks(&selected),
            target_marks,
            "Generated question set"
        );
        selected
    }

    /// Fills each section of a named worksheet template with up to its requested
    /// number of questions. Unknown templates give an empty worksheet.
    pub fn build_worksheet<R: Rng + ?Sized>(
        &self,
        template_name: &str,
        subject: &str,
        lessons: &[String],
        rng: &mut R,
    ) -> Worksheet {
        let mut worksheet = Worksheet {
            template: template_name.to_string(),
            subject: subject.to_string(),
            sections: Vec::new(),
        };

        let Some(template) = self.index().worksheet_template(template_name) else {
            warn!(template = template_name, "Unknown worksheet template");
            return worksheet;
        };

        for (question_type, requested) in &template.sections {
            let pool = self.pool(subject, lessons, [question_type.as_str()]);
            let take = usize::try_from(*requested).unwrap_or(usize::MAX);
            let questions = pool.choose_multiple(rng, take).cloned().collect();
            worksheet.sections.push(WorksheetSection {
                question_type: question_type.clone(),
                requested: *requested,
                questions,
            });
        }

        worksheet
    }
}
