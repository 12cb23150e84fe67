#![allow(clippy::arithmetic_side_effects)]

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::question::Question;

/// Literal comparison, ignoring case and surrounding whitespace.
pub fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: Question,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
}

/// One practice run over a fixed list of questions.
///
/// Plain data: the caller decides where it lives between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSession {
    questions: Vec<Question>,
    current_index: usize,
    score: usize,
    answers: Vec<AnswerRecord>,
}

impl PracticeSession {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    /// Starts a session over at most `count` questions sampled from `questions`.
    pub fn start<R: Rng + ?Sized>(questions: Vec<Question>, count: usize, rng: &mut R) -> Self {
        if questions.len() <= count {
            return Self::new(questions);
        }
        let sampled = questions.choose_multiple(rng, count).cloned().collect();
        Self::new(sampled)
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// 1-based position of the current question.
    pub fn position(&self) -> usize {
        self.current_index + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    /// Grades `answer` against the current question and advances.
    /// Returns `None` once every question has been answered.
    pub fn submit(&mut self, answer: &str) -> Option<AnswerFeedback> {
        let question = self.current()?.clone();
        let is_correct = answers_match(answer, &question.answer);
        if is_correct {
            self.score += 1;
        }

        let feedback = AnswerFeedback {
            correct: is_correct,
            correct_answer: question.answer.clone(),
        };
        self.answers.push(AnswerRecord {
            correct_answer: question.answer.clone(),
            question,
            user_answer: answer.to_string(),
            is_correct,
        });
        self.current_index += 1;

        Some(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QuestionKind;
    use rand::{rngs::StdRng, SeedableRng};

    fn question(text: &str, answer: &str) -> Question {
        let mut question = Question::new(QuestionKind::VeryShort);
        question.text = text.to_string();
        question.answer = answer.to_string();
        question
    }

    #[test]
    fn answers_match_ignores_case_and_whitespace() {
        assert!(answers_match(" paris ", "Paris"));
        assert!(!answers_match("Lyon", "Paris"));
        assert!(!answers_match("Par is", "Paris"));
    }

    #[test]
    fn session_scores_and_finishes() {
        let mut session = PracticeSession::new(vec![
            question("What is the capital of France?", "Paris"),
            question("What is the capital of India?", "New Delhi"),
        ]);

        assert_eq!(session.position(), 1);
        let feedback = session.submit(" paris ").unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.correct_answer, "Paris");

        let feedback = session.submit("Mumbai").unwrap();
        assert!(!feedback.correct);

        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert!(session.submit("anything").is_none());
        assert_eq!(session.score(), 1);
        assert_eq!(session.answers().len(), 2);
        assert!(!session.answers()[1].is_correct);
    }

    #[test]
    fn start_samples_at_most_count_questions() {
        let questions: Vec<Question> = (0..10)
            .map(|i| question(&format!("Question number {i}"), "x"))
            .collect();

        let mut rng = StdRng::seed_from_u64(3);
        let session = PracticeSession::start(questions.clone(), 4, &mut rng);
        assert_eq!(session.total(), 4);

        let session = PracticeSession::start(questions, 20, &mut rng);
        assert_eq!(session.total(), 10);
    }

    #[test]
    fn empty_session_is_finished() {
        let mut session = PracticeSession::new(Vec::new());
        assert!(session.is_finished());
        assert!(session.submit("x").is_none());
    }
}
