use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("pass mark must be <= 100, got {0}")]
    InvalidPassMark(u8),

    #[error("availability window opens after it closes")]
    InvalidAvailabilityWindow,

    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("{kind} question needs at least {min} options, got {got}")]
    TooFewOptions {
        kind: &'static str,
        min: usize,
        got: usize,
    },

    #[error("choice question needs at least one correct option")]
    NoCorrectOption,

    #[error("true/false question must have exactly 2 options, got {0}")]
    InvalidTrueFalseOptions(usize),

    #[error("short answer question cannot carry options")]
    UnexpectedOptions,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Publication status of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStatus {
    Draft,
    Published,
    Archived,
}

/// Whether a quiz can currently be taken.
///
/// Resolved from publication status and the availability window against
/// wall-clock time on every read; there is no timer-driven invalidation, so
/// a quiz can look eligible until the next read discovers it expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEligibility {
    Eligible,
    NotYetAvailable,
    Expired,
    Unavailable,
}

impl QuizEligibility {
    /// Resolves eligibility for a possibly-missing quiz record.
    ///
    /// A missing record or a non-published status is `Unavailable`. The
    /// lower bound of the availability window is enforced: before
    /// `available_from` the quiz is `NotYetAvailable`.
    #[must_use]
    pub fn resolve(quiz: Option<&Quiz>, now: DateTime<Utc>) -> Self {
        match quiz {
            None => Self::Unavailable,
            Some(quiz) => quiz.eligibility(now),
        }
    }
}

/// A quiz attached to a lesson: metadata, rules, and availability window.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    instructions: Option<String>,
    time_limit_minutes: Option<u32>,
    attempts_allowed: Option<u32>,
    pass_mark_percent: u8,
    shuffle_questions: bool,
    shuffle_options: bool,
    status: QuizStatus,
    available_from: Option<DateTime<Utc>>,
    available_until: Option<DateTime<Utc>>,
}

impl Quiz {
    /// Creates a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle`, `QuizError::InvalidPassMark`, or
    /// `QuizError::InvalidAvailabilityWindow` on bad input.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        instructions: Option<String>,
        time_limit_minutes: Option<u32>,
        attempts_allowed: Option<u32>,
        pass_mark_percent: u8,
        shuffle_questions: bool,
        shuffle_options: bool,
        status: QuizStatus,
        available_from: Option<DateTime<Utc>>,
        available_until: Option<DateTime<Utc>>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if pass_mark_percent > 100 {
            return Err(QuizError::InvalidPassMark(pass_mark_percent));
        }
        if let (Some(from), Some(until)) = (available_from, available_until) {
            if from > until {
                return Err(QuizError::InvalidAvailabilityWindow);
            }
        }

        let instructions = instructions
            .map(|i| i.trim().to_owned())
            .filter(|i| !i.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            instructions,
            time_limit_minutes,
            attempts_allowed,
            pass_mark_percent,
            shuffle_questions,
            shuffle_options,
            status,
            available_from,
            available_until,
        })
    }

    /// Resolves whether this quiz can be taken at `now`.
    #[must_use]
    pub fn eligibility(&self, now: DateTime<Utc>) -> QuizEligibility {
        if self.status != QuizStatus::Published {
            return QuizEligibility::Unavailable;
        }
        if let Some(from) = self.available_from {
            if now < from {
                return QuizEligibility::NotYetAvailable;
            }
        }
        if let Some(until) = self.available_until {
            if now > until {
                return QuizEligibility::Expired;
            }
        }
        QuizEligibility::Eligible
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn attempts_allowed(&self) -> Option<u32> {
        self.attempts_allowed
    }

    #[must_use]
    pub fn pass_mark_percent(&self) -> u8 {
        self.pass_mark_percent
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_options(&self) -> bool {
        self.shuffle_options
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    #[must_use]
    pub fn available_from(&self) -> Option<DateTime<Utc>> {
        self.available_from
    }

    #[must_use]
    pub fn available_until(&self) -> Option<DateTime<Utc>> {
        self.available_until
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
}

/// One answer option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub text: String,
    pub correct: bool,
    pub explanation: Option<String>,
}

impl QuestionOption {
    #[must_use]
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// A single question in a quiz's question bank.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    id: QuestionId,
    quiz_id: QuizId,
    kind: QuestionKind,
    text: String,
    options: Vec<QuestionOption>,
    points: u32,
    position: u32,
    difficulty: QuestionDifficulty,
}

impl QuizQuestion {
    /// Creates a new question, validating option shape against the kind.
    ///
    /// # Errors
    ///
    /// Choice kinds need at least two options and one correct one,
    /// true/false exactly two, short answer none.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: QuestionId,
        quiz_id: QuizId,
        kind: QuestionKind,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        points: u32,
        position: u32,
        difficulty: QuestionDifficulty,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestionText);
        }

        match kind {
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
                if options.len() < 2 {
                    return Err(QuizError::TooFewOptions {
                        kind: "choice",
                        min: 2,
                        got: options.len(),
                    });
                }
                if !options.iter().any(|o| o.correct) {
                    return Err(QuizError::NoCorrectOption);
                }
            }
            QuestionKind::TrueFalse => {
                if options.len() != 2 {
                    return Err(QuizError::InvalidTrueFalseOptions(options.len()));
                }
                if !options.iter().any(|o| o.correct) {
                    return Err(QuizError::NoCorrectOption);
                }
            }
            QuestionKind::ShortAnswer => {
                if !options.is_empty() {
                    return Err(QuizError::UnexpectedOptions);
                }
            }
        }

        Ok(Self {
            id,
            quiz_id,
            kind,
            text: text.trim().to_owned(),
            options,
            points,
            position,
            difficulty,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn difficulty(&self) -> QuestionDifficulty {
        self.difficulty
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_quiz(
        status: QuizStatus,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Quiz {
        Quiz::new(
            QuizId::new(1),
            "Checkpoint",
            None,
            Some(15),
            Some(3),
            70,
            false,
            false,
            status,
            from,
            until,
        )
        .unwrap()
    }

    #[test]
    fn published_quiz_without_bounds_is_eligible() {
        let quiz = build_quiz(QuizStatus::Published, None, None);
        assert_eq!(quiz.eligibility(fixed_now()), QuizEligibility::Eligible);
    }

    #[test]
    fn past_upper_bound_is_expired() {
        let now = fixed_now();
        let quiz = build_quiz(QuizStatus::Published, None, Some(now - Duration::hours(1)));
        assert_eq!(quiz.eligibility(now), QuizEligibility::Expired);
    }

    #[test]
    fn draft_is_unavailable_regardless_of_dates() {
        let now = fixed_now();
        let quiz = build_quiz(
            QuizStatus::Draft,
            Some(now - Duration::hours(2)),
            Some(now + Duration::hours(2)),
        );
        assert_eq!(quiz.eligibility(now), QuizEligibility::Unavailable);

        let archived = build_quiz(QuizStatus::Archived, None, None);
        assert_eq!(archived.eligibility(now), QuizEligibility::Unavailable);
    }

    #[test]
    fn future_lower_bound_is_not_yet_available() {
        let now = fixed_now();
        let quiz = build_quiz(QuizStatus::Published, Some(now + Duration::hours(1)), None);
        assert_eq!(quiz.eligibility(now), QuizEligibility::NotYetAvailable);
    }

    #[test]
    fn missing_record_is_unavailable() {
        assert_eq!(
            QuizEligibility::resolve(None, fixed_now()),
            QuizEligibility::Unavailable
        );
    }

    #[test]
    fn window_inside_bounds_is_eligible() {
        let now = fixed_now();
        let quiz = build_quiz(
            QuizStatus::Published,
            Some(now - Duration::minutes(5)),
            Some(now + Duration::minutes(5)),
        );
        assert_eq!(quiz.eligibility(now), QuizEligibility::Eligible);
    }

    #[test]
    fn quiz_rejects_inverted_window() {
        let now = fixed_now();
        let err = Quiz::new(
            QuizId::new(1),
            "Checkpoint",
            None,
            None,
            None,
            70,
            false,
            false,
            QuizStatus::Published,
            Some(now + Duration::hours(1)),
            Some(now - Duration::hours(1)),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::InvalidAvailabilityWindow);
    }

    #[test]
    fn quiz_rejects_pass_mark_above_100() {
        let err = Quiz::new(
            QuizId::new(1),
            "Checkpoint",
            None,
            None,
            None,
            101,
            false,
            false,
            QuizStatus::Draft,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::InvalidPassMark(101));
    }

    #[test]
    fn single_choice_needs_correct_option() {
        let err = QuizQuestion::new(
            QuestionId::new(1),
            QuizId::new(1),
            QuestionKind::SingleChoice,
            "2 + 2 = ?",
            vec![QuestionOption::new("3", false), QuestionOption::new("5", false)],
            1,
            0,
            QuestionDifficulty::Easy,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::NoCorrectOption);
    }

    #[test]
    fn true_false_needs_exactly_two_options() {
        let err = QuizQuestion::new(
            QuestionId::new(1),
            QuizId::new(1),
            QuestionKind::TrueFalse,
            "Rust has a garbage collector",
            vec![QuestionOption::new("True", false)],
            1,
            0,
            QuestionDifficulty::Easy,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::InvalidTrueFalseOptions(1));
    }

    #[test]
    fn short_answer_rejects_options() {
        let err = QuizQuestion::new(
            QuestionId::new(1),
            QuizId::new(1),
            QuestionKind::ShortAnswer,
            "Name the borrow checker's phase",
            vec![QuestionOption::new("MIR", true)],
            2,
            0,
            QuestionDifficulty::Hard,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::UnexpectedOptions);
    }
}
