use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rng;
use rand::seq::SliceRandom;

use api::{NewQuestion, QuizApi};
use lms_core::model::{
    QuestionId, QuestionKind, QuestionOption, Quiz, QuizEligibility, QuizId, QuizQuestion,
};
use lms_core::Clock;

use crate::error::QuizServiceError;

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// Display-only countdown for a timed quiz attempt.
///
/// Expiry is informational: submission after the limit is not blocked here,
/// matching the backend's behavior of accepting late submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizCountdown {
    started_at: DateTime<Utc>,
    limit: Duration,
}

impl QuizCountdown {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, limit_minutes: u32) -> Self {
        Self {
            started_at,
            limit: Duration::minutes(i64::from(limit_minutes)),
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time left on the clock, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.limit - (now - self.started_at);
        left.max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) == Duration::zero()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// A quiz with its ordered question bank.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDetail {
    pub quiz: Quiz,
    pub questions: Vec<QuizQuestion>,
}

/// A question as shown to the taker, with presentation order applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedQuestion {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub text: String,
    pub points: u32,
    pub options: Vec<QuestionOption>,
}

/// Quiz reads, presentation, and authoring over the quiz API.
#[derive(Clone)]
pub struct QuizService {
    quizzes: Arc<dyn QuizApi>,
    clock: Clock,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizApi>) -> Self {
        Self { quizzes, clock }
    }

    /// Fetch a quiz and its question bank, sorted by position.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Api` on fetch failures.
    pub async fn load(&self, id: QuizId) -> Result<QuizDetail, QuizServiceError> {
        let quiz = self.quizzes.get_quiz(id).await?;
        let mut questions = self.quizzes.list_questions(id).await?;
        questions.sort_by_key(|q| (q.position(), q.id()));
        Ok(QuizDetail { quiz, questions })
    }

    /// Eligibility of a quiz right now.
    #[must_use]
    pub fn eligibility(&self, quiz: &Quiz) -> QuizEligibility {
        quiz.eligibility(self.clock.now())
    }

    /// Gate an attempt on eligibility; returns the countdown for timed
    /// quizzes.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotTakeable` outside the availability
    /// window or for unpublished quizzes.
    pub fn start_attempt(&self, quiz: &Quiz) -> Result<Option<QuizCountdown>, QuizServiceError> {
        let now = self.clock.now();
        match quiz.eligibility(now) {
            QuizEligibility::Eligible => Ok(quiz
                .time_limit_minutes()
                .map(|minutes| QuizCountdown::new(now, minutes))),
            other => Err(QuizServiceError::NotTakeable(other)),
        }
    }

    /// Build the taker-facing question list, applying the quiz's shuffle
    /// flags. Stored order is left untouched.
    #[must_use]
    pub fn present(&self, detail: &QuizDetail) -> Vec<PresentedQuestion> {
        let mut rng = rng();
        let mut questions: Vec<PresentedQuestion> = detail
            .questions
            .iter()
            .map(|question| {
                let mut options = question.options().to_vec();
                if detail.quiz.shuffle_options() {
                    options.shuffle(&mut rng);
                }
                PresentedQuestion {
                    id: question.id(),
                    kind: question.kind(),
                    text: question.text().to_owned(),
                    points: question.points(),
                    options,
                }
            })
            .collect();
        if detail.quiz.shuffle_questions() {
            questions.shuffle(&mut rng);
        }
        questions
    }

    /// Author a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Api` when the backend rejects the
    /// payload.
    pub async fn add_question(
        &self,
        question: NewQuestion,
    ) -> Result<QuizQuestion, QuizServiceError> {
        Ok(self.quizzes.create_question(question).await?)
    }

    /// Delete a question by id.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Api` for missing ids or transport
    /// failures.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuizServiceError> {
        Ok(self.quizzes.delete_question(id).await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use api::InMemoryBackend;
    use lms_core::model::{QuestionDifficulty, QuizStatus};
    use lms_core::time::{fixed_clock, fixed_now};

    fn service() -> QuizService {
        QuizService::new(fixed_clock(), Arc::new(InMemoryBackend::new()))
    }

    fn build_quiz(status: QuizStatus, shuffle_questions: bool, shuffle_options: bool) -> Quiz {
        Quiz::new(
            QuizId::new(1),
            "Checkpoint",
            None,
            Some(10),
            Some(3),
            70,
            shuffle_questions,
            shuffle_options,
            status,
            None,
            None,
        )
        .unwrap()
    }

    fn build_question(id: u64, position: u32) -> QuizQuestion {
        QuizQuestion::new(
            QuestionId::new(id),
            QuizId::new(1),
            QuestionKind::SingleChoice,
            format!("Q{id}"),
            vec![
                QuestionOption::new("right", true),
                QuestionOption::new("wrong", false),
            ],
            1,
            position,
            QuestionDifficulty::Medium,
        )
        .unwrap()
    }

    #[test]
    fn countdown_counts_down_and_floors_at_zero() {
        let countdown = QuizCountdown::new(fixed_now(), 10);
        assert_eq!(
            countdown.remaining(fixed_now() + Duration::minutes(4)),
            Duration::minutes(6)
        );
        assert!(!countdown.is_expired(fixed_now() + Duration::minutes(9)));
        assert!(countdown.is_expired(fixed_now() + Duration::minutes(11)));
        assert_eq!(
            countdown.remaining(fixed_now() + Duration::minutes(30)),
            Duration::zero()
        );
    }

    #[test]
    fn start_attempt_gates_on_eligibility() {
        let service = service();
        let draft = build_quiz(QuizStatus::Draft, false, false);
        let err = service.start_attempt(&draft).unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::NotTakeable(QuizEligibility::Unavailable)
        ));

        let published = build_quiz(QuizStatus::Published, false, false);
        let countdown = service.start_attempt(&published).unwrap();
        assert_eq!(countdown, Some(QuizCountdown::new(fixed_now(), 10)));
    }

    #[test]
    fn untimed_quiz_has_no_countdown() {
        let service = service();
        let quiz = Quiz::new(
            QuizId::new(1),
            "Checkpoint",
            None,
            None,
            None,
            70,
            false,
            false,
            QuizStatus::Published,
            None,
            None,
        )
        .unwrap();
        assert_eq!(service.start_attempt(&quiz).unwrap(), None);
    }

    #[test]
    fn presentation_preserves_order_without_shuffle() {
        let service = service();
        let detail = QuizDetail {
            quiz: build_quiz(QuizStatus::Published, false, false),
            questions: vec![build_question(1, 0), build_question(2, 1)],
        };

        let presented = service.present(&detail);
        let ids: Vec<u64> = presented.iter().map(|q| q.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(presented[0].options[0].text, "right");
    }

    #[test]
    fn presentation_keeps_the_same_question_set_when_shuffling() {
        let service = service();
        let detail = QuizDetail {
            quiz: build_quiz(QuizStatus::Published, true, true),
            questions: (1..=6).map(|id| build_question(id, id as u32)).collect(),
        };

        let presented = service.present(&detail);
        let mut ids: Vec<u64> = presented.iter().map(|q| q.id.value()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        for question in &presented {
            assert_eq!(question.options.len(), 2);
        }
    }
}
