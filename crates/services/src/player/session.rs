use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use lms_core::catalog::CourseCatalog;
use lms_core::model::{
    CourseModule, Enrollment, EnrollmentUpdate, Lesson, LessonId, Quiz, QuizEligibility, QuizId,
};
use lms_core::progress::{computed_percent, effective_percent, CompletionTracker};

use crate::catalog_loader::LoadedCourse;
use crate::error::PlayerError;
use super::progress::PlayerProgress;

//
// ─── PLAYER SESSION ────────────────────────────────────────────────────────────
//

/// In-memory player state for one enrollment on one course.
///
/// Holds the assembled catalog, the completion tracker, and the current
/// flattened lesson index, resumed from the enrollment's current-lesson
/// pointer. Navigation and completion observations mutate this state; the
/// loop service decides when to push it to the backend.
pub struct PlayerSession {
    catalog: CourseCatalog,
    quizzes: HashMap<QuizId, Quiz>,
    enrollment: Enrollment,
    tracker: CompletionTracker,
    current: usize,
}

impl PlayerSession {
    /// Create a session over a loaded course and its enrollment.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::EmptyCourse` for a course with no lessons and
    /// `PlayerError::CourseMismatch` when the enrollment points elsewhere.
    pub fn new(loaded: LoadedCourse, enrollment: Enrollment) -> Result<Self, PlayerError> {
        let LoadedCourse { catalog, quizzes } = loaded;
        if catalog.is_empty() {
            return Err(PlayerError::EmptyCourse);
        }
        if enrollment.course_id() != catalog.course().id() {
            return Err(PlayerError::CourseMismatch {
                course: catalog.course().id(),
                enrollment_course: enrollment.course_id(),
            });
        }

        let current = enrollment
            .current_lesson()
            .and_then(|lesson| catalog.index_of(lesson))
            .unwrap_or(0);

        Ok(Self {
            catalog,
            quizzes,
            enrollment,
            tracker: CompletionTracker::new(),
            current,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn enrollment(&self) -> &Enrollment {
        &self.enrollment
    }

    /// Replace the local enrollment with the server echo so later
    /// precedence decisions see authoritative data.
    pub fn set_enrollment(&mut self, enrollment: Enrollment) {
        self.enrollment = enrollment;
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Lesson the viewer is on.
    ///
    /// # Panics
    ///
    /// Never panics: construction rejects empty catalogs and navigation
    /// rejects out-of-range indices.
    #[must_use]
    pub fn current_lesson(&self) -> &Lesson {
        self.catalog
            .lesson_at(self.current)
            .expect("current index is always in range")
    }

    /// Module containing the current lesson.
    #[must_use]
    pub fn current_module(&self) -> &CourseModule {
        self.catalog
            .module_at(self.current)
            .expect("current index is always in range")
    }

    /// Jump to a flattened lesson index.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::LessonOutOfRange` past the end of the course.
    pub fn go_to(&mut self, index: usize) -> Result<(), PlayerError> {
        if index >= self.catalog.total_lessons() {
            return Err(PlayerError::LessonOutOfRange {
                index,
                total: self.catalog.total_lessons(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Move to the next lesson, if any. Returns the new index.
    pub fn advance(&mut self) -> Option<usize> {
        if self.current + 1 < self.catalog.total_lessons() {
            self.current += 1;
            Some(self.current)
        } else {
            None
        }
    }

    /// Record that the current lesson's video finished playing.
    pub fn mark_current_video_ended(&mut self) {
        let id = self.current_lesson().id();
        self.tracker.observe(id);
    }

    /// Record a completion signal for an arbitrary lesson.
    pub fn observe_completion(&mut self, lesson: LessonId) {
        self.tracker.observe(lesson);
    }

    /// Merge completions the server already knows about.
    pub fn merge_server_completions(&mut self, lessons: impl IntoIterator<Item = LessonId>) {
        self.tracker.extend_server(lessons);
    }

    /// True once the effective completed set covers every lesson.
    #[must_use]
    pub fn all_lessons_completed(&self) -> bool {
        self.completed_count() == self.catalog.total_lessons()
    }

    fn completed_count(&self) -> usize {
        self.tracker.completed_count(
            &self.catalog,
            self.current,
            self.enrollment.is_completed(),
        )
    }

    /// Progress snapshot with the display precedence applied.
    #[must_use]
    pub fn progress(&self) -> PlayerProgress {
        let total = self.catalog.total_lessons();
        let completed = self.completed_count();
        let percent = effective_percent(&self.enrollment, computed_percent(completed, total));

        PlayerProgress {
            total,
            completed,
            percent,
            is_complete: self.enrollment.is_completed() || completed == total,
        }
    }

    /// Eligibility of the current lesson's quiz; `None` for video lessons.
    #[must_use]
    pub fn current_quiz_eligibility(&self, now: DateTime<Utc>) -> Option<QuizEligibility> {
        let lesson = self.current_lesson();
        if !lesson.is_quiz() {
            return None;
        }
        let quiz = lesson.quiz_id().and_then(|id| self.quizzes.get(&id));
        Some(QuizEligibility::resolve(quiz, now))
    }

    /// The position update to push after a navigation.
    #[must_use]
    pub fn position_payload(&self, now: DateTime<Utc>) -> EnrollmentUpdate {
        let total = self.catalog.total_lessons();
        let percent = effective_percent(
            &self.enrollment,
            computed_percent(self.completed_count(), total),
        );

        EnrollmentUpdate {
            current_lesson: self.current_lesson().id(),
            current_module: self.current_module().id(),
            progress: percent,
            completed_at: None,
            last_accessed_at: now,
        }
    }

    /// The final update: progress 100 with a completion stamp.
    #[must_use]
    pub fn completion_payload(&self, now: DateTime<Utc>) -> EnrollmentUpdate {
        EnrollmentUpdate {
            current_lesson: self.current_lesson().id(),
            current_module: self.current_module().id(),
            progress: 100,
            completed_at: Some(now),
            last_accessed_at: now,
        }
    }
}

impl fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSession")
            .field("course_id", &self.catalog.course().id())
            .field("enrollment_id", &self.enrollment.id())
            .field("current", &self.current)
            .field("total_lessons", &self.catalog.total_lessons())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{
        Course, CourseId, CourseLevel, CourseModule, EnrollmentId, EnrollmentStatus, LessonKind,
        ModuleId, UserId,
    };
    use lms_core::time::fixed_now;
    use std::collections::HashMap;

    fn loaded_course() -> LoadedCourse {
        let course = Course::new(
            CourseId::new(1),
            "Rust 101",
            None,
            CourseLevel::Beginner,
            "en",
            0.0,
            120,
            true,
            None,
            UserId::new(1),
            fixed_now(),
        )
        .unwrap();
        let modules = vec![
            CourseModule::new(ModuleId::new(1), CourseId::new(1), "A", 0, fixed_now()).unwrap(),
            CourseModule::new(ModuleId::new(2), CourseId::new(1), "B", 1, fixed_now()).unwrap(),
        ];
        let lesson = |id: u64, module: u64, position: u32| {
            Lesson::new(
                LessonId::new(id),
                ModuleId::new(module),
                format!("L{id}"),
                LessonKind::Video,
                position,
                300,
                false,
                None,
                None,
                fixed_now(),
            )
            .unwrap()
        };
        LoadedCourse {
            catalog: CourseCatalog::assemble(
                course,
                modules,
                vec![lesson(1, 1, 0), lesson(2, 1, 1), lesson(3, 2, 0)],
            )
            .unwrap(),
            quizzes: HashMap::new(),
        }
    }

    fn fresh_enrollment() -> Enrollment {
        Enrollment::start(
            EnrollmentId::new(10),
            UserId::new(1),
            CourseId::new(1),
            fixed_now(),
        )
    }

    #[test]
    fn session_resumes_from_enrollment_pointer() {
        let enrollment = Enrollment::from_persisted(
            EnrollmentId::new(10),
            UserId::new(1),
            CourseId::new(1),
            EnrollmentStatus::Active,
            0,
            Some(ModuleId::new(2)),
            Some(LessonId::new(3)),
            fixed_now(),
            None,
            None,
        )
        .unwrap();

        let session = PlayerSession::new(loaded_course(), enrollment).unwrap();
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.current_lesson().id(), LessonId::new(3));
        assert_eq!(session.current_module().id(), ModuleId::new(2));
    }

    #[test]
    fn stale_pointer_falls_back_to_first_lesson() {
        let enrollment = Enrollment::from_persisted(
            EnrollmentId::new(10),
            UserId::new(1),
            CourseId::new(1),
            EnrollmentStatus::Active,
            0,
            None,
            Some(LessonId::new(404)),
            fixed_now(),
            None,
            None,
        )
        .unwrap();

        let session = PlayerSession::new(loaded_course(), enrollment).unwrap();
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn mismatched_course_is_rejected() {
        let enrollment = Enrollment::start(
            EnrollmentId::new(10),
            UserId::new(1),
            CourseId::new(99),
            fixed_now(),
        );
        let err = PlayerSession::new(loaded_course(), enrollment).unwrap_err();
        assert!(matches!(err, PlayerError::CourseMismatch { .. }));
    }

    #[test]
    fn empty_course_is_rejected() {
        let course = Course::new(
            CourseId::new(1),
            "Empty",
            None,
            CourseLevel::Beginner,
            "en",
            0.0,
            0,
            true,
            None,
            UserId::new(1),
            fixed_now(),
        )
        .unwrap();
        let loaded = LoadedCourse {
            catalog: CourseCatalog::assemble(course, vec![], vec![]).unwrap(),
            quizzes: HashMap::new(),
        };
        let err = PlayerSession::new(loaded, fresh_enrollment()).unwrap_err();
        assert!(matches!(err, PlayerError::EmptyCourse));
    }

    #[test]
    fn progress_uses_prefix_heuristic() {
        let mut session = PlayerSession::new(loaded_course(), fresh_enrollment()).unwrap();
        session.go_to(2).unwrap();

        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percent, 67);
        assert!(!progress.is_complete);
    }

    #[test]
    fn completed_enrollment_renders_100_regardless_of_local_state() {
        let enrollment = Enrollment::from_persisted(
            EnrollmentId::new(10),
            UserId::new(1),
            CourseId::new(1),
            EnrollmentStatus::Active,
            40,
            None,
            None,
            fixed_now(),
            Some(fixed_now()),
            None,
        )
        .unwrap();

        let session = PlayerSession::new(loaded_course(), enrollment).unwrap();
        let progress = session.progress();
        assert_eq!(progress.percent, 100);
        assert!(progress.is_complete);
        assert_eq!(progress.completed, 3);
    }

    #[test]
    fn video_end_on_last_lesson_completes_the_course() {
        let mut session = PlayerSession::new(loaded_course(), fresh_enrollment()).unwrap();
        session.go_to(2).unwrap();
        assert!(!session.all_lessons_completed());

        session.mark_current_video_ended();
        assert!(session.all_lessons_completed());
    }

    #[test]
    fn go_to_rejects_out_of_range() {
        let mut session = PlayerSession::new(loaded_course(), fresh_enrollment()).unwrap();
        let err = session.go_to(3).unwrap_err();
        assert!(matches!(
            err,
            PlayerError::LessonOutOfRange { index: 3, total: 3 }
        ));
    }

    #[test]
    fn advance_stops_at_the_last_lesson() {
        let mut session = PlayerSession::new(loaded_course(), fresh_enrollment()).unwrap();
        assert_eq!(session.advance(), Some(1));
        assert_eq!(session.advance(), Some(2));
        assert_eq!(session.advance(), None);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn position_payload_reflects_current_state() {
        let mut session = PlayerSession::new(loaded_course(), fresh_enrollment()).unwrap();
        session.go_to(2).unwrap();

        let update = session.position_payload(fixed_now());
        assert_eq!(update.current_lesson, LessonId::new(3));
        assert_eq!(update.current_module, ModuleId::new(2));
        assert_eq!(update.progress, 67);
        assert_eq!(update.completed_at, None);
    }
}
