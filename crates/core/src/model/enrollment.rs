use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, EnrollmentId, LessonId, ModuleId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("enrollment is completed and accepts no further updates")]
    AlreadyCompleted,

    #[error("completion date is before enrollment date")]
    InvalidCompletionDate,
}

//
// ─── ENROLLMENT ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Paused,
    Cancelled,
}

/// Position/progress payload pushed to the backend when the viewer moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentUpdate {
    pub current_lesson: LessonId,
    pub current_module: ModuleId,
    pub progress: u8,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: DateTime<Utc>,
}

/// The record linking a student to a course, carrying progress and status.
///
/// Progress is clamped to 0..=100 on every construction path. Once the
/// enrollment is completed it is immutable: progress pins at 100 and
/// `apply` rejects further updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    id: EnrollmentId,
    user_id: UserId,
    course_id: CourseId,
    status: EnrollmentStatus,
    progress: u8,
    current_module: Option<ModuleId>,
    current_lesson: Option<LessonId>,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    last_accessed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// Creates a fresh, active enrollment with zero progress.
    #[must_use]
    pub fn start(
        id: EnrollmentId,
        user_id: UserId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            course_id,
            status: EnrollmentStatus::Active,
            progress: 0,
            current_module: None,
            current_lesson: None,
            enrolled_at,
            completed_at: None,
            last_accessed_at: None,
        }
    }

    /// Rehydrates an enrollment from a backend record.
    ///
    /// Progress is clamped to 0..=100; a completed enrollment is normalized
    /// to progress 100.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidCompletionDate` when `completed_at`
    /// precedes `enrolled_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: EnrollmentId,
        user_id: UserId,
        course_id: CourseId,
        status: EnrollmentStatus,
        progress: u8,
        current_module: Option<ModuleId>,
        current_lesson: Option<LessonId>,
        enrolled_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        last_accessed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, EnrollmentError> {
        if let Some(done) = completed_at {
            if done < enrolled_at {
                return Err(EnrollmentError::InvalidCompletionDate);
            }
        }

        let mut enrollment = Self {
            id,
            user_id,
            course_id,
            status,
            progress: progress.min(100),
            current_module,
            current_lesson,
            enrolled_at,
            completed_at,
            last_accessed_at,
        };
        if enrollment.is_completed() {
            enrollment.progress = 100;
        }
        Ok(enrollment)
    }

    /// True once the course is done: a completion date is set, progress
    /// reached 100, or the status says so.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
            || self.progress >= 100
            || self.status == EnrollmentStatus::Completed
    }

    /// Applies a position/progress update, as the backend would.
    ///
    /// Used by the in-memory backend; the REST backend applies the same
    /// rules server-side. The update's progress is clamped, and an update
    /// carrying a completion timestamp pins progress to 100 and flips the
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::AlreadyCompleted` once completed (hard
    /// stop) and `EnrollmentError::InvalidCompletionDate` for a completion
    /// timestamp before enrollment.
    pub fn apply(&self, update: &EnrollmentUpdate) -> Result<Self, EnrollmentError> {
        if self.is_completed() {
            return Err(EnrollmentError::AlreadyCompleted);
        }
        if let Some(done) = update.completed_at {
            if done < self.enrolled_at {
                return Err(EnrollmentError::InvalidCompletionDate);
            }
        }

        let mut next = self.clone();
        next.current_lesson = Some(update.current_lesson);
        next.current_module = Some(update.current_module);
        next.progress = update.progress.min(100);
        next.last_accessed_at = Some(update.last_accessed_at);
        if let Some(done) = update.completed_at {
            next.completed_at = Some(done);
            next.progress = 100;
            next.status = EnrollmentStatus::Completed;
        }
        Ok(next)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> EnrollmentId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn current_module(&self) -> Option<ModuleId> {
        self.current_module
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<LessonId> {
        self.current_lesson
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        self.last_accessed_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
