//! Shared error types for the services crate.

use thiserror::Error;

use api::ApiError;
use lms_core::catalog::CatalogError;
use lms_core::model::{CourseId, QuizEligibility};

/// Errors emitted by the player session and loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("course has no lessons")]
    EmptyCourse,

    #[error("enrollment belongs to course {enrollment_course}, not {course}")]
    CourseMismatch {
        course: CourseId,
        enrollment_course: CourseId,
    },

    #[error("lesson index {index} out of range ({total} lessons)")]
    LessonOutOfRange { index: usize, total: usize },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz is not currently takeable: {0:?}")]
    NotTakeable(QuizEligibility),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `CertificateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateServiceError {
    #[error("course is not completed yet")]
    CourseNotCompleted,

    #[error(transparent)]
    Api(#[from] ApiError),
}
