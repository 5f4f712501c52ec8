//! Trait seams for each backend surface, aggregated behind [`Backend`] so
//! services can swap the REST and in-memory implementations freely.

use std::sync::Arc;

use async_trait::async_trait;

use lms_core::model::{
    Certificate, Course, CourseId, CourseModule, Enrollment, EnrollmentId, EnrollmentUpdate,
    Lesson, QuestionDifficulty, QuestionId, QuestionKind, QuestionOption, Quiz, QuizId,
    QuizQuestion, Transaction, UserId,
};

use crate::error::ApiError;
use crate::page::{ListQuery, Paginated};

/// A lesson as returned by the catalog read, with its quiz embedded when
/// the lesson is a quiz and the record exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonWithQuiz {
    pub lesson: Lesson,
    pub quiz: Option<Quiz>,
}

/// Payload for authoring a new quiz question.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub quiz_id: QuizId,
    pub kind: QuestionKind,
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub points: u32,
    pub position: u32,
    pub difficulty: QuestionDifficulty,
}

/// Payload for certificate issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub grade: Option<String>,
    pub hours: Option<u32>,
}

/// Catalog reads: course metadata, module list, lesson list.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch course metadata by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for a missing course, or transport
    /// errors.
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError>;

    /// List a course's modules, order unspecified.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<CourseModule>, ApiError>;

    /// List a course's lessons with embedded quiz metadata.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list_lessons_with_quiz(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonWithQuiz>, ApiError>;
}

/// Enrollment lifecycle: fetch-or-create, position updates, listing.
#[async_trait]
pub trait EnrollmentApi: Send + Sync {
    /// Fetch-or-create the enrollment for a (user, course) pair.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn enroll(&self, user: UserId, course: CourseId) -> Result<Enrollment, ApiError>;

    /// Persist current lesson/module/progress, returning the server echo.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` when the enrollment is already
    /// completed (hard stop), `ApiError::NotFound` for a missing id.
    async fn update(
        &self,
        id: EnrollmentId,
        update: &EnrollmentUpdate,
    ) -> Result<Enrollment, ApiError>;

    /// Paginated enrollment listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list(&self, query: &ListQuery) -> Result<Paginated<Enrollment>, ApiError>;
}

/// Quiz detail, question bank, and authoring CRUD.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Fetch a quiz by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for a missing quiz.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError>;

    /// Fetch a quiz's question bank, order unspecified.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list_questions(&self, quiz: QuizId) -> Result<Vec<QuizQuestion>, ApiError>;

    /// Create a question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` when the payload fails validation.
    async fn create_question(&self, question: NewQuestion) -> Result<QuizQuestion, ApiError>;

    /// Delete a question by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for a missing question.
    async fn delete_question(&self, id: QuestionId) -> Result<(), ApiError>;
}

/// Certificate issuance and listing.
#[async_trait]
pub trait CertificateApi: Send + Sync {
    /// Find the certificate for a (user, course) pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn find(&self, user: UserId, course: CourseId)
    -> Result<Option<Certificate>, ApiError>;

    /// Issue a certificate. Uniqueness per (user, course) is the backend's
    /// contract; callers are expected to check `find` first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn issue(&self, request: &CertificateRequest) -> Result<Certificate, ApiError>;

    /// Paginated certificate listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list(&self, query: &ListQuery) -> Result<Paginated<Certificate>, ApiError>;
}

/// Read-only transaction reporting.
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Paginated transaction listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failures.
    async fn list(&self, query: &ListQuery) -> Result<Paginated<Transaction>, ApiError>;
}

/// Aggregates the backend surfaces behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub catalog: Arc<dyn CatalogApi>,
    pub enrollments: Arc<dyn EnrollmentApi>,
    pub quizzes: Arc<dyn QuizApi>,
    pub certificates: Arc<dyn CertificateApi>,
    pub transactions: Arc<dyn TransactionApi>,
}
