//! In-memory backend for tests, prototyping, and offline demo runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use lms_core::model::{
    Certificate, CertificateId, CertificateStatus, Course, CourseId, CourseModule, Enrollment,
    EnrollmentError, EnrollmentId, EnrollmentStatus, EnrollmentUpdate, Lesson, LessonId,
    QuestionId, Quiz, QuizId, QuizQuestion, Transaction, TransactionStatus, UserId,
};

use crate::error::ApiError;
use crate::gateway::{
    Backend, CatalogApi, CertificateApi, CertificateRequest, EnrollmentApi, LessonWithQuiz,
    NewQuestion, QuizApi, TransactionApi,
};
use crate::page::{paginate, ListQuery, Paginated};

#[derive(Default)]
struct State {
    courses: HashMap<CourseId, Course>,
    modules: HashMap<CourseId, Vec<CourseModule>>,
    lessons: HashMap<LessonId, Lesson>,
    quizzes: HashMap<QuizId, Quiz>,
    questions: HashMap<QuestionId, QuizQuestion>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    certificates: HashMap<CertificateId, Certificate>,
    transactions: Vec<Transaction>,
    next_id: u64,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Backend with all entities held in process memory.
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<State>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                next_id: 1000,
                ..State::default()
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        self.inner
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))
    }

    // Seeding (tests and the demo path).

    /// Stores a course record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_course(&self, course: Course) -> Result<(), ApiError> {
        self.lock()?.courses.insert(course.id(), course);
        Ok(())
    }

    /// Stores a module record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_module(&self, module: CourseModule) -> Result<(), ApiError> {
        self.lock()?
            .modules
            .entry(module.course_id())
            .or_default()
            .push(module);
        Ok(())
    }

    /// Stores a lesson record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_lesson(&self, lesson: Lesson) -> Result<(), ApiError> {
        self.lock()?.lessons.insert(lesson.id(), lesson);
        Ok(())
    }

    /// Stores a quiz record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_quiz(&self, quiz: Quiz) -> Result<(), ApiError> {
        self.lock()?.quizzes.insert(quiz.id(), quiz);
        Ok(())
    }

    /// Stores a question record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_question(&self, question: QuizQuestion) -> Result<(), ApiError> {
        self.lock()?.questions.insert(question.id(), question);
        Ok(())
    }

    /// Stores an enrollment record as-is.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_enrollment(&self, enrollment: Enrollment) -> Result<(), ApiError> {
        self.lock()?.enrollments.insert(enrollment.id(), enrollment);
        Ok(())
    }

    /// Stores a transaction record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the store is poisoned.
    pub fn seed_transaction(&self, transaction: Transaction) -> Result<(), ApiError> {
        self.lock()?.transactions.push(transaction);
        Ok(())
    }
}

fn status_matches(status: &Option<String>, name: &str) -> bool {
    match status {
        None => true,
        Some(wanted) => wanted.eq_ignore_ascii_case(name),
    }
}

fn enrollment_status_name(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::Active => "active",
        EnrollmentStatus::Completed => "completed",
        EnrollmentStatus::Paused => "paused",
        EnrollmentStatus::Cancelled => "cancelled",
    }
}

fn certificate_status_name(status: CertificateStatus) -> &'static str {
    match status {
        CertificateStatus::Issued => "issued",
        CertificateStatus::Processing => "processing",
        CertificateStatus::Revoked => "revoked",
    }
}

fn transaction_status_name(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Paid => "paid",
        TransactionStatus::Failed => "failed",
        TransactionStatus::Refunded => "refunded",
        TransactionStatus::Cancelled => "cancelled",
    }
}

#[async_trait]
impl CatalogApi for InMemoryBackend {
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        self.lock()?
            .courses
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<CourseModule>, ApiError> {
        Ok(self
            .lock()?
            .modules
            .get(&course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_lessons_with_quiz(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonWithQuiz>, ApiError> {
        let state = self.lock()?;
        let module_ids: Vec<_> = state
            .modules
            .get(&course_id)
            .map(|modules| modules.iter().map(CourseModule::id).collect())
            .unwrap_or_default();

        let mut lessons: Vec<LessonWithQuiz> = state
            .lessons
            .values()
            .filter(|lesson| module_ids.contains(&lesson.module_id()))
            .map(|lesson| LessonWithQuiz {
                quiz: lesson.quiz_id().and_then(|id| state.quizzes.get(&id).cloned()),
                lesson: lesson.clone(),
            })
            .collect();
        lessons.sort_by_key(|l| l.lesson.id());
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentApi for InMemoryBackend {
    async fn enroll(&self, user: UserId, course: CourseId) -> Result<Enrollment, ApiError> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .enrollments
            .values()
            .find(|e| e.user_id() == user && e.course_id() == course)
        {
            return Ok(existing.clone());
        }

        if !state.courses.contains_key(&course) {
            return Err(ApiError::NotFound);
        }

        let id = EnrollmentId::new(state.allocate_id());
        let enrollment = Enrollment::start(id, user, course, Utc::now());
        state.enrollments.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    async fn update(
        &self,
        id: EnrollmentId,
        update: &EnrollmentUpdate,
    ) -> Result<Enrollment, ApiError> {
        let mut state = self.lock()?;
        let current = state.enrollments.get(&id).ok_or(ApiError::NotFound)?;
        let next = current.apply(update).map_err(|e| match e {
            EnrollmentError::AlreadyCompleted => ApiError::Conflict,
            other => ApiError::Invalid(other.to_string()),
        })?;
        state.enrollments.insert(id, next.clone());
        Ok(next)
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Enrollment>, ApiError> {
        let state = self.lock()?;
        let mut items: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|e| status_matches(&query.status, enrollment_status_name(e.status())))
            .cloned()
            .collect();
        items.sort_by_key(Enrollment::id);
        Ok(paginate(&items, query))
    }
}

#[async_trait]
impl QuizApi for InMemoryBackend {
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        self.lock()?
            .quizzes
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_questions(&self, quiz: QuizId) -> Result<Vec<QuizQuestion>, ApiError> {
        let mut questions: Vec<QuizQuestion> = self
            .lock()?
            .questions
            .values()
            .filter(|q| q.quiz_id() == quiz)
            .cloned()
            .collect();
        questions.sort_by_key(QuizQuestion::id);
        Ok(questions)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<QuizQuestion, ApiError> {
        let mut state = self.lock()?;
        if !state.quizzes.contains_key(&question.quiz_id) {
            return Err(ApiError::NotFound);
        }

        let id = QuestionId::new(state.allocate_id());
        let created = QuizQuestion::new(
            id,
            question.quiz_id,
            question.kind,
            question.text,
            question.options,
            question.points,
            question.position,
            question.difficulty,
        )
        .map_err(|e| ApiError::Invalid(e.to_string()))?;
        state.questions.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), ApiError> {
        self.lock()?
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl CertificateApi for InMemoryBackend {
    async fn find(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Certificate>, ApiError> {
        Ok(self
            .lock()?
            .certificates
            .values()
            .find(|c| c.user_id == user && c.course_id == course)
            .cloned())
    }

    async fn issue(&self, request: &CertificateRequest) -> Result<Certificate, ApiError> {
        // Uniqueness per (user, course) is not enforced; double-issue
        // stays observable.
        let mut state = self.lock()?;
        let id = CertificateId::new(state.allocate_id());
        let certificate = Certificate {
            id,
            user_id: request.user_id,
            course_id: request.course_id,
            certificate_number: format!("CERT-{}", Uuid::new_v4().simple()),
            issued_at: Utc::now(),
            grade: request.grade.clone(),
            hours: request.hours,
            status: CertificateStatus::Issued,
        };
        state.certificates.insert(id, certificate.clone());
        Ok(certificate)
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Certificate>, ApiError> {
        let state = self.lock()?;
        let mut items: Vec<Certificate> = state
            .certificates
            .values()
            .filter(|c| status_matches(&query.status, certificate_status_name(c.status)))
            .filter(|c| match &query.q {
                None => true,
                Some(q) => c.certificate_number.contains(q.as_str()),
            })
            .cloned()
            .collect();
        items.sort_by_key(|c| c.id);
        Ok(paginate(&items, query))
    }
}

#[async_trait]
impl TransactionApi for InMemoryBackend {
    async fn list(&self, query: &ListQuery) -> Result<Paginated<Transaction>, ApiError> {
        let state = self.lock()?;
        let mut items: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| status_matches(&query.status, transaction_status_name(t.status)))
            .filter(|t| match &query.q {
                None => true,
                Some(q) => t.currency.eq_ignore_ascii_case(q),
            })
            .cloned()
            .collect();
        items.sort_by_key(|t| t.id);
        Ok(paginate(&items, query))
    }
}

impl Backend {
    /// Build a `Backend` with all surfaces held in process memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(InMemoryBackend::new())
    }

    /// Build a `Backend` over an existing in-memory store, keeping a handle
    /// for seeding.
    #[must_use]
    pub fn from_memory(store: InMemoryBackend) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            enrollments: Arc::new(store.clone()),
            quizzes: Arc::new(store.clone()),
            certificates: Arc::new(store.clone()),
            transactions: Arc::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{CourseLevel, LessonKind, ModuleId};
    use lms_core::time::fixed_now;

    fn seed_basic(store: &InMemoryBackend) {
        let course = Course::new(
            CourseId::new(1),
            "Rust 101",
            None,
            CourseLevel::Beginner,
            "en",
            0.0,
            60,
            true,
            None,
            UserId::new(9),
            fixed_now(),
        )
        .unwrap();
        store.seed_course(course).unwrap();
        store
            .seed_module(
                CourseModule::new(ModuleId::new(1), CourseId::new(1), "Basics", 0, fixed_now())
                    .unwrap(),
            )
            .unwrap();
        store
            .seed_lesson(
                Lesson::new(
                    LessonId::new(1),
                    ModuleId::new(1),
                    "Intro",
                    LessonKind::Video,
                    0,
                    300,
                    true,
                    None,
                    None,
                    fixed_now(),
                )
                .unwrap(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn enroll_is_fetch_or_create() {
        let store = InMemoryBackend::new();
        seed_basic(&store);

        let first = store.enroll(UserId::new(7), CourseId::new(1)).await.unwrap();
        let second = store.enroll(UserId::new(7), CourseId::new(1)).await.unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[tokio::test]
    async fn enroll_unknown_course_is_not_found() {
        let store = InMemoryBackend::new();
        let err = store
            .enroll(UserId::new(7), CourseId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn update_after_completion_is_conflict() {
        let store = InMemoryBackend::new();
        seed_basic(&store);
        let enrollment = store.enroll(UserId::new(7), CourseId::new(1)).await.unwrap();

        let complete = EnrollmentUpdate {
            current_lesson: LessonId::new(1),
            current_module: ModuleId::new(1),
            progress: 100,
            completed_at: Some(Utc::now()),
            last_accessed_at: Utc::now(),
        };
        let done = store.update(enrollment.id(), &complete).await.unwrap();
        assert!(done.is_completed());

        let followup = EnrollmentUpdate {
            completed_at: None,
            progress: 10,
            ..complete
        };
        let err = store.update(enrollment.id(), &followup).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict));
    }

    #[tokio::test]
    async fn lessons_embed_their_quiz() {
        let store = InMemoryBackend::new();
        seed_basic(&store);
        let quiz = Quiz::new(
            QuizId::new(5),
            "Checkpoint",
            None,
            None,
            None,
            70,
            false,
            false,
            lms_core::model::QuizStatus::Published,
            None,
            None,
        )
        .unwrap();
        store.seed_quiz(quiz).unwrap();
        store
            .seed_lesson(
                Lesson::new(
                    LessonId::new(2),
                    ModuleId::new(1),
                    "Quiz",
                    LessonKind::Quiz,
                    1,
                    0,
                    false,
                    None,
                    Some(QuizId::new(5)),
                    fixed_now(),
                )
                .unwrap(),
            )
            .unwrap();

        let lessons = store.list_lessons_with_quiz(CourseId::new(1)).await.unwrap();
        assert_eq!(lessons.len(), 2);
        let quiz_lesson = lessons.iter().find(|l| l.lesson.is_quiz()).unwrap();
        assert!(quiz_lesson.quiz.is_some());
    }

    #[tokio::test]
    async fn double_issue_creates_two_certificates() {
        let store = InMemoryBackend::new();
        let request = CertificateRequest {
            user_id: UserId::new(7),
            course_id: CourseId::new(1),
            grade: None,
            hours: None,
        };

        let first = store.issue(&request).await.unwrap();
        let second = store.issue(&request).await.unwrap();
        assert_ne!(first.id, second.id);

        let listed = CertificateApi::list(&store, &ListQuery::new()).await.unwrap();
        assert_eq!(listed.total, 2);
    }
}
