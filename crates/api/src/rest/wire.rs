//! Serde DTOs mirroring the backend's JSON, converted into domain types
//! through fallible mapping so malformed payloads surface as decode errors
//! instead of panics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lms_core::model::{
    Certificate, CertificateId, CertificateStatus, Course, CourseId, CourseLevel, CourseModule,
    Enrollment, EnrollmentId, EnrollmentStatus, EnrollmentUpdate, Lesson, LessonId, LessonKind,
    ModuleId, QuestionDifficulty, QuestionId, QuestionKind, QuestionOption, Quiz, QuizId,
    QuizQuestion, QuizStatus, Transaction, TransactionId, TransactionKind, TransactionStatus,
    UserId, VideoContent,
};

use crate::error::ApiError;
use crate::gateway::{CertificateRequest, LessonWithQuiz, NewQuestion};
use crate::page::Paginated;

fn bad<E: core::fmt::Display>(e: E) -> ApiError {
    ApiError::Decode(e.to_string())
}

//
// ─── ENUM PARSING ──────────────────────────────────────────────────────────────
//

fn parse_level(s: &str) -> Result<CourseLevel, ApiError> {
    match s {
        "beginner" => Ok(CourseLevel::Beginner),
        "intermediate" => Ok(CourseLevel::Intermediate),
        "advanced" => Ok(CourseLevel::Advanced),
        _ => Err(ApiError::Decode(format!("invalid course level: {s}"))),
    }
}

fn parse_lesson_kind(s: &str) -> Result<LessonKind, ApiError> {
    match s {
        "lesson" => Ok(LessonKind::Video),
        "quiz" => Ok(LessonKind::Quiz),
        _ => Err(ApiError::Decode(format!("invalid lesson type: {s}"))),
    }
}

fn parse_quiz_status(s: &str) -> Result<QuizStatus, ApiError> {
    match s {
        "draft" => Ok(QuizStatus::Draft),
        "published" => Ok(QuizStatus::Published),
        "archived" => Ok(QuizStatus::Archived),
        _ => Err(ApiError::Decode(format!("invalid quiz status: {s}"))),
    }
}

fn parse_question_kind(s: &str) -> Result<QuestionKind, ApiError> {
    match s {
        "single_choice" => Ok(QuestionKind::SingleChoice),
        "multiple_choice" => Ok(QuestionKind::MultipleChoice),
        "true_false" => Ok(QuestionKind::TrueFalse),
        "short_answer" => Ok(QuestionKind::ShortAnswer),
        _ => Err(ApiError::Decode(format!("invalid question type: {s}"))),
    }
}

pub(crate) fn question_kind_name(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::SingleChoice => "single_choice",
        QuestionKind::MultipleChoice => "multiple_choice",
        QuestionKind::TrueFalse => "true_false",
        QuestionKind::ShortAnswer => "short_answer",
    }
}

fn parse_difficulty(s: &str) -> Result<QuestionDifficulty, ApiError> {
    match s {
        "easy" => Ok(QuestionDifficulty::Easy),
        "medium" => Ok(QuestionDifficulty::Medium),
        "hard" => Ok(QuestionDifficulty::Hard),
        _ => Err(ApiError::Decode(format!("invalid difficulty: {s}"))),
    }
}

pub(crate) fn difficulty_name(difficulty: QuestionDifficulty) -> &'static str {
    match difficulty {
        QuestionDifficulty::Easy => "easy",
        QuestionDifficulty::Medium => "medium",
        QuestionDifficulty::Hard => "hard",
    }
}

fn parse_enrollment_status(s: &str) -> Result<EnrollmentStatus, ApiError> {
    match s {
        "active" => Ok(EnrollmentStatus::Active),
        "completed" => Ok(EnrollmentStatus::Completed),
        "paused" => Ok(EnrollmentStatus::Paused),
        "cancelled" => Ok(EnrollmentStatus::Cancelled),
        _ => Err(ApiError::Decode(format!("invalid enrollment status: {s}"))),
    }
}

fn parse_certificate_status(s: &str) -> Result<CertificateStatus, ApiError> {
    match s {
        "issued" => Ok(CertificateStatus::Issued),
        "processing" => Ok(CertificateStatus::Processing),
        "revoked" => Ok(CertificateStatus::Revoked),
        _ => Err(ApiError::Decode(format!("invalid certificate status: {s}"))),
    }
}

fn parse_transaction_kind(s: &str) -> Result<TransactionKind, ApiError> {
    match s {
        "purchase" => Ok(TransactionKind::Purchase),
        "refund" => Ok(TransactionKind::Refund),
        "payout" => Ok(TransactionKind::Payout),
        "adjustment" => Ok(TransactionKind::Adjustment),
        _ => Err(ApiError::Decode(format!("invalid transaction type: {s}"))),
    }
}

fn parse_transaction_status(s: &str) -> Result<TransactionStatus, ApiError> {
    match s {
        "pending" => Ok(TransactionStatus::Pending),
        "paid" => Ok(TransactionStatus::Paid),
        "failed" => Ok(TransactionStatus::Failed),
        "refunded" => Ok(TransactionStatus::Refunded),
        "cancelled" => Ok(TransactionStatus::Cancelled),
        _ => Err(ApiError::Decode(format!("invalid transaction status: {s}"))),
    }
}

/// Server progress may come back fractional; the domain carries a clamped
/// integer percent.
fn progress_to_percent(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

//
// ─── INCOMING DTOS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> PageDto<T> {
    pub(crate) fn into_page<U>(
        self,
        convert: impl Fn(T) -> Result<U, ApiError>,
    ) -> Result<Paginated<U>, ApiError> {
        let items = self
            .items
            .into_iter()
            .map(convert)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub level: String,
    pub language: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub category: Option<String>,
    pub instructor_id: u64,
    pub created_at: DateTime<Utc>,
}

impl CourseDto {
    pub(crate) fn into_course(self) -> Result<Course, ApiError> {
        Course::new(
            CourseId::new(self.id),
            self.title,
            self.description,
            parse_level(&self.level)?,
            self.language,
            self.price,
            self.duration,
            self.published,
            self.category,
            UserId::new(self.instructor_id),
            self.created_at,
        )
        .map_err(bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleDto {
    pub id: u64,
    pub course_id: u64,
    pub title: String,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

impl ModuleDto {
    pub(crate) fn into_module(self) -> Result<CourseModule, ApiError> {
        CourseModule::new(
            ModuleId::new(self.id),
            CourseId::new(self.course_id),
            self.title,
            self.position,
            self.created_at,
        )
        .map_err(bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoDto {
    pub url: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub attempts_allowed: Option<u32>,
    #[serde(default)]
    pub pass_mark: u8,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_options: bool,
    pub status: String,
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_until: Option<DateTime<Utc>>,
}

impl QuizDto {
    pub(crate) fn into_quiz(self) -> Result<Quiz, ApiError> {
        Quiz::new(
            QuizId::new(self.id),
            self.title,
            self.instructions,
            self.time_limit,
            self.attempts_allowed,
            self.pass_mark,
            self.shuffle_questions,
            self.shuffle_options,
            parse_quiz_status(&self.status)?,
            self.available_from,
            self.available_until,
        )
        .map_err(bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LessonDto {
    pub id: u64,
    pub module_id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: u32,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub preview: bool,
    #[serde(default)]
    pub video: Option<VideoDto>,
    #[serde(default)]
    pub quiz: Option<QuizDto>,
    #[serde(default)]
    pub quiz_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl LessonDto {
    pub(crate) fn into_lesson_with_quiz(self) -> Result<LessonWithQuiz, ApiError> {
        let quiz = self.quiz.map(QuizDto::into_quiz).transpose()?;
        let quiz_id = quiz
            .as_ref()
            .map(Quiz::id)
            .or(self.quiz_id.map(QuizId::new));
        let video = self
            .video
            .map(|v| VideoContent::new(v.url, v.duration, v.transcript))
            .transpose()
            .map_err(bad)?;

        let lesson = Lesson::new(
            LessonId::new(self.id),
            ModuleId::new(self.module_id),
            self.title,
            parse_lesson_kind(&self.kind)?,
            self.position,
            self.duration,
            self.preview,
            video,
            quiz_id,
            self.created_at,
        )
        .map_err(bad)?;

        Ok(LessonWithQuiz { lesson, quiz })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionOptionDto {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionDto {
    pub id: u64,
    pub quiz_id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<QuestionOptionDto>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
}

fn default_points() -> u32 {
    1
}

impl QuestionDto {
    pub(crate) fn into_question(self) -> Result<QuizQuestion, ApiError> {
        let options = self
            .options
            .into_iter()
            .map(|o| QuestionOption {
                text: o.text,
                correct: o.is_correct,
                explanation: o.explanation,
            })
            .collect();
        let difficulty = match self.difficulty.as_deref() {
            None => QuestionDifficulty::Medium,
            Some(raw) => parse_difficulty(raw)?,
        };

        QuizQuestion::new(
            QuestionId::new(self.id),
            QuizId::new(self.quiz_id),
            parse_question_kind(&self.kind)?,
            self.text,
            options,
            self.points,
            self.position,
            difficulty,
        )
        .map_err(bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollmentDto {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_module: Option<u64>,
    #[serde(default)]
    pub current_lesson: Option<u64>,
    pub enrollment_date: DateTime<Utc>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl EnrollmentDto {
    pub(crate) fn into_enrollment(self) -> Result<Enrollment, ApiError> {
        Enrollment::from_persisted(
            EnrollmentId::new(self.id),
            UserId::new(self.user_id),
            CourseId::new(self.course_id),
            parse_enrollment_status(&self.status)?,
            progress_to_percent(self.progress),
            self.current_module.map(ModuleId::new),
            self.current_lesson.map(LessonId::new),
            self.enrollment_date,
            self.completion_date,
            self.last_accessed,
        )
        .map_err(bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CertificateDto {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub hours: Option<u32>,
    #[serde(default = "default_certificate_status")]
    pub status: String,
}

fn default_certificate_status() -> String {
    "issued".to_owned()
}

impl CertificateDto {
    pub(crate) fn into_certificate(self) -> Result<Certificate, ApiError> {
        Ok(Certificate {
            id: CertificateId::new(self.id),
            user_id: UserId::new(self.user_id),
            course_id: CourseId::new(self.course_id),
            certificate_number: self.certificate_number,
            issued_at: self.issued_at,
            grade: self.grade,
            hours: self.hours,
            status: parse_certificate_status(&self.status)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionDto {
    pub id: u64,
    pub user_id: u64,
    pub course_id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub net: f64,
    pub created_at: DateTime<Utc>,
}

impl TransactionDto {
    pub(crate) fn into_transaction(self) -> Result<Transaction, ApiError> {
        Ok(Transaction {
            id: TransactionId::new(self.id),
            user_id: UserId::new(self.user_id),
            course_id: CourseId::new(self.course_id),
            kind: parse_transaction_kind(&self.kind)?,
            status: parse_transaction_status(&self.status)?,
            amount: self.amount,
            currency: self.currency,
            fee: self.fee,
            net: self.net,
            created_at: self.created_at,
        })
    }
}

//
// ─── OUTGOING DTOS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollRequestDto {
    pub user_id: u64,
    pub course_id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollmentUpdateDto {
    pub current_lesson: u64,
    pub current_module: u64,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
}

impl EnrollmentUpdateDto {
    pub(crate) fn from_update(update: &EnrollmentUpdate) -> Self {
        Self {
            current_lesson: update.current_lesson.value(),
            current_module: update.current_module.value(),
            progress: update.progress,
            completion_date: update.completed_at,
            last_accessed: update.last_accessed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewQuestionOptionDto {
    pub text: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewQuestionDto {
    pub quiz_id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    pub options: Vec<NewQuestionOptionDto>,
    pub points: u32,
    pub position: u32,
    pub difficulty: &'static str,
}

impl NewQuestionDto {
    pub(crate) fn from_request(question: NewQuestion) -> Self {
        Self {
            quiz_id: question.quiz_id.value(),
            kind: question_kind_name(question.kind),
            text: question.text,
            options: question
                .options
                .into_iter()
                .map(|o| NewQuestionOptionDto {
                    text: o.text,
                    is_correct: o.correct,
                    explanation: o.explanation,
                })
                .collect(),
            points: question.points,
            position: question.position,
            difficulty: difficulty_name(question.difficulty),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CertificateRequestDto {
    pub user_id: u64,
    pub course_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,
}

impl CertificateRequestDto {
    pub(crate) fn from_request(request: &CertificateRequest) -> Self {
        Self {
            user_id: request.user_id.value(),
            course_id: request.course_id.value(),
            grade: request.grade.clone(),
            hours: request.hours,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
