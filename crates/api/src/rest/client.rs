use std::env;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use lms_core::model::{
    Certificate, Course, CourseId, CourseModule, Enrollment, EnrollmentId, EnrollmentUpdate,
    QuestionId, Quiz, QuizId, QuizQuestion, Transaction, UserId,
};

use crate::error::ApiError;
use crate::gateway::{
    CatalogApi, CertificateApi, CertificateRequest, EnrollmentApi, LessonWithQuiz, NewQuestion,
    QuizApi, TransactionApi,
};
use crate::page::{ListQuery, Paginated};
use crate::rest::wire::{
    CertificateDto, CertificateRequestDto, CourseDto, EnrollRequestDto, EnrollmentDto,
    EnrollmentUpdateDto, LessonDto, ModuleDto, NewQuestionDto, PageDto, QuestionDto, QuizDto,
    TransactionDto,
};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Explicit connection settings for the REST backend. Built once and passed
/// downward; there is no ambient singleton.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Reads `LMS_API_URL` and the optional `LMS_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LMS_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let bearer_token = env::var("LMS_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self {
            base_url,
            bearer_token,
        })
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// Thin reqwest wrapper implementing the gateway traits against the REST
/// backend. One attempt per call; retry policy lives with the caller.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: ApiConfig,
}

impl RestClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.config.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn check(response: Response) -> Result<Response, ApiError> {
        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            StatusCode::CONFLICT => Err(ApiError::Conflict),
            status if !status.is_success() => Err(ApiError::Status(status)),
            _ => Ok(response),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path).json(body).send().await?;
        Ok(Self::check(response)?.json().await?)
    }
}

//
// ─── TRAIT IMPLS ───────────────────────────────────────────────────────────────
//

#[async_trait]
impl CatalogApi for RestClient {
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        let dto: CourseDto = self.get_json(&format!("courses/{id}"), &[]).await?;
        dto.into_course()
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<CourseModule>, ApiError> {
        let dtos: Vec<ModuleDto> = self
            .get_json("modules", &[("courseId", course_id.to_string())])
            .await?;
        dtos.into_iter().map(ModuleDto::into_module).collect()
    }

    async fn list_lessons_with_quiz(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonWithQuiz>, ApiError> {
        let dtos: Vec<LessonDto> = self
            .get_json("lessons/with-quiz", &[("courseId", course_id.to_string())])
            .await?;
        dtos.into_iter()
            .map(LessonDto::into_lesson_with_quiz)
            .collect()
    }
}

#[async_trait]
impl EnrollmentApi for RestClient {
    async fn enroll(&self, user: UserId, course: CourseId) -> Result<Enrollment, ApiError> {
        let body = EnrollRequestDto {
            user_id: user.value(),
            course_id: course.value(),
        };
        let dto: EnrollmentDto = self.send_json(Method::POST, "enrollments/", &body).await?;
        dto.into_enrollment()
    }

    async fn update(
        &self,
        id: EnrollmentId,
        update: &EnrollmentUpdate,
    ) -> Result<Enrollment, ApiError> {
        let body = EnrollmentUpdateDto::from_update(update);
        let dto: EnrollmentDto = self
            .send_json(Method::PUT, &format!("enrollments/{id}"), &body)
            .await?;
        dto.into_enrollment()
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Enrollment>, ApiError> {
        let page: PageDto<EnrollmentDto> =
            self.get_json("enrollments", &query.to_pairs()).await?;
        page.into_page(EnrollmentDto::into_enrollment)
    }
}

#[async_trait]
impl QuizApi for RestClient {
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        let dto: QuizDto = self.get_json(&format!("quizzes/{id}"), &[]).await?;
        dto.into_quiz()
    }

    async fn list_questions(&self, quiz: QuizId) -> Result<Vec<QuizQuestion>, ApiError> {
        let dtos: Vec<QuestionDto> = self
            .get_json(&format!("quizzes/{quiz}/questions"), &[])
            .await?;
        dtos.into_iter().map(QuestionDto::into_question).collect()
    }

    async fn create_question(&self, question: NewQuestion) -> Result<QuizQuestion, ApiError> {
        let body = NewQuestionDto::from_request(question);
        let dto: QuestionDto = self
            .send_json(Method::POST, "quizzes/questions", &body)
            .await?;
        dto.into_question()
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("quizzes/questions/{id}"))
            .send()
            .await?;
        Self::check(response).map(|_| ())
    }
}

#[async_trait]
impl CertificateApi for RestClient {
    async fn find(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Certificate>, ApiError> {
        // The list endpoint only speaks page/limit/q/status, so the pair
        // lookup pages through and filters client-side.
        let mut page = 1_u32;
        loop {
            let query = ListQuery::new().with_page(page).with_limit(100);
            let batch: PageDto<CertificateDto> =
                self.get_json("certificates", &query.to_pairs()).await?;
            let total_pages = batch.total.div_ceil(100);
            for dto in batch.items {
                let certificate = dto.into_certificate()?;
                if certificate.user_id == user && certificate.course_id == course {
                    return Ok(Some(certificate));
                }
            }
            if u64::from(page) >= total_pages {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn issue(&self, request: &CertificateRequest) -> Result<Certificate, ApiError> {
        let body = CertificateRequestDto::from_request(request);
        let dto: CertificateDto = self.send_json(Method::POST, "certificates", &body).await?;
        dto.into_certificate()
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Certificate>, ApiError> {
        let page: PageDto<CertificateDto> =
            self.get_json("certificates", &query.to_pairs()).await?;
        page.into_page(CertificateDto::into_certificate)
    }
}

#[async_trait]
impl TransactionApi for RestClient {
    async fn list(&self, query: &ListQuery) -> Result<Paginated<Transaction>, ApiError> {
        let page: PageDto<TransactionDto> =
            self.get_json("transactions", &query.to_pairs()).await?;
        page.into_page(TransactionDto::into_transaction)
    }
}
