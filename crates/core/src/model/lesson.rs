use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::ids::{LessonId, ModuleId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("video url is not a valid url: {raw}")]
    InvalidVideoUrl { raw: String },

    #[error("video duration must be > 0")]
    InvalidVideoDuration,
}

//
// ─── VIDEO CONTENT ─────────────────────────────────────────────────────────────
//

/// Video payload attached to a video lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoContent {
    url: Url,
    duration_secs: u32,
    transcript: Option<String>,
}

impl VideoContent {
    /// Validates the raw url and duration into a video payload.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidVideoUrl` for an unparsable url and
    /// `LessonError::InvalidVideoDuration` for a zero duration.
    pub fn new(
        url: impl AsRef<str>,
        duration_secs: u32,
        transcript: Option<String>,
    ) -> Result<Self, LessonError> {
        let raw = url.as_ref().trim();
        let url = Url::parse(raw).map_err(|_| LessonError::InvalidVideoUrl {
            raw: raw.to_owned(),
        })?;
        if duration_secs == 0 {
            return Err(LessonError::InvalidVideoDuration);
        }

        let transcript = transcript
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        Ok(Self {
            url,
            duration_secs,
            transcript,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Kind of content a lesson carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonKind {
    Video,
    Quiz,
}

/// A single content unit within a module.
///
/// Ordering invariant: lessons within a module sort by `position`, ties
/// broken by `created_at` (enforced by catalog assembly, not here).
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    module_id: ModuleId,
    title: String,
    kind: LessonKind,
    position: u32,
    duration_secs: u32,
    preview: bool,
    video: Option<VideoContent>,
    quiz_id: Option<QuizId>,
    created_at: DateTime<Utc>,
}

impl Lesson {
    /// Creates a new lesson.
    ///
    /// A quiz lesson may carry no `quiz_id` when the quiz record has not
    /// been attached yet; eligibility resolution treats that as unavailable.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LessonId,
        module_id: ModuleId,
        title: impl Into<String>,
        kind: LessonKind,
        position: u32,
        duration_secs: u32,
        preview: bool,
        video: Option<VideoContent>,
        quiz_id: Option<QuizId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            module_id,
            title: title.trim().to_owned(),
            kind,
            position,
            duration_secs,
            preview,
            video,
            quiz_id,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> LessonKind {
        self.kind
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    #[must_use]
    pub fn video(&self) -> Option<&VideoContent> {
        self.video.as_ref()
    }

    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        self.quiz_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        self.kind == LessonKind::Quiz
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
