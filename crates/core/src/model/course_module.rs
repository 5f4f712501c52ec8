use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,
}

/// A titled group of lessons within a course, ordered by `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseModule {
    id: ModuleId,
    course_id: CourseId,
    title: String,
    position: u32,
    created_at: DateTime<Utc>,
}

impl CourseModule {
    /// Creates a new module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: ModuleId,
        course_id: CourseId,
        title: impl Into<String>,
        position: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }

        Ok(Self {
            id,
            course_id,
            title: title.trim().to_owned(),
            position,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
