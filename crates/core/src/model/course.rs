use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course language cannot be empty")]
    EmptyLanguage,

    #[error("course price cannot be negative")]
    NegativePrice,
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Difficulty level advertised for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// A course as the catalog sees it: metadata only, read-only to the player.
///
/// Modules and lessons are separate records tied back by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    level: CourseLevel,
    language: String,
    price: f64,
    duration_minutes: u32,
    published: bool,
    category: Option<String>,
    instructor_id: UserId,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new Course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` or `CourseError::EmptyLanguage` if
    /// either field is empty or whitespace-only, and
    /// `CourseError::NegativePrice` for a price below zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        level: CourseLevel,
        language: impl Into<String>,
        price: f64,
        duration_minutes: u32,
        published: bool,
        category: Option<String>,
        instructor_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        let language = language.into();
        if language.trim().is_empty() {
            return Err(CourseError::EmptyLanguage);
        }
        if price < 0.0 {
            return Err(CourseError::NegativePrice);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        let category = category
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            level,
            language: language.trim().to_owned(),
            price,
            duration_minutes,
            published,
            category,
            instructor_id,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> CourseLevel {
        self.level
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn instructor_id(&self) -> UserId {
        self.instructor_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build(title: &str, language: &str, price: f64) -> Result<Course, CourseError> {
        Course::new(
            CourseId::new(1),
            title,
            None,
            CourseLevel::Beginner,
            language,
            price,
            90,
            true,
            None,
            UserId::new(5),
            fixed_now(),
        )
    }

    #[test]
    fn course_rejects_empty_title() {
        let err = build("   ", "en", 0.0).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn course_rejects_empty_language() {
        let err = build("Rust 101", " ", 0.0).unwrap_err();
        assert_eq!(err, CourseError::EmptyLanguage);
    }

    #[test]
    fn course_rejects_negative_price() {
        let err = build("Rust 101", "en", -1.0).unwrap_err();
        assert_eq!(err, CourseError::NegativePrice);
    }

    #[test]
    fn course_trims_fields() {
        let course = Course::new(
            CourseId::new(2),
            "  Rust 101  ",
            Some("   ".into()),
            CourseLevel::Advanced,
            " en ",
            49.99,
            120,
            false,
            Some("  programming  ".into()),
            UserId::new(9),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(course.title(), "Rust 101");
        assert_eq!(course.description(), None);
        assert_eq!(course.language(), "en");
        assert_eq!(course.category(), Some("programming"));
        assert!(!course.is_published());
    }
}
