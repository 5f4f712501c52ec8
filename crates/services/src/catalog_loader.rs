use std::collections::HashMap;
use std::sync::Arc;

use api::{CatalogApi, LessonWithQuiz};
use lms_core::catalog::CourseCatalog;
use lms_core::model::{CourseId, Quiz, QuizId};

use crate::error::PlayerError;

/// An assembled catalog plus the quiz records embedded in the lesson list,
/// keyed for eligibility lookups.
#[derive(Debug, Clone)]
pub struct LoadedCourse {
    pub catalog: CourseCatalog,
    pub quizzes: HashMap<QuizId, Quiz>,
}

/// Fetches course, modules, and lessons and assembles the ordered catalog.
///
/// One attempt per call; a failed fetch surfaces to the caller as a load
/// error with no retry.
#[derive(Clone)]
pub struct CatalogLoader {
    catalog: Arc<dyn CatalogApi>,
}

impl CatalogLoader {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    /// Load and assemble the catalog for a course.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Api` for fetch failures and
    /// `PlayerError::Catalog` when the records do not assemble.
    pub async fn load(&self, course_id: CourseId) -> Result<LoadedCourse, PlayerError> {
        let course = self.catalog.get_course(course_id).await?;
        let modules = self.catalog.list_modules(course_id).await?;
        let lessons = self.catalog.list_lessons_with_quiz(course_id).await?;

        let mut quizzes = HashMap::new();
        let lessons: Vec<_> = lessons
            .into_iter()
            .map(|LessonWithQuiz { lesson, quiz }| {
                if let Some(quiz) = quiz {
                    quizzes.insert(quiz.id(), quiz);
                }
                lesson
            })
            .collect();

        let catalog = CourseCatalog::assemble(course, modules, lessons)?;
        Ok(LoadedCourse { catalog, quizzes })
    }
}
