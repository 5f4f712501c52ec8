//! Ordered course catalog: modules with their lessons, plus the flattened
//! lesson sequence used as the canonical lesson index for progress math.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Course, CourseModule, Lesson, LessonId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("lesson {lesson} references unknown module {module}")]
    UnknownModule { lesson: LessonId, module: ModuleId },

    #[error("module {0} does not belong to this course")]
    ForeignModule(ModuleId),

    #[error("duplicate module id {0}")]
    DuplicateModule(ModuleId),

    #[error("duplicate lesson id {0}")]
    DuplicateLesson(LessonId),
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// A module together with its ordered lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleLessons {
    module: CourseModule,
    lessons: Vec<Lesson>,
}

impl ModuleLessons {
    #[must_use]
    pub fn module(&self) -> &CourseModule {
        &self.module
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }
}

/// Assembled, ordered view of one course.
///
/// Modules sort by `position` (ties by id); lessons within a module sort by
/// `position`, ties broken by `created_at`. The flattened sequence
/// concatenates all lessons in module-then-position order.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseCatalog {
    course: Course,
    modules: Vec<ModuleLessons>,
    // (module idx, lesson idx) per flattened position
    flat: Vec<(usize, usize)>,
    index: HashMap<LessonId, usize>,
}

impl CourseCatalog {
    /// Assembles a catalog from backend records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for lessons pointing at unknown modules,
    /// modules of another course, or duplicate ids.
    pub fn assemble(
        course: Course,
        mut modules: Vec<CourseModule>,
        lessons: Vec<Lesson>,
    ) -> Result<Self, CatalogError> {
        modules.sort_by_key(|m| (m.position(), m.id()));

        let mut module_index = HashMap::with_capacity(modules.len());
        for (idx, module) in modules.iter().enumerate() {
            if module.course_id() != course.id() {
                return Err(CatalogError::ForeignModule(module.id()));
            }
            if module_index.insert(module.id(), idx).is_some() {
                return Err(CatalogError::DuplicateModule(module.id()));
            }
        }

        let mut buckets: Vec<Vec<Lesson>> = modules.iter().map(|_| Vec::new()).collect();
        for lesson in lessons {
            let Some(&idx) = module_index.get(&lesson.module_id()) else {
                return Err(CatalogError::UnknownModule {
                    lesson: lesson.id(),
                    module: lesson.module_id(),
                });
            };
            buckets[idx].push(lesson);
        }
        for bucket in &mut buckets {
            bucket.sort_by_key(|l| (l.position(), l.created_at(), l.id()));
        }

        let mut flat = Vec::new();
        let mut index = HashMap::new();
        for (module_idx, bucket) in buckets.iter().enumerate() {
            for (lesson_idx, lesson) in bucket.iter().enumerate() {
                if index.insert(lesson.id(), flat.len()).is_some() {
                    return Err(CatalogError::DuplicateLesson(lesson.id()));
                }
                flat.push((module_idx, lesson_idx));
            }
        }

        let modules = modules
            .into_iter()
            .zip(buckets)
            .map(|(module, lessons)| ModuleLessons { module, lessons })
            .collect();

        Ok(Self {
            course,
            modules,
            flat,
            index,
        })
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn modules(&self) -> &[ModuleLessons] {
        &self.modules
    }

    /// Length of the flattened lesson sequence.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.flat.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Lesson at the given flattened index.
    #[must_use]
    pub fn lesson_at(&self, index: usize) -> Option<&Lesson> {
        let &(module_idx, lesson_idx) = self.flat.get(index)?;
        Some(&self.modules[module_idx].lessons[lesson_idx])
    }

    /// Module containing the lesson at the given flattened index.
    #[must_use]
    pub fn module_at(&self, index: usize) -> Option<&CourseModule> {
        let &(module_idx, _) = self.flat.get(index)?;
        Some(&self.modules[module_idx].module)
    }

    /// Flattened index of a lesson id.
    #[must_use]
    pub fn index_of(&self, lesson: LessonId) -> Option<usize> {
        self.index.get(&lesson).copied()
    }

    /// Module owning a lesson id.
    #[must_use]
    pub fn module_of(&self, lesson: LessonId) -> Option<&CourseModule> {
        self.module_at(self.index_of(lesson)?)
    }

    /// Iterates the flattened lesson sequence in order.
    pub fn flattened(&self) -> impl Iterator<Item = &Lesson> {
        self.flat
            .iter()
            .map(|&(module_idx, lesson_idx)| &self.modules[module_idx].lessons[lesson_idx])
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
