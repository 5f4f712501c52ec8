//! Completion tracking and progress math for the course player.
//!
//! The completed set combines three signals: lessons before the current
//! flattened index (a forward-only navigation heuristic, an approximation
//! rather than a guarantee, since the backend does not always report
//! per-lesson completion), lessons observed completed locally (video end
//! events), and lessons the server already flags as done.

use std::collections::HashSet;

use crate::catalog::CourseCatalog;
use crate::model::{Enrollment, LessonId};

//
// ─── COMPLETION TRACKER ────────────────────────────────────────────────────────
//

/// Tracks which lessons count as done for the current viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionTracker {
    observed: HashSet<LessonId>,
    server: HashSet<LessonId>,
}

impl CompletionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a locally observed completion (a video finished playing).
    pub fn observe(&mut self, lesson: LessonId) {
        self.observed.insert(lesson);
    }

    /// Merges lessons the server reports as completed.
    pub fn extend_server(&mut self, lessons: impl IntoIterator<Item = LessonId>) {
        self.server.extend(lessons);
    }

    #[must_use]
    pub fn observed(&self) -> &HashSet<LessonId> {
        &self.observed
    }

    #[must_use]
    pub fn server(&self) -> &HashSet<LessonId> {
        &self.server
    }

    /// The effective completed set for a catalog and current position.
    ///
    /// Union of the implicit prefix before `current_index`, the observed
    /// set, and the server set; a completed course counts everything.
    #[must_use]
    pub fn effective(
        &self,
        catalog: &CourseCatalog,
        current_index: usize,
        course_completed: bool,
    ) -> HashSet<LessonId> {
        if course_completed {
            return catalog.flattened().map(|l| l.id()).collect();
        }

        let mut completed: HashSet<LessonId> = catalog
            .flattened()
            .take(current_index)
            .map(|l| l.id())
            .collect();
        completed.extend(self.observed.iter().copied());
        completed.extend(self.server.iter().copied());
        // Local signals may mention lessons no longer in the catalog.
        completed.retain(|id| catalog.index_of(*id).is_some());
        completed
    }

    /// Number of effectively completed lessons.
    #[must_use]
    pub fn completed_count(
        &self,
        catalog: &CourseCatalog,
        current_index: usize,
        course_completed: bool,
    ) -> usize {
        self.effective(catalog, current_index, course_completed).len()
    }
}

//
// ─── PROGRESS MATH ─────────────────────────────────────────────────────────────
//

/// `round(100 * completed / total)` clamped to 0..=100; empty totals are 0.
#[must_use]
pub fn computed_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = (completed as f64) / (total as f64);
    let percent = (100.0 * ratio).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Precedence between server-reported and locally computed progress.
///
/// A completed enrollment reports 100 unconditionally; otherwise a positive
/// server value wins over the local estimate, which only fills in before
/// the first server round-trip.
#[must_use]
pub fn effective_percent(enrollment: &Enrollment, computed: u8) -> u8 {
    if enrollment.is_completed() {
        100
    } else if enrollment.progress() > 0 {
        enrollment.progress()
    } else {
        computed.min(100)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Course, CourseId, CourseLevel, CourseModule, EnrollmentId, EnrollmentStatus, Lesson,
        LessonKind, ModuleId, UserId,
    };
    use crate::time::fixed_now;
    use chrono::Duration;

    fn two_module_catalog() -> CourseCatalog {
        let course = Course::new(
            CourseId::new(1),
            "Rust 101",
            None,
            CourseLevel::Beginner,
            "en",
            0.0,
            120,
            true,
            None,
            UserId::new(1),
            fixed_now(),
        )
        .unwrap();
        let modules = vec![
            CourseModule::new(ModuleId::new(1), CourseId::new(1), "A", 0, fixed_now()).unwrap(),
            CourseModule::new(ModuleId::new(2), CourseId::new(1), "B", 1, fixed_now()).unwrap(),
        ];
        let lesson = |id: u64, module: u64, position: u32| {
            Lesson::new(
                LessonId::new(id),
                ModuleId::new(module),
                format!("L{id}"),
                LessonKind::Video,
                position,
                300,
                false,
                None,
                None,
                fixed_now(),
            )
            .unwrap()
        };
        CourseCatalog::assemble(
            course,
            modules,
            vec![lesson(1, 1, 0), lesson(2, 1, 1), lesson(3, 2, 0)],
        )
        .unwrap()
    }

    fn active_enrollment(progress: u8) -> Enrollment {
        Enrollment::from_persisted(
            EnrollmentId::new(1),
            UserId::new(1),
            CourseId::new(1),
            EnrollmentStatus::Active,
            progress,
            None,
            None,
            fixed_now(),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn prefix_before_current_index_counts_as_completed() {
        let catalog = two_module_catalog();
        let tracker = CompletionTracker::new();

        // Viewer on module B's lesson: flattened index 2 of 3.
        let effective = tracker.effective(&catalog, 2, false);
        assert_eq!(effective.len(), 2);
        assert!(effective.contains(&LessonId::new(1)));
        assert!(effective.contains(&LessonId::new(2)));
    }

    #[test]
    fn two_of_three_lessons_rounds_to_67() {
        let catalog = two_module_catalog();
        let tracker = CompletionTracker::new();
        let count = tracker.completed_count(&catalog, 2, false);
        assert_eq!(computed_percent(count, catalog.total_lessons()), 67);
    }

    #[test]
    fn observed_and_server_signals_union() {
        let catalog = two_module_catalog();
        let mut tracker = CompletionTracker::new();
        tracker.observe(LessonId::new(3));
        tracker.extend_server([LessonId::new(2)]);

        let effective = tracker.effective(&catalog, 0, false);
        assert_eq!(effective.len(), 2);
        assert!(effective.contains(&LessonId::new(2)));
        assert!(effective.contains(&LessonId::new(3)));
    }

    #[test]
    fn completed_course_counts_everything() {
        let catalog = two_module_catalog();
        let tracker = CompletionTracker::new();
        let effective = tracker.effective(&catalog, 0, true);
        assert_eq!(effective.len(), catalog.total_lessons());
    }

    #[test]
    fn signals_outside_the_catalog_are_dropped() {
        let catalog = two_module_catalog();
        let mut tracker = CompletionTracker::new();
        tracker.observe(LessonId::new(999));
        assert_eq!(tracker.completed_count(&catalog, 0, false), 0);
    }

    #[test]
    fn computed_percent_is_clamped() {
        assert_eq!(computed_percent(0, 0), 0);
        assert_eq!(computed_percent(0, 3), 0);
        assert_eq!(computed_percent(3, 3), 100);
        assert_eq!(computed_percent(5, 3), 100);
        assert_eq!(computed_percent(1, 3), 33);
        assert_eq!(computed_percent(2, 3), 67);
    }

    #[test]
    fn completed_enrollment_reports_100_unconditionally() {
        let enrollment = Enrollment::from_persisted(
            EnrollmentId::new(1),
            UserId::new(1),
            CourseId::new(1),
            EnrollmentStatus::Active,
            40,
            None,
            None,
            fixed_now(),
            Some(fixed_now() + Duration::days(1)),
            None,
        )
        .unwrap();
        assert_eq!(effective_percent(&enrollment, 10), 100);
    }

    #[test]
    fn positive_server_progress_wins_over_local() {
        let enrollment = active_enrollment(40);
        assert_eq!(effective_percent(&enrollment, 67), 40);
    }

    #[test]
    fn local_estimate_fills_in_before_first_round_trip() {
        let enrollment = active_enrollment(0);
        assert_eq!(effective_percent(&enrollment, 67), 67);
    }
}
