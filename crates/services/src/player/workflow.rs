use std::sync::Arc;

use api::{CatalogApi, EnrollmentApi};
use lms_core::model::{CourseId, UserId};
use lms_core::Clock;

use crate::catalog_loader::CatalogLoader;
use crate::error::PlayerError;
use super::session::PlayerSession;
use super::sync::{EnrollmentSync, RetryPolicy, SyncOutcome};

/// Orchestrates player startup and persisted navigation.
///
/// Every navigation or observed completion pushes state through the sync
/// gateway and feeds the server echo back into the session; once the
/// effective completed set covers the course, the final completion update
/// goes out exactly once and the gateway stops.
#[derive(Clone)]
pub struct PlayerLoopService {
    clock: Clock,
    catalog: Arc<dyn CatalogApi>,
    enrollments: Arc<dyn EnrollmentApi>,
    sync: EnrollmentSync,
}

impl PlayerLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogApi>,
        enrollments: Arc<dyn EnrollmentApi>,
    ) -> Self {
        let sync = EnrollmentSync::new(Arc::clone(&enrollments));
        Self {
            clock,
            catalog,
            enrollments,
            sync,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.sync = self.sync.with_policy(policy);
        self
    }

    /// Load the catalog, fetch-or-create the enrollment, and open a
    /// session resumed at the enrollment's current lesson.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` for load failures, empty courses, or a
    /// mismatched enrollment.
    pub async fn start(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<PlayerSession, PlayerError> {
        let loaded = CatalogLoader::new(Arc::clone(&self.catalog))
            .load(course)
            .await?;
        let enrollment = self.enrollments.enroll(user, course).await?;
        PlayerSession::new(loaded, enrollment)
    }

    /// Jump to a lesson and push the new position.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::LessonOutOfRange` for a bad index; sync
    /// failures come back in the `SyncOutcome`, not as errors.
    pub async fn go_to_lesson(
        &self,
        session: &mut PlayerSession,
        index: usize,
    ) -> Result<SyncOutcome, PlayerError> {
        session.go_to(index)?;
        Ok(self.push_state(session).await)
    }

    /// Advance to the next lesson, if any, and push the new position.
    pub async fn advance(&self, session: &mut PlayerSession) -> Option<SyncOutcome> {
        session.advance()?;
        Some(self.push_state(session).await)
    }

    /// Record that the current video finished and push the resulting state.
    pub async fn note_video_ended(&self, session: &mut PlayerSession) -> SyncOutcome {
        session.mark_current_video_ended();
        self.push_state(session).await
    }

    async fn push_state(&self, session: &mut PlayerSession) -> SyncOutcome {
        let now = self.clock.now();
        let update = if session.all_lessons_completed() && !session.enrollment().is_completed() {
            session.completion_payload(now)
        } else {
            session.position_payload(now)
        };

        let outcome = self.sync.push(session.enrollment(), update).await;
        if let SyncOutcome::Synced(echo) = &outcome {
            session.set_enrollment(echo.clone());
        }
        outcome
    }
}
