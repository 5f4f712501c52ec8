use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use api::{ApiError, EnrollmentApi};
use lms_core::model::{Enrollment, EnrollmentUpdate};

//
// ─── RETRY POLICY ──────────────────────────────────────────────────────────────
//

/// Bounded exponential backoff for background enrollment sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given 1-based attempt: `base * 2^(attempt - 1)`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

//
// ─── SYNC GATEWAY ──────────────────────────────────────────────────────────────
//

/// Result of one background sync, surfaced to the caller instead of being
/// swallowed; a failed sync is non-blocking but visible.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The server accepted the update; carries the authoritative echo.
    Synced(Enrollment),
    /// The enrollment is completed; nothing was sent (hard stop).
    AlreadyCompleted,
    /// All attempts failed; the last error is attached.
    Failed { attempts: u32, error: ApiError },
}

impl SyncOutcome {
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}

/// Pushes enrollment position/progress to the backend with retries.
#[derive(Clone)]
pub struct EnrollmentSync {
    enrollments: Arc<dyn EnrollmentApi>,
    policy: RetryPolicy,
}

impl EnrollmentSync {
    #[must_use]
    pub fn new(enrollments: Arc<dyn EnrollmentApi>) -> Self {
        Self {
            enrollments,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Push an update for the enrollment, retrying transient failures.
    ///
    /// Suppressed entirely once the enrollment is completed. Non-transient
    /// rejections fail immediately; transient ones retry up to the policy's
    /// attempt limit with exponential backoff. Every failure is logged and
    /// the final outcome is returned for the caller to surface.
    pub async fn push(&self, enrollment: &Enrollment, update: EnrollmentUpdate) -> SyncOutcome {
        if enrollment.is_completed() {
            debug!(enrollment = %enrollment.id(), "skipping sync for completed enrollment");
            return SyncOutcome::AlreadyCompleted;
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.enrollments.update(enrollment.id(), &update).await {
                Ok(echo) => {
                    debug!(
                        enrollment = %enrollment.id(),
                        progress = update.progress,
                        "enrollment sync ok"
                    );
                    return SyncOutcome::Synced(echo);
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_before(attempt + 1);
                    warn!(
                        enrollment = %enrollment.id(),
                        attempt,
                        ?delay,
                        %error,
                        "enrollment sync failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(
                        enrollment = %enrollment.id(),
                        attempts = attempt,
                        %error,
                        "enrollment sync giving up"
                    );
                    return SyncOutcome::Failed {
                        attempts: attempt,
                        error,
                    };
                }
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
