use std::sync::Arc;

use tracing::info;

use api::{CertificateApi, CertificateRequest};
use lms_core::model::{Certificate, Enrollment};

use crate::error::CertificateServiceError;

/// Certificate viewing with issue-on-first-view.
///
/// Uniqueness per (user, course) is the backend's contract; the
/// fetch-before-issue here narrows the duplicate window but does not close
/// it.
#[derive(Clone)]
pub struct CertificateService {
    certificates: Arc<dyn CertificateApi>,
}

impl CertificateService {
    #[must_use]
    pub fn new(certificates: Arc<dyn CertificateApi>) -> Self {
        Self { certificates }
    }

    /// Return the certificate for a completed enrollment, issuing it on
    /// first view.
    ///
    /// # Errors
    ///
    /// Returns `CertificateServiceError::CourseNotCompleted` while the
    /// course is in progress, or `CertificateServiceError::Api` on gateway
    /// failures.
    pub async fn view(
        &self,
        enrollment: &Enrollment,
    ) -> Result<Certificate, CertificateServiceError> {
        if !enrollment.is_completed() {
            return Err(CertificateServiceError::CourseNotCompleted);
        }

        let user = enrollment.user_id();
        let course = enrollment.course_id();
        if let Some(existing) = self.certificates.find(user, course).await? {
            return Ok(existing);
        }

        let issued = self
            .certificates
            .issue(&CertificateRequest {
                user_id: user,
                course_id: course,
                grade: None,
                hours: None,
            })
            .await?;
        info!(%user, %course, number = %issued.certificate_number, "certificate issued");
        Ok(issued)
    }
}
