use std::sync::Arc;

use api::{
    ApiError, CertificateApi, EnrollmentApi, ListQuery, Paginated, TransactionApi,
};
use lms_core::model::{Certificate, Enrollment, Transaction};

/// Paginated list reads for the reporting entities.
#[derive(Clone)]
pub struct ReportsService {
    enrollments: Arc<dyn EnrollmentApi>,
    certificates: Arc<dyn CertificateApi>,
    transactions: Arc<dyn TransactionApi>,
}

impl ReportsService {
    #[must_use]
    pub fn new(
        enrollments: Arc<dyn EnrollmentApi>,
        certificates: Arc<dyn CertificateApi>,
        transactions: Arc<dyn TransactionApi>,
    ) -> Self {
        Self {
            enrollments,
            certificates,
            transactions,
        }
    }

    /// Enrollment listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on gateway failures.
    pub async fn enrollments(
        &self,
        query: &ListQuery,
    ) -> Result<Paginated<Enrollment>, ApiError> {
        self.enrollments.list(query).await
    }

    /// Certificate listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on gateway failures.
    pub async fn certificates(
        &self,
        query: &ListQuery,
    ) -> Result<Paginated<Certificate>, ApiError> {
        self.certificates.list(query).await
    }

    /// Transaction listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on gateway failures.
    pub async fn transactions(
        &self,
        query: &ListQuery,
    ) -> Result<Paginated<Transaction>, ApiError> {
        self.transactions.list(query).await
    }
}
