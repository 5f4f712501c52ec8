use std::sync::Arc;

use crate::gateway::{
    Backend, CatalogApi, CertificateApi, EnrollmentApi, QuizApi, TransactionApi,
};

mod client;
mod wire;

pub use client::{ApiConfig, RestClient};

impl Backend {
    /// Build a `Backend` over the REST API described by `config`.
    #[must_use]
    pub fn rest(config: ApiConfig) -> Self {
        let client = RestClient::new(config);
        let catalog: Arc<dyn CatalogApi> = Arc::new(client.clone());
        let enrollments: Arc<dyn EnrollmentApi> = Arc::new(client.clone());
        let quizzes: Arc<dyn QuizApi> = Arc::new(client.clone());
        let certificates: Arc<dyn CertificateApi> = Arc::new(client.clone());
        let transactions: Arc<dyn TransactionApi> = Arc::new(client);
        Self {
            catalog,
            enrollments,
            quizzes,
            certificates,
            transactions,
        }
    }
}
