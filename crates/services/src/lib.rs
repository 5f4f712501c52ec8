#![forbid(unsafe_code)]

pub mod catalog_loader;
pub mod certificate_service;
pub mod error;
pub mod player;
pub mod quiz_service;
pub mod reports;

pub use lms_core::Clock;

pub use error::{CertificateServiceError, PlayerError, QuizServiceError};

pub use catalog_loader::{CatalogLoader, LoadedCourse};
pub use certificate_service::CertificateService;
pub use player::{
    EnrollmentSync, PlayerLoopService, PlayerProgress, PlayerSession, RetryPolicy, SyncOutcome,
};
pub use quiz_service::{PresentedQuestion, QuizCountdown, QuizDetail, QuizService};
pub use reports::ReportsService;
