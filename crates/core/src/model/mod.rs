mod certificate;
mod course;
mod course_module;
mod enrollment;
mod ids;
mod lesson;
mod quiz;
mod transaction;

pub use ids::{
    CertificateId, CourseId, EnrollmentId, LessonId, ModuleId, ParseIdError, QuestionId, QuizId,
    TransactionId, UserId,
};

pub use certificate::{Certificate, CertificateStatus};
pub use course::{Course, CourseError, CourseLevel};
pub use course_module::{CourseModule, ModuleError};
pub use enrollment::{Enrollment, EnrollmentError, EnrollmentStatus, EnrollmentUpdate};
pub use lesson::{Lesson, LessonError, LessonKind, VideoContent};
pub use quiz::{
    QuestionDifficulty, QuestionKind, QuestionOption, Quiz, QuizEligibility, QuizError,
    QuizQuestion, QuizStatus,
};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
