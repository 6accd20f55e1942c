pub mod types;
pub mod redis;
pub mod config;
pub mod languages;

// Re-export commonly used types for convenience
pub use types::{
    Answer, ExamGrade, ExecutionSummary, QuestionGrade, QuestionStatus, SubmissionRecord,
    SubmissionStatus, TestCase, TestResult,
};
pub use config::Config;
pub use languages::LanguageCatalog;
