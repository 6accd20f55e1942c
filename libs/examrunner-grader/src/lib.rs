pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod grader;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use engine::{ExecutionEngine, PistonEngine};
pub use executor::{Executor, ExecutorError, SubmissionRunner};
pub use grader::{grade_exam, grade_question, score_exam, score_question};
pub use tracker::{QuestionTracker, RunState, RunTicket, TrackerError};
