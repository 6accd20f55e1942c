use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test Case Definition (Immutable Input)
/// Authored outside this system, read-only to the grader.
/// Ordering matters - execution is sequential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub id: String,
    pub input: String,
    pub expected_output: String,
}

/// Per-Test Result
/// `input` and `expected_output` are copied verbatim from the source test case.
/// `error` carries transport failures and sandbox diagnostics; only
/// `is_correct` decides pass/fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Execution Summary
/// Aggregate over every test case of one question's submission.
///
/// ## Invariants:
/// - results.len() == total_cases
/// - total_passed == number of results with is_correct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub results: Vec<TestResult>,
    pub total_passed: usize,
    pub total_cases: usize,
}

impl ExecutionSummary {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_passed: 0,
            total_cases: 0,
        }
    }
}

/// One student's code for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub language: String,
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// How a question ended up with its score
/// `ExecutionFailed` is kept apart from a wrong answer so it can be reviewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Unattempted,
    Graded,
    ExecutionFailed,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionStatus::Unattempted => write!(f, "unattempted"),
            QuestionStatus::Graded => write!(f, "graded"),
            QuestionStatus::ExecutionFailed => write!(f, "execution_failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGrade {
    pub question_id: String,
    pub status: QuestionStatus,
    /// Percentage in 0..=100
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fold of every question grade of one exam attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamGrade {
    pub questions: Vec<QuestionGrade>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    AutoSubmitted,
}

impl SubmissionStatus {
    pub fn from_auto_flag(auto_submitted: bool) -> Self {
        if auto_submitted {
            SubmissionStatus::AutoSubmitted
        } else {
            SubmissionStatus::Submitted
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Submitted => write!(f, "submitted"),
            SubmissionStatus::AutoSubmitted => write!(f, "auto_submitted"),
        }
    }
}

/// Finished submission handed to persistence
/// Stored once per (exam, student); re-submitting overwrites in place
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub student_id: String,
    pub exam_id: String,
    pub answers: Vec<QuestionGrade>,
    pub score: f64,
    pub status: SubmissionStatus,
    pub auto_submitted: bool,
    pub exit_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_case_uses_camel_case() {
        let json = r#"{"id":"q1-1","input":"5\n","expectedOutput":"120"}"#;
        let test_case: TestCase = serde_json::from_str(json).unwrap();

        assert_eq!(test_case.id, "q1-1");
        assert_eq!(test_case.input, "5\n");
        assert_eq!(test_case.expected_output, "120");
    }

    #[test]
    fn test_test_case_id_is_optional() {
        let json = r#"{"input":"","expectedOutput":"hi"}"#;
        let test_case: TestCase = serde_json::from_str(json).unwrap();
        assert_eq!(test_case.id, "");
    }

    #[test]
    fn test_result_omits_missing_error() {
        let result = TestResult {
            input: "1".to_string(),
            expected_output: "2".to_string(),
            actual_output: "2".to_string(),
            is_correct: true,
            error: None,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isCorrect"], true);
        assert_eq!(value["actualOutput"], "2");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_summary_field_names() {
        let value = serde_json::to_value(ExecutionSummary::empty()).unwrap();
        assert_eq!(value["totalPassed"], 0);
        assert_eq!(value["totalCases"], 0);
        assert_eq!(value["results"], serde_json::json!([]));
    }

    #[test]
    fn test_question_status_serialization() {
        let json = serde_json::to_string(&QuestionStatus::ExecutionFailed).unwrap();
        assert_eq!(json, "\"execution_failed\"");
        assert_eq!(QuestionStatus::ExecutionFailed.to_string(), "execution_failed");
    }

    #[test]
    fn test_submission_status_from_auto_flag() {
        assert_eq!(SubmissionStatus::from_auto_flag(true), SubmissionStatus::AutoSubmitted);
        assert_eq!(SubmissionStatus::from_auto_flag(false), SubmissionStatus::Submitted);
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::AutoSubmitted).unwrap(),
            "\"auto_submitted\""
        );
    }

    #[test]
    fn test_answer_defaults_missing_source() {
        let json = r#"{"questionId":"q2","language":"python"}"#;
        let answer: Answer = serde_json::from_str(json).unwrap();
        assert!(answer.source_code.is_empty());
        assert!(answer.test_cases.is_empty());
    }
}
