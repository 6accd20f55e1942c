/// Test Evaluator - Language-Agnostic Result Classification
///
/// **Core Responsibility:**
/// Turn raw sandbox output (or an engine failure) into a `TestResult`,
/// and fold results into pass counts.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP
/// - Knows nothing about language runtimes
/// - Pure functions: (test case, output) → result
///
/// **Normalization Rules (Applied to All Languages):**
/// - Trim leading and trailing whitespace: YES
/// - Ignore newline differences (\n vs \r\n) at the ends: YES (via trim)
/// - Internal whitespace: preserved
/// - Case sensitivity: YES (exact match required)
///
/// Diagnostics never decide correctness. A program that prints the right
/// answer and a warning on stderr still passes, with the warning surfaced.

use crate::engine::{EngineError, SandboxOutput};
use examrunner_common::types::{ExecutionSummary, TestCase, TestResult};

/// Normalize output string for comparison
fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Classify a sandbox response for one test case
pub fn evaluate_case(test_case: &TestCase, output: &SandboxOutput) -> TestResult {
    let actual = normalize_output(&output.stdout);
    let expected = normalize_output(&test_case.expected_output);
    let diagnostics = output.stderr.trim();

    TestResult {
        input: test_case.input.clone(),
        expected_output: test_case.expected_output.clone(),
        actual_output: actual.to_string(),
        is_correct: actual == expected,
        error: (!diagnostics.is_empty()).then(|| diagnostics.to_string()),
    }
}

/// Result for a test case whose remote call never produced output
pub fn engine_failure(test_case: &TestCase, error: &EngineError) -> TestResult {
    let message = error.to_string();

    TestResult {
        input: test_case.input.clone(),
        expected_output: test_case.expected_output.clone(),
        actual_output: format!("Error: {}", message),
        is_correct: false,
        error: Some(message),
    }
}

/// Pass counts over a set of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total_passed: usize,
    pub total_cases: usize,
}

pub fn aggregate(results: &[TestResult]) -> Tally {
    Tally {
        total_passed: results.iter().filter(|r| r.is_correct).count(),
        total_cases: results.len(),
    }
}

/// Wrap ordered results into a summary whose counters agree with them
pub fn summarize(results: Vec<TestResult>) -> ExecutionSummary {
    let tally = aggregate(&results);

    ExecutionSummary {
        results,
        total_passed: tally.total_passed,
        total_cases: tally.total_cases,
    }
}
