/// Submission Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Run one submission (language + source) against every test case of a
/// question and hand back an `ExecutionSummary`.
///
/// **Architecture:**
/// 1. Use an ExecutionEngine to reach the sandbox (engine.rs)
/// 2. Use the evaluator to classify each response (evaluator.rs)
/// 3. Return the aggregated summary
///
/// Test cases run strictly one after another, in input order. A failing
/// remote call becomes a failed result for that case and the loop moves on.
/// Only problems with the submission as a whole surface as `ExecutorError`.

use crate::engine::{ExecutionEngine, ExecutionRequest};
use crate::evaluator;
use async_trait::async_trait;
use examrunner_common::config::{DEFAULT_MAX_INPUT_BYTES, DEFAULT_MAX_SOURCE_BYTES};
use examrunner_common::types::{ExecutionSummary, TestCase};
use examrunner_common::LanguageCatalog;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Source code is {size} bytes, limit is {limit} bytes")]
    SourceTooLarge { size: usize, limit: usize },
    #[error("Input of test case {index} is {size} bytes, limit is {limit} bytes")]
    InputTooLarge {
        index: usize,
        size: usize,
        limit: usize,
    },
}

/// Seam between grading and execution
#[async_trait]
pub trait SubmissionRunner: Send + Sync {
    async fn run(
        &self,
        language: &str,
        source_code: &str,
        test_cases: &[TestCase],
    ) -> Result<ExecutionSummary, ExecutorError>;
}

pub struct Executor<E> {
    engine: E,
    catalog: LanguageCatalog,
    max_source_bytes: usize,
    max_input_bytes: usize,
}

impl<E: ExecutionEngine> Executor<E> {
    pub fn new(engine: E, catalog: LanguageCatalog) -> Self {
        Self {
            engine,
            catalog,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    pub fn with_limits(mut self, max_source_bytes: usize, max_input_bytes: usize) -> Self {
        self.max_source_bytes = max_source_bytes;
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn check_limits(&self, source_code: &str, test_cases: &[TestCase]) -> Result<(), ExecutorError> {
        if source_code.len() > self.max_source_bytes {
            return Err(ExecutorError::SourceTooLarge {
                size: source_code.len(),
                limit: self.max_source_bytes,
            });
        }

        for (index, test_case) in test_cases.iter().enumerate() {
            if test_case.input.len() > self.max_input_bytes {
                return Err(ExecutorError::InputTooLarge {
                    index,
                    size: test_case.input.len(),
                    limit: self.max_input_bytes,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<E: ExecutionEngine> SubmissionRunner for Executor<E> {
    async fn run(
        &self,
        language: &str,
        source_code: &str,
        test_cases: &[TestCase],
    ) -> Result<ExecutionSummary, ExecutorError> {
        self.check_limits(source_code, test_cases)?;

        if test_cases.is_empty() {
            return Ok(ExecutionSummary::empty());
        }

        let version = self.catalog.version_for(language);
        let start = Instant::now();

        info!(
            language = %language,
            version = %version,
            test_cases = test_cases.len(),
            source_size = source_code.len(),
            "Starting execution"
        );

        let mut results = Vec::with_capacity(test_cases.len());

        for (idx, test_case) in test_cases.iter().enumerate() {
            let request = ExecutionRequest::new(language, version, source_code, &test_case.input);

            let result = match self.engine.execute(&request).await {
                Ok(output) => evaluator::evaluate_case(test_case, &output),
                Err(e) => {
                    warn!(
                        test_num = idx + 1,
                        test_id = %test_case.id,
                        error = %e,
                        "Remote execution failed; recording failed result"
                    );
                    evaluator::engine_failure(test_case, &e)
                }
            };

            debug!(
                test_num = idx + 1,
                test_id = %test_case.id,
                is_correct = result.is_correct,
                has_error = result.error.is_some(),
                "Test result"
            );

            results.push(result);
        }

        let summary = evaluator::summarize(results);

        info!(
            language = %language,
            total_passed = summary.total_passed,
            total_cases = summary.total_cases,
            execution_ms = start.elapsed().as_millis() as u64,
            "Execution completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, SandboxOutput};
    use crate::testing::{ok_stdout, ScriptedEngine};
    use examrunner_common::languages::LanguageEntry;

    fn cases(pairs: &[(&str, &str)]) -> Vec<TestCase> {
        pairs
            .iter()
            .enumerate()
            .map(|(idx, (input, expected))| TestCase {
                id: format!("t{}", idx + 1),
                input: input.to_string(),
                expected_output: expected.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_test_cases() {
        let executor = Executor::new(ScriptedEngine::new(vec![]), LanguageCatalog::default());

        let summary = executor.run("python", "print(1)", &[]).await.unwrap();

        assert_eq!(summary, ExecutionSummary::empty());
        assert!(executor.engine().requests().is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let engine = ScriptedEngine::new(vec![ok_stdout("1\n"), ok_stdout("4\n"), ok_stdout("9\n")]);
        let executor = Executor::new(engine, LanguageCatalog::default());
        let test_cases = cases(&[("1", "1"), ("2", "4"), ("3", "9")]);

        let summary = executor.run("python", "n=int(input());print(n*n)", &test_cases).await.unwrap();

        assert_eq!(summary.total_cases, 3);
        assert_eq!(summary.total_passed, 3);
        for (result, test_case) in summary.results.iter().zip(&test_cases) {
            assert_eq!(result.input, test_case.input);
            assert_eq!(result.expected_output, test_case.expected_output);
        }

        let stdins: Vec<String> = executor
            .engine()
            .requests()
            .into_iter()
            .map(|r| r.stdin)
            .collect();
        assert_eq!(stdins, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_abort_batch() {
        let engine = ScriptedEngine::new(vec![
            ok_stdout("a"),
            Err(EngineError::Transport("connection reset by peer".to_string())),
            ok_stdout("c"),
        ]);
        let executor = Executor::new(engine, LanguageCatalog::default());
        let test_cases = cases(&[("", "a"), ("", "b"), ("", "c")]);

        let summary = executor.run("python", "src", &test_cases).await.unwrap();

        assert_eq!(summary.total_cases, 3);
        assert_eq!(summary.total_passed, 2);
        assert!(summary.results[0].is_correct);
        assert!(!summary.results[1].is_correct);
        assert!(summary.results[1].error.as_deref().unwrap().contains("connection reset"));
        assert!(summary.results[2].is_correct);
        assert_eq!(executor.engine().requests().len(), 3);
    }

    #[tokio::test]
    async fn test_every_case_failing_still_returns_summary() {
        let engine = ScriptedEngine::new(vec![
            Err(EngineError::Status { code: 500, reason: "Internal Server Error".to_string() }),
            Err(EngineError::Decode("expected value".to_string())),
        ]);
        let executor = Executor::new(engine, LanguageCatalog::default());

        let summary = executor
            .run("python", "src", &cases(&[("", "x"), ("", "y")]))
            .await
            .unwrap();

        assert_eq!(summary.total_cases, 2);
        assert_eq!(summary.total_passed, 0);
        assert!(summary.results.iter().all(|r| r.error.is_some()));
    }

    #[tokio::test]
    async fn test_diagnostics_do_not_fail_correct_output() {
        let engine = ScriptedEngine::new(vec![Ok(SandboxOutput {
            stdout: "ok\n".to_string(),
            stderr: "note: something".to_string(),
            exit_code: Some(0),
            signal: None,
        })]);
        let executor = Executor::new(engine, LanguageCatalog::default());

        let summary = executor.run("c", "src", &cases(&[("", "ok")])).await.unwrap();

        assert_eq!(summary.total_passed, 1);
        assert_eq!(summary.results[0].error.as_deref(), Some("note: something"));
    }

    #[tokio::test]
    async fn test_request_uses_catalog_version() {
        let catalog = LanguageCatalog::new(vec![LanguageEntry {
            name: "python".to_string(),
            version: "3.10.0".to_string(),
        }]);
        let engine = ScriptedEngine::new(vec![ok_stdout("1"), ok_stdout("1")]);
        let executor = Executor::new(engine, catalog);

        executor.run("python", "print(1)", &cases(&[("", "1")])).await.unwrap();
        executor.run("cobol", "DISPLAY 1", &cases(&[("", "1")])).await.unwrap();

        let requests = executor.engine().requests();
        assert_eq!(requests[0].version, "3.10.0");
        assert_eq!(requests[0].files[0].content, "print(1)");
        assert_eq!(requests[1].language, "cobol");
        assert_eq!(requests[1].version, "*");
    }

    #[tokio::test]
    async fn test_oversized_source_is_rejected_before_any_call() {
        let executor = Executor::new(ScriptedEngine::new(vec![]), LanguageCatalog::default())
            .with_limits(8, 1024);

        let result = executor.run("python", "print('too long')", &cases(&[("", "x")])).await;

        assert!(matches!(result, Err(ExecutorError::SourceTooLarge { size: 17, limit: 8 })));
        assert!(executor.engine().requests().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_input_is_rejected() {
        let executor = Executor::new(ScriptedEngine::new(vec![]), LanguageCatalog::default())
            .with_limits(1024, 4);

        let result = executor
            .run("python", "src", &cases(&[("ok", "x"), ("too big", "y")]))
            .await;

        assert!(matches!(result, Err(ExecutorError::InputTooLarge { index: 1, .. })));
    }
}
