//! In-process doubles for the engine and runner seams

use crate::engine::{EngineError, ExecutionEngine, ExecutionRequest, SandboxOutput};
use crate::executor::{ExecutorError, SubmissionRunner};
use async_trait::async_trait;
use examrunner_common::types::{ExecutionSummary, TestCase};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Engine that replays a fixed list of responses and records every request
pub struct ScriptedEngine {
    responses: Mutex<VecDeque<Result<SandboxOutput, EngineError>>>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl ScriptedEngine {
    pub fn new(responses: Vec<Result<SandboxOutput, EngineError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn ok_stdout(stdout: &str) -> Result<SandboxOutput, EngineError> {
    Ok(SandboxOutput {
        stdout: stdout.to_string(),
        exit_code: Some(0),
        ..Default::default()
    })
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn execute(&self, request: &ExecutionRequest) -> Result<SandboxOutput, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Transport("script exhausted".to_string())))
    }
}

/// Runner whose outcome is fixed up front, counting how often it is invoked
pub struct CountingRunner {
    outcome: Result<ExecutionSummary, fn() -> ExecutorError>,
    calls: AtomicUsize,
}

impl CountingRunner {
    pub fn returning(summary: ExecutionSummary) -> Self {
        Self {
            outcome: Ok(summary),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(make_error: fn() -> ExecutorError) -> Self {
        Self {
            outcome: Err(make_error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionRunner for CountingRunner {
    async fn run(
        &self,
        _language: &str,
        _source_code: &str,
        _test_cases: &[TestCase],
    ) -> Result<ExecutionSummary, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(summary) => Ok(summary.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}
