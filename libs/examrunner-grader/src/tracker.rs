/// Question Run Tracker
///
/// Explicit state machine for interactive runs, one entry per
/// `exam:student:question` key:
///
/// ```text
/// idle ──begin──▶ running ──graded──▶ graded
///                    │                  │
///                    └──failed/drop──▶ failed
/// graded | failed ──begin──▶ running
/// ```
///
/// A second `begin` while a run is in flight is rejected instead of racing
/// the first one to update the question.
///
/// Finished entries stay in the map until `clear_student` drops them, which
/// happens once the student's exam is submitted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Graded,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Graded => "graded",
            RunState::Failed => "failed",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("A run is already in progress for {0}")]
    AlreadyRunning(String),
}

#[derive(Debug, Clone, Default)]
pub struct QuestionTracker {
    states: Arc<Mutex<HashMap<String, RunState>>>,
}

impl QuestionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(exam_id: &str, student_id: &str, question_id: &str) -> String {
        format!("{}:{}:{}", exam_id, student_id, question_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RunState>> {
        // A panic while holding the lock leaves the map itself intact
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self, key: &str) -> RunState {
        self.lock().get(key).copied().unwrap_or(RunState::Idle)
    }

    /// Move `key` to running, handing back the ticket that finishes the run
    pub fn begin(&self, key: impl Into<String>) -> Result<RunTicket, TrackerError> {
        let key = key.into();
        let mut states = self.lock();

        if states.get(&key) == Some(&RunState::Running) {
            return Err(TrackerError::AlreadyRunning(key));
        }

        states.insert(key.clone(), RunState::Running);
        debug!(key = %key, "Run started");

        Ok(RunTicket {
            tracker: self.clone(),
            key,
            finished: false,
        })
    }

    /// Forget every finished run of one student in one exam.
    /// Runs still in flight are kept so their tickets stay meaningful.
    pub fn clear_student(&self, exam_id: &str, student_id: &str) -> usize {
        let prefix = format!("{}:{}:", exam_id, student_id);
        let mut states = self.lock();
        let before = states.len();

        states.retain(|key, state| !key.starts_with(&prefix) || *state == RunState::Running);

        let removed = before - states.len();
        debug!(exam_id = %exam_id, student_id = %student_id, removed, "Cleared finished runs");
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn finish(&self, key: &str, state: RunState) {
        self.lock().insert(key.to_string(), state);
        debug!(key = %key, state = state.as_str(), "Run finished");
    }
}

/// Proof that a run is in flight. Dropping it unfinished marks the run failed.
#[derive(Debug)]
pub struct RunTicket {
    tracker: QuestionTracker,
    key: String,
    finished: bool,
}

impl RunTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn graded(mut self) {
        self.finished = true;
        self.tracker.finish(&self.key, RunState::Graded);
    }

    pub fn failed(mut self) {
        self.finished = true;
        self.tracker.finish(&self.key, RunState::Failed);
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.finish(&self.key, RunState::Failed);
        }
    }
}
