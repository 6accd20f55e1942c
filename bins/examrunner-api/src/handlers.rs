// HTTP route handlers for the Examrunner API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use examrunner_common::types::{Answer, ExamGrade, SubmissionRecord, SubmissionStatus, TestCase};
use examrunner_grader::{grade_exam, QuestionTracker, SubmissionRunner};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub language: String,
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub question_id: Option<String>,
}

impl RunRequest {
    /// Tracker key, only when the run is tied to one student's question
    pub fn tracker_key(&self) -> Option<String> {
        match (&self.exam_id, &self.student_id, &self.question_id) {
            (Some(exam_id), Some(student_id), Some(question_id)) => {
                Some(QuestionTracker::key(exam_id, student_id, question_id))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub exam_id: String,
    pub student_id: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub auto_submitted: bool,
    #[serde(default)]
    pub exit_count: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// Assemble the persisted record from a graded exam
pub fn build_record(
    request: SubmitRequest,
    exam: ExamGrade,
    submitted_at: DateTime<Utc>,
) -> SubmissionRecord {
    SubmissionRecord {
        student_id: request.student_id,
        exam_id: request.exam_id,
        answers: exam.questions,
        score: exam.score,
        status: SubmissionStatus::from_auto_flag(request.auto_submitted),
        auto_submitted: request.auto_submitted,
        exit_count: request.exit_count,
        started_at: request.started_at,
        submitted_at,
    }
}

/// POST /run - Run code against test cases and return the summary
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> Response {
    let run_id = Uuid::new_v4();

    let ticket = match payload.tracker_key() {
        Some(key) => match state.tracker.begin(key) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Rejected overlapping run");
                metrics::record_run_rejected("already_running");
                return error_body(StatusCode::CONFLICT, e.to_string());
            }
        },
        None => None,
    };

    let start = Instant::now();
    let outcome = state
        .runner
        .run(&payload.language, &payload.source_code, &payload.test_cases)
        .await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(summary) => {
            if let Some(ticket) = ticket {
                ticket.graded();
            }

            let label = metrics::language_label(&state.languages, &payload.language);
            metrics::record_run(&label, &summary, elapsed_ms);
            info!(
                run_id = %run_id,
                language = %payload.language,
                total_passed = summary.total_passed,
                total_cases = summary.total_cases,
                "Run completed"
            );

            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => {
            if let Some(ticket) = ticket {
                ticket.failed();
            }

            metrics::record_run_rejected("pipeline_failure");
            warn!(run_id = %run_id, language = %payload.language, error = %e, "Run failed");

            error_body(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

/// POST /submit - Grade a full exam attempt and persist it
pub async fn submit_exam(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Response {
    if payload.exam_id.trim().is_empty() || payload.student_id.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "examId and studentId are required");
    }

    info!(
        exam_id = %payload.exam_id,
        student_id = %payload.student_id,
        questions = payload.answers.len(),
        auto_submitted = payload.auto_submitted,
        exit_count = payload.exit_count,
        "Grading submission"
    );

    let exam = grade_exam(state.runner.as_ref(), &payload.answers).await;
    let record = build_record(payload, exam, Utc::now());

    metrics::record_submission(&record);

    match state.store.upsert(&record).await {
        Ok(()) => {
            state.tracker.clear_student(&record.exam_id, &record.student_id);

            info!(
                exam_id = %record.exam_id,
                student_id = %record.student_id,
                status = %record.status,
                score = record.score,
                "Submission persisted"
            );
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => {
            // Score is logged so the grade is recoverable from logs
            error!(
                exam_id = %record.exam_id,
                student_id = %record.student_id,
                score = record.score,
                error = %e,
                "Failed to persist submission"
            );
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to persist submission: {}", e),
            )
        }
    }
}

/// GET /submission/{exam_id}/{student_id} - Fetch a stored submission
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path((exam_id, student_id)): Path<(String, String)>,
) -> Response {
    match state.store.fetch(&exam_id, &student_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => error_body(StatusCode::NOT_FOUND, "Submission not found"),
        Err(e) => {
            error!(exam_id = %exam_id, student_id = %student_id, error = %e, "Failed to fetch submission");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to query submission: {}", e),
            )
        }
    }
}

/// GET /run/{exam_id}/{student_id}/{question_id} - Interactive run state
pub async fn run_status(
    State(state): State<Arc<AppState>>,
    Path((exam_id, student_id, question_id)): Path<(String, String, String)>,
) -> Response {
    let key = QuestionTracker::key(&exam_id, &student_id, &question_id);
    let run_state = state.tracker.state(&key);

    (
        StatusCode::OK,
        Json(serde_json::json!({ "key": key, "state": run_state.as_str() })),
    )
        .into_response()
}

/// GET /health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    (StatusCode::OK, metrics::render_metrics())
}
