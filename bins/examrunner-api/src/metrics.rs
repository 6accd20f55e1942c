// Prometheus metrics for Examrunner API

use examrunner_common::types::{ExecutionSummary, SubmissionRecord};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    // Global registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Interactive runs completed (counter with language label)
    pub static ref RUNS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("examrunner_runs_completed_total", "Total number of code runs completed"),
        &["language"]
    )
    .expect("metric can be created");

    // Runs that produced no summary (counter with reason label)
    pub static ref RUNS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("examrunner_runs_rejected_total", "Total runs rejected or failed as a whole"),
        &["reason"]
    )
    .expect("metric can be created");

    // Individual test case outcomes
    pub static ref TEST_CASES: CounterVec = CounterVec::new(
        Opts::new("examrunner_test_cases_total", "Total test cases executed"),
        &["outcome"]
    )
    .expect("metric can be created");

    // Run wall time in milliseconds, all test cases included
    pub static ref RUN_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "examrunner_run_duration_ms",
            "Run duration in milliseconds"
        )
        .buckets(vec![100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]),
        &["language"]
    )
    .expect("metric can be created");

    // Submissions graded (counter with submission status label)
    pub static ref SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("examrunner_submissions_total", "Total exam submissions graded"),
        &["status"]
    )
    .expect("metric can be created");

    // Questions graded (counter with question status label)
    pub static ref QUESTIONS_GRADED: CounterVec = CounterVec::new(
        Opts::new("examrunner_questions_graded_total", "Total questions graded on submission"),
        &["status"]
    )
    .expect("metric can be created");
}

/// Register every collector with the global registry
pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(RUNS_COMPLETED.clone()))?;
    REGISTRY.register(Box::new(RUNS_REJECTED.clone()))?;
    REGISTRY.register(Box::new(TEST_CASES.clone()))?;
    REGISTRY.register(Box::new(RUN_DURATION.clone()))?;
    REGISTRY.register(Box::new(SUBMISSIONS.clone()))?;
    REGISTRY.register(Box::new(QUESTIONS_GRADED.clone()))?;
    Ok(())
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

/// Label value for a client-supplied language name.
/// Anything outside the known catalog collapses into "other".
pub fn language_label(known: &[String], language: &str) -> String {
    known
        .iter()
        .find(|name| name.eq_ignore_ascii_case(language))
        .map(|name| name.to_lowercase())
        .unwrap_or_else(|| "other".to_string())
}

/// Record a completed run and its per-case outcomes
pub fn record_run(language: &str, summary: &ExecutionSummary, duration_ms: f64) {
    RUNS_COMPLETED.with_label_values(&[language]).inc();
    RUN_DURATION.with_label_values(&[language]).observe(duration_ms);

    let failed = summary.total_cases - summary.total_passed;
    TEST_CASES
        .with_label_values(&["passed"])
        .inc_by(summary.total_passed as f64);
    TEST_CASES.with_label_values(&["failed"]).inc_by(failed as f64);
}

/// Record a run that never produced a summary
pub fn record_run_rejected(reason: &str) {
    RUNS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record a graded submission
pub fn record_submission(record: &SubmissionRecord) {
    SUBMISSIONS
        .with_label_values(&[&record.status.to_string()])
        .inc();

    for answer in &record.answers {
        QUESTIONS_GRADED
            .with_label_values(&[&answer.status.to_string()])
            .inc();
    }
}
