// Route definitions for the Examrunner API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_code))
        .route("/run/:exam_id/:student_id/:question_id", get(handlers::run_status))
        .route("/submit", post(handlers::submit_exam))
        .route("/submission/:exam_id/:student_id", get(handlers::get_submission))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
}
