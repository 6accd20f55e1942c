/// Grading Aggregator
///
/// **Scoring Rules:**
/// - question score = 100 * passed / cases, 0 when there are no cases
/// - exam score = arithmetic mean of question scores, 0 when there are no questions
///
/// **Failure Semantics:**
/// - empty source → `Unattempted`, scored 0, runner never called
/// - runner error → `ExecutionFailed`, scored 0, error kept for review
/// - a grading pass always yields one grade per answer

use crate::executor::SubmissionRunner;
use examrunner_common::types::{
    Answer, ExamGrade, ExecutionSummary, QuestionGrade, QuestionStatus,
};
use tracing::{info, warn};

pub fn score_question(summary: &ExecutionSummary) -> f64 {
    if summary.total_cases == 0 {
        return 0.0;
    }
    100.0 * summary.total_passed as f64 / summary.total_cases as f64
}

pub fn score_exam(question_scores: &[f64]) -> f64 {
    if question_scores.is_empty() {
        return 0.0;
    }
    question_scores.iter().sum::<f64>() / question_scores.len() as f64
}

pub async fn grade_question<R>(runner: &R, answer: &Answer) -> QuestionGrade
where
    R: SubmissionRunner + ?Sized,
{
    if answer.source_code.trim().is_empty() {
        info!(question_id = %answer.question_id, "No source submitted; scoring as unattempted");
        return QuestionGrade {
            question_id: answer.question_id.clone(),
            status: QuestionStatus::Unattempted,
            score: 0.0,
            summary: None,
            error: None,
        };
    }

    match runner
        .run(&answer.language, &answer.source_code, &answer.test_cases)
        .await
    {
        Ok(summary) => QuestionGrade {
            question_id: answer.question_id.clone(),
            status: QuestionStatus::Graded,
            score: score_question(&summary),
            summary: Some(summary),
            error: None,
        },
        Err(e) => {
            warn!(
                question_id = %answer.question_id,
                language = %answer.language,
                error = %e,
                "Execution pipeline failed; question flagged"
            );
            QuestionGrade {
                question_id: answer.question_id.clone(),
                status: QuestionStatus::ExecutionFailed,
                score: 0.0,
                summary: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Grade every answer of one exam attempt, one question at a time
pub async fn grade_exam<R>(runner: &R, answers: &[Answer]) -> ExamGrade
where
    R: SubmissionRunner + ?Sized,
{
    let mut questions = Vec::with_capacity(answers.len());

    for answer in answers {
        questions.push(grade_question(runner, answer).await);
    }

    let scores: Vec<f64> = questions.iter().map(|q| q.score).collect();
    let score = score_exam(&scores);

    info!(
        questions = questions.len(),
        execution_failures = questions
            .iter()
            .filter(|q| q.status == QuestionStatus::ExecutionFailed)
            .count(),
        score = score,
        "Exam graded"
    );

    ExamGrade { questions, score }
}
