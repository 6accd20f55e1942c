use crate::types::{QuestionGrade, SubmissionRecord, SubmissionStatus};
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, ErrorKind, RedisError, RedisResult};
use std::collections::HashMap;

/// Redis persistence semantics for graded submissions
/// One hash per (exam, student). HSET overwrites only the fields it writes,
/// so storing the same submission twice is a merge-style upsert.

pub const SUBMISSION_PREFIX: &str = "examrunner:submission";

/// Generate deterministic submission key
pub fn submission_key(exam_id: &str, student_id: &str) -> String {
    format!("{}:{}:{}", SUBMISSION_PREFIX, exam_id, student_id)
}

fn type_error(what: &'static str, detail: String) -> RedisError {
    RedisError::from((ErrorKind::TypeError, what, detail))
}

/// Flatten a record into hash fields
/// `started_at` is skipped when absent so an earlier value survives the merge
pub fn record_to_fields(record: &SubmissionRecord) -> RedisResult<Vec<(&'static str, String)>> {
    let answers = serde_json::to_string(&record.answers)
        .map_err(|e| type_error("serialization error", e.to_string()))?;

    let mut fields = vec![
        ("student_id", record.student_id.clone()),
        ("exam_id", record.exam_id.clone()),
        ("answers", answers),
        ("score", record.score.to_string()),
        ("status", record.status.to_string()),
        ("auto_submitted", record.auto_submitted.to_string()),
        ("exit_count", record.exit_count.to_string()),
        ("submitted_at", record.submitted_at.to_rfc3339()),
    ];

    if let Some(started_at) = record.started_at {
        fields.push(("started_at", started_at.to_rfc3339()));
    }

    Ok(fields)
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &'static str) -> RedisResult<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| type_error("missing submission field", name.to_string()))
}

fn parse_timestamp(value: &str) -> RedisResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| type_error("invalid timestamp", e.to_string()))
}

/// Rebuild a record from hash fields. An empty hash means "not stored".
pub fn fields_to_record(fields: &HashMap<String, String>) -> RedisResult<Option<SubmissionRecord>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let answers: Vec<QuestionGrade> = serde_json::from_str(required(fields, "answers")?)
        .map_err(|e| type_error("deserialization error", e.to_string()))?;

    let status = match required(fields, "status")? {
        "submitted" => SubmissionStatus::Submitted,
        "auto_submitted" => SubmissionStatus::AutoSubmitted,
        other => return Err(type_error("invalid submission status", other.to_string())),
    };

    let score = required(fields, "score")?
        .parse()
        .map_err(|_| type_error("invalid score", fields["score"].clone()))?;
    let auto_submitted = required(fields, "auto_submitted")?
        .parse()
        .map_err(|_| type_error("invalid auto_submitted flag", fields["auto_submitted"].clone()))?;
    let exit_count = required(fields, "exit_count")?
        .parse()
        .map_err(|_| type_error("invalid exit_count", fields["exit_count"].clone()))?;

    let started_at = match fields.get("started_at") {
        Some(value) => Some(parse_timestamp(value)?),
        None => None,
    };

    Ok(Some(SubmissionRecord {
        student_id: required(fields, "student_id")?.to_string(),
        exam_id: required(fields, "exam_id")?.to_string(),
        answers,
        score,
        status,
        auto_submitted,
        exit_count,
        started_at,
        submitted_at: parse_timestamp(required(fields, "submitted_at")?)?,
    }))
}

/// Store a graded submission (idempotent upsert)
pub async fn upsert_submission(
    conn: &mut redis::aio::ConnectionManager,
    record: &SubmissionRecord,
) -> RedisResult<()> {
    let key = submission_key(&record.exam_id, &record.student_id);
    let fields = record_to_fields(record)?;

    let _: () = conn.hset_multiple(&key, &fields).await?;

    Ok(())
}

/// Retrieve a stored submission
pub async fn get_submission(
    conn: &mut redis::aio::ConnectionManager,
    exam_id: &str,
    student_id: &str,
) -> RedisResult<Option<SubmissionRecord>> {
    let key = submission_key(exam_id, student_id);
    let fields: HashMap<String, String> = conn.hgetall(&key).await?;

    fields_to_record(&fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuestionStatus;
    use chrono::TimeZone;

    fn sample_record() -> SubmissionRecord {
        SubmissionRecord {
            student_id: "s-17".to_string(),
            exam_id: "midterm".to_string(),
            answers: vec![QuestionGrade {
                question_id: "q1".to_string(),
                status: QuestionStatus::Unattempted,
                score: 0.0,
                summary: None,
                error: None,
            }],
            score: 0.0,
            status: SubmissionStatus::AutoSubmitted,
            auto_submitted: true,
            exit_count: 3,
            started_at: None,
            submitted_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_submission_key_format() {
        assert_eq!(
            submission_key("midterm", "s-17"),
            "examrunner:submission:midterm:s-17"
        );
    }

    #[test]
    fn test_fields_round_trip() {
        let record = sample_record();
        let fields: HashMap<String, String> = record_to_fields(&record)
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let restored = fields_to_record(&fields).unwrap().unwrap();
        assert_eq!(restored.student_id, "s-17");
        assert_eq!(restored.status, SubmissionStatus::AutoSubmitted);
        assert_eq!(restored.exit_count, 3);
        assert_eq!(restored.answers.len(), 1);
        assert_eq!(restored.answers[0].status, QuestionStatus::Unattempted);
        assert_eq!(restored.submitted_at, record.submitted_at);
        assert_eq!(restored.started_at, None);
    }

    #[test]
    fn test_started_at_skipped_when_absent() {
        let fields = record_to_fields(&sample_record()).unwrap();
        assert!(fields.iter().all(|(name, _)| *name != "started_at"));
    }

    #[test]
    fn test_empty_hash_is_missing_record() {
        assert!(fields_to_record(&HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let mut fields: HashMap<String, String> = record_to_fields(&sample_record())
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.insert("status".to_string(), "pending".to_string());

        assert!(fields_to_record(&fields).is_err());
    }
}
