// Submission persistence used by the API handlers

use async_trait::async_trait;
use examrunner_common::redis;
use examrunner_common::types::SubmissionRecord;
use ::redis::aio::ConnectionManager;

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn upsert(&self, record: &SubmissionRecord) -> anyhow::Result<()>;

    async fn fetch(&self, exam_id: &str, student_id: &str) -> anyhow::Result<Option<SubmissionRecord>>;
}

/// Redis hash per (exam, student)
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SubmissionStore for RedisStore {
    async fn upsert(&self, record: &SubmissionRecord) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        redis::upsert_submission(&mut conn, record).await?;
        Ok(())
    }

    async fn fetch(&self, exam_id: &str, student_id: &str) -> anyhow::Result<Option<SubmissionRecord>> {
        let mut conn = self.conn.clone();
        Ok(redis::get_submission(&mut conn, exam_id, student_id).await?)
    }
}
