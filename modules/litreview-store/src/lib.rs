//! Stage Output Store — an immutable, content-addressed cache of every
//! stage's output, keyed by `(report_id, stage, input_hash)`.
//!
//! A stage runner calls [`StageOutputStore::compute_or_load`] with a
//! closure that does the actual work; the store guarantees the closure
//! runs at most once per distinct input, even across worker crashes and
//! lease re-claims, because the insert is the commit point.

use std::future::Future;
use std::str::FromStr;

use litreview_common::hashing::content_hash_value;
use litreview_common::types::{Stage, StageOutput};
use litreview_common::{PipelineError, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct StageOutputStore {
    pool: PgPool,
}

impl StageOutputStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load_by_input_hash(&self, report_id: Uuid, stage: Stage, input_hash: &str) -> Result<Option<StageOutput>> {
        let row = sqlx::query(
            r#"
            SELECT id, report_id, stage, input_hash, output_hash, payload, pipeline_version_id, producer_job_id
            FROM stage_outputs
            WHERE report_id = $1 AND stage = $2 AND input_hash = $3
            "#,
        )
        .bind(report_id)
        .bind(stage.as_str())
        .bind(input_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_output).transpose()
    }

    pub async fn load_by_id(&self, id: Uuid) -> Result<Option<StageOutput>> {
        let row = sqlx::query(
            r#"
            SELECT id, report_id, stage, input_hash, output_hash, payload, pipeline_version_id, producer_job_id
            FROM stage_outputs WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_output).transpose()
    }

    fn row_to_output(row: sqlx::postgres::PgRow) -> Result<StageOutput> {
        let stage_str: String = row.get("stage");
        Ok(StageOutput {
            id: row.get("id"),
            report_id: row.get("report_id"),
            stage: Stage::from_str(&stage_str).map_err(PipelineError::Internal)?,
            input_hash: row.get("input_hash"),
            output_hash: row.get("output_hash"),
            payload: row.get("payload"),
            pipeline_version_id: row.get("pipeline_version_id"),
            producer_job_id: row.get("producer_job_id"),
        })
    }

    /// Insert a freshly computed output. A unique-violation on
    /// `(report_id, stage, input_hash)` means a racing worker beat us to
    /// it; in that case we discard our own result and load theirs, which
    /// is what makes replay exactly-once regardless of which worker wins.
    async fn insert(
        &self,
        report_id: Uuid,
        stage: Stage,
        input_hash: &str,
        output_hash: &str,
        payload: &serde_json::Value,
        pipeline_version_id: Uuid,
        producer_job_id: Option<Uuid>,
    ) -> Result<StageOutput> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO stage_outputs (id, report_id, stage, input_hash, output_hash, payload, pipeline_version_id, producer_job_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (report_id, stage, input_hash) DO NOTHING
            RETURNING id, report_id, stage, input_hash, output_hash, payload, pipeline_version_id, producer_job_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(report_id)
        .bind(stage.as_str())
        .bind(input_hash)
        .bind(output_hash)
        .bind(payload)
        .bind(pipeline_version_id)
        .bind(producer_job_id)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Self::row_to_output(row),
            None => self
                .load_by_input_hash(report_id, stage, input_hash)
                .await?
                .ok_or_else(|| PipelineError::Internal("stage output disappeared after conflict".into())),
        }
    }

    /// The core idempotence primitive: look up `(report_id, stage,
    /// input_hash)`; if absent, run `compute` and insert the result. The
    /// `bool` in the return value is `true` when the stage actually ran
    /// (for emitting START/SUCCESS vs IDEMPOTENT events upstream).
    pub async fn compute_or_load<F, Fut>(
        &self,
        report_id: Uuid,
        stage: Stage,
        input: &serde_json::Value,
        pipeline_version_id: Uuid,
        producer_job_id: Option<Uuid>,
        compute: F,
    ) -> Result<(StageOutput, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value>>,
    {
        let input_hash = content_hash_value(input);

        if let Some(existing) = self.load_by_input_hash(report_id, stage, &input_hash).await? {
            return Ok((existing, false));
        }

        let payload = compute().await?;
        let output_hash = content_hash_value(&payload);
        let output = self
            .insert(report_id, stage, &input_hash, &output_hash, &payload, pipeline_version_id, producer_job_id)
            .await?;
        let ran = output.producer_job_id == producer_job_id && output.output_hash == output_hash;
        Ok((output, ran))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_hash_is_stable_for_equivalent_payloads() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(content_hash_value(&a), content_hash_value(&b));
    }
}
