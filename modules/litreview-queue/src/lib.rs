//! Queue & Lease Manager — Postgres-backed job queue with at-least-once
//! delivery and dedupe-key-enforced at-most-one-in-flight semantics.
//!
//! The `dedupe_key` partial unique index (see the `litreview-persistence`
//! migrations) is the actual enforcement mechanism; this crate treats a
//! unique-violation on enqueue as "already queued", not an error.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use litreview_common::types::{backoff_seconds, Job, JobStatus, Stage};
use litreview_common::{PipelineError, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct Queue {
    pool: PgPool,
}

struct JobRow {
    id: Uuid,
    report_id: Uuid,
    stage: String,
    dedupe_key: String,
    payload: serde_json::Value,
    status: String,
    attempts: i32,
    max_attempts: i32,
    lease_owner: Option<String>,
    lease_expires_at: Option<DateTime<Utc>>,
    next_run_at: DateTime<Utc>,
    last_error: Option<String>,
    input_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        Ok(Job {
            id: self.id,
            report_id: self.report_id,
            stage: Stage::from_str(&self.stage).map_err(PipelineError::Internal)?,
            dedupe_key: self.dedupe_key,
            payload: self.payload,
            status: JobStatus::from_str(&self.status).map_err(PipelineError::Internal)?,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            lease_owner: self.lease_owner,
            lease_expires_at: self.lease_expires_at,
            next_run_at: self.next_run_at,
            last_error: self.last_error,
            input_hash: self.input_hash,
            created_at: self.created_at,
        })
    }
}

fn row_to_job_row(row: sqlx::postgres::PgRow) -> JobRow {
    JobRow {
        id: row.get("id"),
        report_id: row.get("report_id"),
        stage: row.get("stage"),
        dedupe_key: row.get("dedupe_key"),
        payload: row.get("payload"),
        status: row.get("status"),
        attempts: row.get("attempts"),
        max_attempts: row.get("max_attempts"),
        lease_owner: row.get("lease_owner"),
        lease_expires_at: row.get("lease_expires_at"),
        next_run_at: row.get("next_run_at"),
        last_error: row.get("last_error"),
        input_hash: row.get("input_hash"),
        created_at: row.get("created_at"),
    }
}

pub const DEFAULT_MAX_ATTEMPTS: i32 = 6;

impl Queue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a job for `stage`. If an identical `dedupe_key` already has a
    /// non-terminal job, this is a no-op: at most one in-flight job per
    /// stage per report (or per stage+provider per report) is guaranteed by
    /// the partial unique index, not by this check.
    pub async fn enqueue(
        &self,
        report_id: Uuid,
        stage: Stage,
        dedupe_key: String,
        payload: serde_json::Value,
        input_hash: Option<String>,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (id, report_id, stage, dedupe_key, payload, status, attempts, max_attempts, next_run_at, input_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, 'queued', 0, $6, now(), $7, now())
            ON CONFLICT (dedupe_key) WHERE status IN ('queued', 'leased') DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(report_id)
        .bind(stage.as_str())
        .bind(&dedupe_key)
        .bind(&payload)
        .bind(DEFAULT_MAX_ATTEMPTS)
        .bind(&input_hash)
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(row.get::<Uuid, _>("id")),
            None => {
                let existing: Uuid = sqlx::query_scalar(
                    "SELECT id FROM jobs WHERE dedupe_key = $1 AND status IN ('queued', 'leased')",
                )
                .bind(&dedupe_key)
                .fetch_one(&self.pool)
                .await?;
                Ok(existing)
            }
        }
    }

    /// Atomically claim up to `batch_size` queued, due jobs and lease them
    /// to `owner` for `lease_seconds`. Uses `FOR UPDATE SKIP LOCKED` so
    /// concurrent workers never contend on the same row.
    pub async fn claim_batch(&self, owner: &str, batch_size: u32, lease_seconds: i64) -> Result<Vec<Job>> {
        let lease_expires_at = Utc::now() + Duration::seconds(lease_seconds);
        let rows = sqlx::query(
            r#"
            WITH candidates AS (
                SELECT id FROM jobs
                WHERE status = 'queued' AND next_run_at <= now()
                ORDER BY next_run_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET status = 'leased', lease_owner = $2, lease_expires_at = $3, attempts = attempts + 1
            WHERE id IN (SELECT id FROM candidates)
            RETURNING id, report_id, stage, dedupe_key, payload, status, attempts, max_attempts,
                      lease_owner, lease_expires_at, next_run_at, last_error, input_hash, created_at
            "#,
        )
        .bind(batch_size as i64)
        .bind(owner)
        .bind(lease_expires_at)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| row_to_job_row(r).into_job()).collect()
    }

    /// Mark a leased job completed. Idempotent: completing an already-
    /// completed job is a silent no-op (duplicate worker delivery).
    pub async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE jobs SET status = 'completed', lease_owner = NULL, lease_expires_at = NULL WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a failure. Retryable errors requeue with backoff up to
    /// `max_attempts`; non-retryable or exhausted-retry failures go dead.
    pub async fn fail(&self, job_id: Uuid, error: &str, retryable: bool) -> Result<JobStatus> {
        let row = sqlx::query("SELECT attempts, max_attempts FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await?;
        let attempts: i32 = row.get("attempts");
        let max_attempts: i32 = row.get("max_attempts");

        if retryable && attempts < max_attempts {
            let delay = backoff_seconds(attempts);
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'queued', lease_owner = NULL, lease_expires_at = NULL,
                    next_run_at = now() + make_interval(secs => $2), last_error = $3
                WHERE id = $1
                "#,
            )
            .bind(job_id)
            .bind(delay as f64)
            .bind(error)
            .execute(&self.pool)
            .await?;
            Ok(JobStatus::Queued)
        } else {
            sqlx::query(
                "UPDATE jobs SET status = 'dead', lease_owner = NULL, lease_expires_at = NULL, last_error = $2 WHERE id = $1",
            )
            .bind(job_id)
            .bind(error)
            .execute(&self.pool)
            .await?;
            Ok(JobStatus::Dead)
        }
    }

    /// Reclaim jobs whose lease has expired without completion — the
    /// worker that held them crashed or stalled. Returns them to `queued`
    /// so another worker can re-claim; Stage Output Store idempotence
    /// guards against duplicated side effects.
    pub async fn reap_expired_leases(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'queued', lease_owner = NULL, lease_expires_at = NULL
            WHERE status = 'leased' AND lease_expires_at < now()
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// `true` if any non-terminal job remains for this report (drives the
    /// report's `processing` vs `failed`/`completed` status transition).
    pub async fn has_live_jobs(&self, report_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM jobs WHERE report_id = $1 AND status IN ('queued', 'leased')",
        )
        .bind(report_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn queue_depth(&self, stage: Option<Stage>) -> Result<u64> {
        let count: i64 = match stage {
            Some(s) => {
                sqlx::query_scalar("SELECT count(*) FROM jobs WHERE status = 'queued' AND stage = $1")
                    .bind(s.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT count(*) FROM jobs WHERE status = 'queued'")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_key_collision_resolves_to_existing_job_not_a_panic() {
        // Exercised at the integration level (testcontainers); this unit
        // test only guards the pure helper logic compiles and the
        // max-attempts constant stays sane.
        assert!(DEFAULT_MAX_ATTEMPTS > 0);
    }
}
