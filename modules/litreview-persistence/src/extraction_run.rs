use chrono::{DateTime, Utc};
use litreview_common::types::{ExtractionRunDetail, ExtractionRunSummary, RunRow, RunStatus, RunTrigger};
use litreview_common::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct ExtractionRunRepo {
    pool: PgPool,
}

impl ExtractionRunRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Allocate the next `run_index` for a report and insert a `running`
    /// row. `run_index` is monotonic per report, independent of retries.
    pub async fn start(
        &self,
        report_id: Uuid,
        parent_run_id: Option<Uuid>,
        trigger: RunTrigger,
        engine: &str,
        config_snapshot: &serde_json::Value,
    ) -> Result<Uuid> {
        let run_index: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(run_index), -1) + 1 FROM extraction_runs WHERE report_id = $1")
            .bind(report_id)
            .fetch_one(&self.pool)
            .await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO extraction_runs (id, report_id, run_index, parent_run_id, trigger, status, engine, config_snapshot, is_active)
            VALUES ($1, $2, $3, $4, $5, 'running', $6, $7, false)
            "#,
        )
        .bind(id)
        .bind(report_id)
        .bind(run_index)
        .bind(parent_run_id)
        .bind(serde_json::to_value(trigger)?.as_str().unwrap_or("initial"))
        .bind(engine)
        .bind(config_snapshot)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Finish a run, recording its input/output hashes, stats, and the
    /// detail table; marks it the report's active run and deactivates
    /// any previous one.
    #[allow(clippy::too_many_arguments)]
    pub async fn complete(
        &self,
        run_id: Uuid,
        report_id: Uuid,
        input_hash: &str,
        output_hash: &str,
        stats: &serde_json::Value,
        columns: &[String],
        rows: &[RunRow],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE extraction_runs SET is_active = false WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE extraction_runs
            SET status = 'completed', input_hash = $2, output_hash = $3, stats = $4, columns = $5, rows = $6,
                is_active = true, completed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(input_hash)
        .bind(output_hash)
        .bind(stats)
        .bind(serde_json::to_value(columns)?)
        .bind(serde_json::to_value(rows)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn fail(&self, run_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE extraction_runs SET status = 'failed', completed_at = now() WHERE id = $1")
            .bind(run_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_summaries(&self, report_id: Uuid) -> Result<Vec<ExtractionRunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, run_index, parent_run_id, trigger, status, engine, created_at, completed_at, is_active
            FROM extraction_runs WHERE report_id = $1 ORDER BY run_index ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_summary).collect()
    }

    pub async fn get_detail(&self, report_id: Uuid, run_id: Uuid) -> Result<Option<ExtractionRunDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, run_index, parent_run_id, trigger, status, engine, created_at, completed_at, is_active,
                   input_hash, output_hash, columns, rows
            FROM extraction_runs WHERE report_id = $1 AND id = $2
            "#,
        )
        .bind(report_id)
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let summary = Self::row_to_summary_raw(&row)?;
        let columns: serde_json::Value = row.try_get("columns").unwrap_or(serde_json::Value::Null);
        let rows_json: serde_json::Value = row.try_get("rows").unwrap_or(serde_json::Value::Null);

        Ok(Some(ExtractionRunDetail {
            summary,
            columns: serde_json::from_value(columns).unwrap_or_default(),
            rows: serde_json::from_value(rows_json).unwrap_or_default(),
            input_hash: row.try_get("input_hash").unwrap_or_default(),
            output_hash: row.try_get("output_hash").unwrap_or_default(),
        }))
    }

    fn row_to_summary(row: sqlx::postgres::PgRow) -> Result<ExtractionRunSummary> {
        Self::row_to_summary_raw(&row)
    }

    fn row_to_summary_raw(row: &sqlx::postgres::PgRow) -> Result<ExtractionRunSummary> {
        let trigger_str: String = row.get("trigger");
        let status_str: String = row.get("status");
        Ok(ExtractionRunSummary {
            run_id: row.get("id"),
            run_index: row.get("run_index"),
            parent_run_id: row.get("parent_run_id"),
            trigger: parse_trigger(&trigger_str),
            status: parse_status(&status_str),
            engine: row.get("engine"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            completed_at: row.try_get("completed_at").ok(),
            is_active: row.get("is_active"),
        })
    }
}

fn parse_trigger(s: &str) -> RunTrigger {
    match s {
        "recompute" => RunTrigger::Recompute,
        "model_upgrade" => RunTrigger::ModelUpgrade,
        "manual" => RunTrigger::Manual,
        _ => RunTrigger::Initial,
    }
}

fn parse_status(s: &str) -> RunStatus {
    match s {
        "completed" => RunStatus::Completed,
        "failed" => RunStatus::Failed,
        _ => RunStatus::Running,
    }
}
