use chrono::{DateTime, Utc};
use litreview_common::types::{Filters, ReportStatus, ResponseMode, SearchRequest};
use litreview_common::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: Uuid,
    pub status: ReportStatus,
    pub query: String,
    pub normalized_query: Option<String>,
    pub filters: Filters,
    pub max_candidates: i32,
    pub max_evidence_rows: i32,
    pub response_mode: ResponseMode,
    pub pipeline_version_id: Uuid,
    pub active_run_id: Option<Uuid>,
    pub run_version: i32,
    pub payload: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportRepo {
    pool: PgPool,
}

impl ReportRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &SearchRequest, pipeline_version_id: Uuid) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let max_candidates = request.max_candidates.unwrap_or(45) as i32;
        let max_evidence_rows = request.max_evidence_rows.unwrap_or(25) as i32;
        let response_mode = serde_json::to_value(request.response_mode)?;
        let filters = serde_json::to_value(&request.filters)?;
        let provider_profile = request.provider_profile.as_ref().map(|p| serde_json::to_value(p)).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO reports (id, status, query, domain, filters, max_candidates, max_evidence_rows, response_mode, provider_profile, seed, experiment, pipeline_version_id, run_version)
            VALUES ($1, 'running', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0)
            "#,
        )
        .bind(id)
        .bind(&request.query)
        .bind(&request.domain)
        .bind(&filters)
        .bind(max_candidates)
        .bind(max_evidence_rows)
        .bind(response_mode.as_str().unwrap_or("full"))
        .bind(&provider_profile)
        .bind(request.seed.map(|s| s as i64))
        .bind(&request.experiment)
        .bind(pipeline_version_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ReportRow>> {
        let row = sqlx::query(
            r#"
            SELECT id, status, query, normalized_query, filters, max_candidates, max_evidence_rows,
                   response_mode, pipeline_version_id, active_run_id, run_version, payload, error, created_at, updated_at
            FROM reports WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<ReportRow> {
            let status_str: String = row.get("status");
            let response_mode_str: String = row.get("response_mode");
            let filters_json: serde_json::Value = row.get("filters");
            Ok(ReportRow {
                id: row.get("id"),
                status: status_str.parse().map_err(litreview_common::PipelineError::Internal)?,
                query: row.get("query"),
                normalized_query: row.get("normalized_query"),
                filters: serde_json::from_value(filters_json).unwrap_or_default(),
                max_candidates: row.get("max_candidates"),
                max_evidence_rows: row.get("max_evidence_rows"),
                response_mode: if response_mode_str == "fast" { ResponseMode::Fast } else { ResponseMode::Full },
                pipeline_version_id: row.get("pipeline_version_id"),
                active_run_id: row.get("active_run_id"),
                run_version: row.get("run_version"),
                payload: row.get("payload"),
                error: row.get("error"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .transpose()
    }

    /// Mark completed with the full denormalized payload (§4.5.7). Only a
    /// `running` report transitions here — a completed report is terminal.
    pub async fn complete(&self, id: Uuid, normalized_query: &str, payload: &serde_json::Value, active_run_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE reports
            SET status = 'completed', normalized_query = $2, payload = $3, active_run_id = $4,
                run_version = run_version + 1, updated_at = now()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(normalized_query)
        .bind(payload)
        .bind(active_run_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Transition to `failed`. A no-op if the report is already terminal —
    /// late-arriving sibling-job failures must not override a completion.
    pub async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query("UPDATE reports SET status = 'failed', error = $2, updated_at = now() WHERE id = $1 AND status = 'running'")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
