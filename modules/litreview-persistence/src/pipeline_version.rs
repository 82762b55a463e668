use litreview_common::hashing::content_hash_str;
use litreview_common::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// The four-tuple that identifies a pipeline version, hashed into a
/// single `version_hash` so replay can detect "same code, same config"
/// versus a version bump (§4, pipeline version identity).
#[derive(Debug, Clone)]
pub struct PipelineVersionTuple {
    pub query_pipeline_version: String,
    pub extraction_engine_version: String,
    pub canonicalization_version: String,
    pub quality_model_version: String,
}

impl PipelineVersionTuple {
    pub fn version_hash(&self) -> String {
        content_hash_str(&format!(
            "{}|{}|{}|{}",
            self.query_pipeline_version, self.extraction_engine_version, self.canonicalization_version, self.quality_model_version
        ))
    }
}

#[derive(Clone)]
pub struct PipelineVersionRepo {
    pool: PgPool,
}

impl PipelineVersionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the id for this exact version tuple, inserting it the first
    /// time it's seen. Idempotent by `version_hash`.
    pub async fn get_or_create(&self, tuple: &PipelineVersionTuple) -> Result<Uuid> {
        let version_hash = tuple.version_hash();

        if let Some(id) = sqlx::query_scalar::<_, Uuid>("SELECT id FROM pipeline_versions WHERE version_hash = $1")
            .bind(&version_hash)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(id);
        }

        let id = Uuid::new_v4();
        let row = sqlx::query(
            r#"
            INSERT INTO pipeline_versions (id, query_pipeline_version, extraction_engine_version, canonicalization_version, quality_model_version, version_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (version_hash) DO UPDATE SET version_hash = EXCLUDED.version_hash
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&tuple.query_pipeline_version)
        .bind(&tuple.extraction_engine_version)
        .bind(&tuple.canonicalization_version)
        .bind(&tuple.quality_model_version)
        .bind(&version_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_hash_is_stable_for_same_tuple() {
        let tuple = PipelineVersionTuple {
            query_pipeline_version: "v1".into(),
            extraction_engine_version: "hybrid".into(),
            canonicalization_version: "v1".into(),
            quality_model_version: "v1".into(),
        };
        assert_eq!(tuple.version_hash(), tuple.version_hash());
    }

    #[test]
    fn version_hash_differs_for_different_engine() {
        let a = PipelineVersionTuple {
            query_pipeline_version: "v1".into(),
            extraction_engine_version: "hybrid".into(),
            canonicalization_version: "v1".into(),
            quality_model_version: "v1".into(),
        };
        let b = PipelineVersionTuple { extraction_engine_version: "scripted".into(), ..a.clone() };
        assert_ne!(a.version_hash(), b.version_hash());
    }
}
