//! TTL-bounded cache layer: four independent caches (query, DOI,
//! canonical-record, extraction) sharing one hit/miss/write-observable
//! implementation, distinguished only by which table backs them.

use chrono::{Duration, Utc};
use litreview_common::Result;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheName {
    Query,
    Doi,
    CanonicalRecord,
    Extraction,
}

impl CacheName {
    fn table(self) -> &'static str {
        match self {
            CacheName::Query => "cache_query",
            CacheName::Doi => "cache_doi",
            CacheName::CanonicalRecord => "cache_canonical_record",
            CacheName::Extraction => "cache_extraction",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CacheName::Query => "query",
            CacheName::Doi => "doi",
            CacheName::CanonicalRecord => "canonical_record",
            CacheName::Extraction => "extraction",
        }
    }
}

#[derive(Clone)]
pub struct Cache {
    pool: PgPool,
    name: CacheName,
}

/// Outcome of a [`Cache::get`] call, for hit/miss metric accounting by
/// the caller (§4.6 `cache_hit_rate`).
pub enum Lookup {
    Hit(Value),
    /// A fresh entry that has passed its TTL. Returned instead of `Miss`
    /// so callers in `inline_apply` mode (metadata enrichment) can choose
    /// to serve stale data rather than block.
    Stale(Value),
    Miss,
}

impl Cache {
    pub fn new(pool: PgPool, name: CacheName) -> Self {
        Self { pool, name }
    }

    pub async fn get(&self, key: &str) -> Result<Lookup> {
        let sql = format!(
            "SELECT value, expires_at FROM {} WHERE key = $1",
            self.name.table()
        );
        let row: Option<(Value, chrono::DateTime<Utc>)> =
            sqlx::query_as(&sql).bind(key).fetch_optional(&self.pool).await?;

        let result = match row {
            None => Lookup::Miss,
            Some((value, expires_at)) if expires_at >= Utc::now() => Lookup::Hit(value),
            Some((value, _)) => Lookup::Stale(value),
        };

        emit_cache_event(self.name, matches!(result, Lookup::Hit(_)));
        Ok(result)
    }

    pub async fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (key, value, expires_at, written_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at, written_at = now()
            "#,
            self.name.table()
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .bind(Utc::now() + ttl)
            .execute(&self.pool)
            .await?;
        tracing::debug!(target: "cache_event", cache = self.name.label(), event = "write", key);
        Ok(())
    }
}

fn emit_cache_event(name: CacheName, hit: bool) {
    tracing::debug!(
        target: "cache_event",
        cache = name.label(),
        event = if hit { "hit" } else { "miss" },
    );
}

/// Standard TTLs used across the pipeline (§4.5.7 query cache ttl=6h; the
/// others are long-lived reference data, refreshed opportunistically).
pub mod ttl {
    use chrono::Duration;

    pub fn query() -> Duration {
        Duration::hours(6)
    }

    pub fn doi() -> Duration {
        Duration::days(30)
    }

    pub fn canonical_record() -> Duration {
        Duration::days(30)
    }

    pub fn extraction() -> Duration {
        Duration::days(14)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_table_names_are_distinct() {
        let names = [
            CacheName::Query,
            CacheName::Doi,
            CacheName::CanonicalRecord,
            CacheName::Extraction,
        ];
        let tables: std::collections::HashSet<_> = names.iter().map(|n| n.table()).collect();
        assert_eq!(tables.len(), names.len());
    }
}
