use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Leased,
    Completed,
    Dead,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Dead)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Leased => "leased",
            JobStatus::Completed => "completed",
            JobStatus::Dead => "dead",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "leased" => Ok(JobStatus::Leased),
            "completed" => Ok(JobStatus::Completed),
            "dead" => Ok(JobStatus::Dead),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A unit of scheduled work in the Queue & Lease Manager.
///
/// At most one non-terminal job (`queued` or `leased`) may exist per
/// `dedupe_key` — this is enforced by a partial unique index in Postgres,
/// not just application logic, so concurrent enqueues can't race past it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub report_id: Uuid,
    pub stage: Stage,
    pub dedupe_key: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub lease_owner: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub input_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Build the dedupe key `stage:provider:report` used for at-most-one
    /// in-flight enforcement. `provider` is `"-"` for stages that aren't
    /// provider-scoped.
    pub fn dedupe_key(stage: Stage, provider: Option<&str>, report_id: Uuid) -> String {
        format!("{}:{}:{}", stage.as_str(), provider.unwrap_or("-"), report_id)
    }
}

/// Exponential backoff with a deterministic jitter, base 1s, cap 60s.
///
/// Jitter is derived from `attempt` itself (not `rand`) so retries are
/// reproducible in tests and across replay.
pub fn backoff_seconds(attempt: i32) -> i64 {
    let exp = (attempt.max(1) - 1).min(6) as u32; // 0..=6
    let base = (1_i64 << exp).min(60);
    let jitter_span = (base / 4).max(1);
    let jitter = (crate::hashing::fnv1a_32(&attempt.to_string()) as i64) % jitter_span;
    (base + jitter).clamp(1, 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_increases_then_caps_at_60() {
        let b1 = backoff_seconds(1);
        let b2 = backoff_seconds(2);
        let b6 = backoff_seconds(6);
        let b10 = backoff_seconds(10);
        assert!(b1 <= b2);
        assert!(b6 <= 60);
        assert!(b10 <= 60);
    }

    #[test]
    fn backoff_is_deterministic() {
        assert_eq!(backoff_seconds(3), backoff_seconds(3));
    }

    #[test]
    fn dedupe_key_format() {
        let id = Uuid::nil();
        let key = Job::dedupe_key(Stage::IngestProvider, Some("openalex"), id);
        assert_eq!(key, format!("ingest_provider:openalex:{id}"));
        let key2 = Job::dedupe_key(Stage::Normalize, None, id);
        assert_eq!(key2, format!("normalize:-:{id}"));
    }
}
