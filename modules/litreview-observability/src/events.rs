use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use litreview_common::types::{Stage, StageEventKind};

/// A single stage-lifecycle event (§4.6). `trace_id` is set to the owning
/// job's id, which doubles as the run id for a given report/stage pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub trace_id: Uuid,
    pub report_id: Uuid,
    pub job_id: Uuid,
    pub stage: Stage,
    pub kind: StageEventKind,
    pub input_hash: Option<String>,
    pub output_hash: Option<String>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl StageEvent {
    pub fn start(report_id: Uuid, job_id: Uuid, stage: Stage, input_hash: String) -> Self {
        Self {
            trace_id: job_id,
            report_id,
            job_id,
            stage,
            kind: StageEventKind::Start,
            input_hash: Some(input_hash),
            output_hash: None,
            duration_ms: None,
            error: None,
            at: Utc::now(),
        }
    }

    pub fn success(
        report_id: Uuid,
        job_id: Uuid,
        stage: Stage,
        input_hash: String,
        output_hash: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            trace_id: job_id,
            report_id,
            job_id,
            stage,
            kind: StageEventKind::Success,
            input_hash: Some(input_hash),
            output_hash: Some(output_hash),
            duration_ms: Some(duration_ms),
            error: None,
            at: Utc::now(),
        }
    }

    pub fn idempotent(report_id: Uuid, job_id: Uuid, stage: Stage, input_hash: String, output_hash: String) -> Self {
        Self {
            trace_id: job_id,
            report_id,
            job_id,
            stage,
            kind: StageEventKind::Idempotent,
            input_hash: Some(input_hash),
            output_hash: Some(output_hash),
            duration_ms: Some(0),
            error: None,
            at: Utc::now(),
        }
    }

    pub fn failure(report_id: Uuid, job_id: Uuid, stage: Stage, input_hash: Option<String>, error: String, duration_ms: u64) -> Self {
        Self {
            trace_id: job_id,
            report_id,
            job_id,
            stage,
            kind: StageEventKind::Failure,
            input_hash,
            output_hash: None,
            duration_ms: Some(duration_ms),
            error: Some(error),
            at: Utc::now(),
        }
    }
}

/// Emit a stage event onto the tracing subscriber as a structured record.
/// Sinks that want to persist events (e.g. for `GET /search/{id}/runs`
/// diagnostics) subscribe to the `stage_event` target; this crate doesn't
/// mandate a particular sink.
pub fn emit_stage_event(event: &StageEvent) {
    match event.kind {
        StageEventKind::Start => tracing::info!(
            target: "stage_event",
            trace_id = %event.trace_id,
            report_id = %event.report_id,
            stage = event.stage.as_str(),
            kind = "start",
            input_hash = event.input_hash.as_deref(),
            "stage started"
        ),
        StageEventKind::Success => tracing::info!(
            target: "stage_event",
            trace_id = %event.trace_id,
            report_id = %event.report_id,
            stage = event.stage.as_str(),
            kind = "success",
            input_hash = event.input_hash.as_deref(),
            output_hash = event.output_hash.as_deref(),
            duration_ms = event.duration_ms,
            "stage succeeded"
        ),
        StageEventKind::Idempotent => tracing::info!(
            target: "stage_event",
            trace_id = %event.trace_id,
            report_id = %event.report_id,
            stage = event.stage.as_str(),
            kind = "idempotent",
            output_hash = event.output_hash.as_deref(),
            "stage replayed from store"
        ),
        StageEventKind::Failure => tracing::warn!(
            target: "stage_event",
            trace_id = %event.trace_id,
            report_id = %event.report_id,
            stage = event.stage.as_str(),
            kind = "failure",
            error = event.error.as_deref(),
            duration_ms = event.duration_ms,
            "stage failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_event_trace_id_matches_job_id() {
        let report_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let event = StageEvent::start(report_id, job_id, Stage::Normalize, "abc".to_string());
        assert_eq!(event.trace_id, job_id);
        assert_eq!(event.kind, StageEventKind::Start);
    }

    #[test]
    fn emit_does_not_panic_for_every_kind() {
        let report_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        emit_stage_event(&StageEvent::start(report_id, job_id, Stage::Dedupe, "h".into()));
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::Dedupe, "h".into(), "o".into(), 12));
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::Dedupe, "h".into(), "o".into()));
        emit_stage_event(&StageEvent::failure(report_id, job_id, Stage::Dedupe, Some("h".into()), "boom".into(), 5));
    }
}
