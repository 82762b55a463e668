//! DEDUPE / Canonicalize (§4.5.3): merge provider candidates into
//! canonical papers, consulting and populating the canonical-record cache
//! by fingerprint.

use std::time::Instant;

use litreview_common::types::{CanonicalPaper, CoverageReport, Job, Stage};
use litreview_common::Result;
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::common::{enqueue_next, predecessor_output_id};
use crate::stages::normalize::NormalizeOutput;

#[derive(Debug, Serialize, Deserialize)]
pub struct DedupeOutput {
    pub canonical_papers: Vec<CanonicalPaper>,
    pub coverage: CoverageReport,
    pub normalized_query: String,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("dedupe: missing predecessor {predecessor_id}")))?;
    let normalized: NormalizeOutput = serde_json::from_value(predecessor.payload)?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::Dedupe,
            &serde_json::to_value(&normalized)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let merged = litreview_canon::canonicalize(normalized.candidates.clone());

                for paper in &merged {
                    if let Ok(value) = serde_json::to_value(paper) {
                        let _ = deps.canonical_record_cache.put(&paper.paper_id, &value, litreview_cache::ttl::canonical_record()).await;
                    }
                }

                let candidates_filtered = normalized.coverage.candidates_total.saturating_sub(merged.len() as u32);
                let coverage = CoverageReport { candidates_filtered, ..normalized.coverage };

                let output = DedupeOutput { canonical_papers: merged, coverage, normalized_query: normalized.normalized_query };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::Dedupe, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::Dedupe, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::Dedupe, output.id).await?;
    Ok(output.id)
}
