//! QUALITY_FILTER (§4.5.4): score every canonical paper along five axes,
//! hard-reject, sort the survivors, and build the evidence table + brief.

use std::time::Instant;

use chrono::Datelike;
use litreview_common::types::{Brief, CanonicalPaper, CoverageReport, EvidenceRow, Job, Stage};
use litreview_common::Result;
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::common::{enqueue_next, predecessor_output_id};
use crate::stages::dedupe::DedupeOutput;

#[derive(Debug, Serialize, Deserialize)]
pub struct QualityOutput {
    pub kept_papers: Vec<CanonicalPaper>,
    pub evidence_table: Vec<EvidenceRow>,
    pub brief: Brief,
    pub coverage: CoverageReport,
    pub normalized_query: String,
    pub abstract_eligible_total: u32,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("quality: missing predecessor {predecessor_id}")))?;
    let dedupe: DedupeOutput = serde_json::from_value(predecessor.payload)?;

    let report = deps
        .report_repo
        .get(job.report_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("quality: missing report {}", job.report_id)))?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();
    let max_evidence_rows = report.max_evidence_rows.max(0) as u32;
    let filters = report.filters.clone();

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::QualityFilter,
            &serde_json::to_value(&dedupe)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let current_year = chrono::Utc::now().year();
                let abstract_eligible_total = dedupe.canonical_papers.iter().filter(|p| p.has_abstract()).count() as u32;

                let mut scored: Vec<CanonicalPaper> = dedupe
                    .canonical_papers
                    .into_iter()
                    .map(|mut paper| {
                        let breakdown = litreview_canon::score(&paper, &filters, current_year);
                        paper.quality = Some(breakdown);
                        paper
                    })
                    .collect();

                scored.retain(|paper| !paper.quality.as_ref().map(|q| q.hard_rejected).unwrap_or(false));
                litreview_canon::sort_kept(&mut scored);

                let evidence_table = litreview_canon::build_evidence_table(&scored, max_evidence_rows);
                let brief = litreview_canon::build_brief(&scored);

                let candidates_filtered = dedupe.coverage.candidates_total.saturating_sub(scored.len() as u32);
                let coverage = CoverageReport { candidates_filtered, ..dedupe.coverage };

                let output = QualityOutput {
                    kept_papers: scored,
                    evidence_table,
                    brief,
                    coverage,
                    normalized_query: dedupe.normalized_query,
                    abstract_eligible_total,
                };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::QualityFilter, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::QualityFilter, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::QualityFilter, output.id).await?;
    Ok(output.id)
}
