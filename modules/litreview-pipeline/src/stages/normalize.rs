//! NORMALIZE (§4.5.2): hydrate each candidate from the DOI cache where
//! present, filling empty fields, and record the hit rate.

use std::time::Instant;

use litreview_cache::Lookup;
use litreview_common::types::{CoverageReport, Job, Stage, UnifiedPaper};
use litreview_common::Result;
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::common::{enqueue_next, predecessor_output_id};
use crate::stages::ingest::IngestOutput;

#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizeOutput {
    pub candidates: Vec<UnifiedPaper>,
    pub coverage: CoverageReport,
    pub normalized_query: String,
    pub cache_hit_rate: f64,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("normalize: missing predecessor {predecessor_id}")))?;
    let ingest: IngestOutput = serde_json::from_value(predecessor.payload)?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::Normalize,
            &serde_json::to_value(&ingest)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let mut candidates = ingest.candidates;
                let mut hits = 0usize;
                let total = candidates.len().max(1);

                for paper in candidates.iter_mut() {
                    let Some(doi) = paper.doi.clone() else { continue };
                    if let Ok(Lookup::Hit(cached)) = deps.doi_cache.get(&doi).await {
                        hits += 1;
                        if let Ok(cached_paper) = serde_json::from_value::<UnifiedPaper>(cached) {
                            if paper.abstract_text.is_none() {
                                paper.abstract_text = cached_paper.abstract_text;
                            }
                            if paper.venue.is_none() {
                                paper.venue = cached_paper.venue;
                            }
                            if paper.citation_count.is_none() {
                                paper.citation_count = cached_paper.citation_count;
                            }
                            if paper.pubmed_id.is_none() {
                                paper.pubmed_id = cached_paper.pubmed_id;
                            }
                            if paper.openalex_id.is_none() {
                                paper.openalex_id = cached_paper.openalex_id;
                            }
                        }
                    }
                }

                let output = NormalizeOutput {
                    candidates,
                    coverage: ingest.coverage,
                    normalized_query: ingest.normalized_query,
                    cache_hit_rate: hits as f64 / total as f64,
                };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::Normalize, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::Normalize, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::Normalize, output.id).await?;
    Ok(output.id)
}
