//! DETERMINISTIC_EXTRACT (§4.5.5): rule-based extraction over the top-N
//! kept candidates, with an optional PDF extractor fallback and
//! extraction-cache hydration.

use std::time::Instant;

use litreview_cache::Lookup;
use litreview_common::types::{Brief, CanonicalPaper, CoverageReport, EvidenceRow, Job, Stage, StudyResult};
use litreview_common::Result;
use litreview_extract::{extract_from_abstract, PdfExtractionRequest};
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::common::{enqueue_next, predecessor_output_id};
use crate::stages::quality::QualityOutput;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractOutput {
    pub studies: Vec<StudyResult>,
    pub kept_papers: Vec<CanonicalPaper>,
    pub evidence_table: Vec<EvidenceRow>,
    pub brief: Brief,
    pub coverage: CoverageReport,
    pub normalized_query: String,
    pub abstract_eligible_total: u32,
    pub extraction_input_total: u32,
    pub used_pdf_count: u32,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("extract: missing predecessor {predecessor_id}")))?;
    let quality: QualityOutput = serde_json::from_value(predecessor.payload)?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();
    let max_candidates = deps.config.extraction_max_candidates;

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::DeterministicExtract,
            &serde_json::to_value(&quality)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let top_n: Vec<&CanonicalPaper> = quality.kept_papers.iter().take(max_candidates as usize).collect();
                let extraction_input_total = top_n.len() as u32;

                let mut studies = Vec::with_capacity(top_n.len());
                for paper in &top_n {
                    if let Ok(Lookup::Hit(cached)) = deps.extraction_cache.get(&extraction_cache_key(&paper.paper_id, "deterministic")).await {
                        if let Ok(cached_study) = serde_json::from_value::<StudyResult>(cached) {
                            studies.push(cached_study);
                            continue;
                        }
                    }
                    studies.push(extract_from_abstract(paper));
                }

                let used_pdf_count = maybe_extract_pdf(deps, &top_n, &mut studies).await;

                for study in &studies {
                    if study.fallback_reason.is_none() {
                        if let Ok(value) = serde_json::to_value(study) {
                            let _ = deps
                                .extraction_cache
                                .put(&extraction_cache_key(&study.study_id, "deterministic"), &value, litreview_cache::ttl::extraction())
                                .await;
                        }
                    }
                }

                let output = ExtractOutput {
                    studies,
                    kept_papers: quality.kept_papers.clone(),
                    evidence_table: quality.evidence_table.clone(),
                    brief: quality.brief.clone(),
                    coverage: quality.coverage.clone(),
                    normalized_query: quality.normalized_query.clone(),
                    abstract_eligible_total: quality.abstract_eligible_total,
                    extraction_input_total,
                    used_pdf_count,
                };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::DeterministicExtract, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::DeterministicExtract, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::DeterministicExtract, output.id).await?;
    Ok(output.id)
}

fn extraction_cache_key(study_id: &str, prompt_hash: &str) -> String {
    format!("{study_id}:deterministic_first_v1:{prompt_hash}:deterministic")
}

/// Best-effort PDF backfill: any failure falls back to the already
/// computed abstract-based extraction, recording why.
async fn maybe_extract_pdf(deps: &PipelineDeps, papers: &[&CanonicalPaper], studies: &mut [StudyResult]) -> u32 {
    let Some(pdf_client) = &deps.pdf_client else { return 0 };

    let requests: Vec<PdfExtractionRequest> = papers
        .iter()
        .filter(|p| p.pdf_url.is_some())
        .map(|p| PdfExtractionRequest {
            study_id: p.paper_id.clone(),
            title: p.title.clone(),
            abstract_text: p.abstract_text.clone(),
            pdf_url: p.pdf_url.clone(),
            landing_page_url: p.landing_page_url.clone(),
            timeout_ms: deps.config.pdf_parse_timeout_ms,
        })
        .collect();

    if requests.is_empty() {
        return 0;
    }

    match pdf_client.extract_batch(&requests).await {
        Ok(responses) => {
            let mut used = 0u32;
            for response in responses {
                if let Some(study) = studies.iter_mut().find(|s| s.study_id == response.study.study_id) {
                    *study = response.study;
                    study.used_pdf = true;
                    used += 1;
                }
            }
            used
        }
        Err(e) => {
            tracing::warn!(error = %e, "pdf extractor unavailable, falling back to abstract extraction");
            for study in studies.iter_mut() {
                if study.fallback_reason.is_none() {
                    study.fallback_reason = Some("pdf_extractor_unavailable".to_string());
                }
            }
            0
        }
    }
}
