//! INGEST_PROVIDER (§4.5.1): prepare the query, fan out to every provider
//! in the request's profile, merge candidates, and opportunistically
//! hydrate from the DOI cache.

use std::time::Instant;

use futures::future::join_all;
use litreview_cache::Lookup;
use litreview_common::types::{CoverageReport, Job, ProviderCoverage, SearchRequest, Source, Stage, UnifiedPaper};
use litreview_common::Result;
use litreview_observability::{emit_stage_event, StageEvent};
use litreview_providers::PreparedQuery;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::query_prep::prepare_query;
use crate::stages::common::enqueue_next;

#[derive(Debug, Serialize, Deserialize)]
struct IngestInput {
    request: SearchRequest,
    provider_profile: Vec<Source>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestOutput {
    pub candidates: Vec<UnifiedPaper>,
    pub coverage: CoverageReport,
    pub normalized_query: String,
    pub shadow_query: Option<String>,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let request: SearchRequest = serde_json::from_value(job.payload.get("request").cloned().unwrap_or_default())
        .map_err(|e| litreview_common::PipelineError::Validation(format!("bad ingest payload: {e}")))?;

    let provider_profile: Vec<Source> = request.provider_profile.clone().unwrap_or_else(|| Source::DEFAULT_PROFILE.to_vec());

    let input = IngestInput { request: request.clone(), provider_profile: provider_profile.clone() };
    let input_json = serde_json::to_value(&input)?;

    let start = Instant::now();
    let job_id = job.id;
    let report_id = job.report_id;

    let (output, ran) = deps
        .store
        .compute_or_load(report_id, Stage::IngestProvider, &input_json, deps.pipeline_version_id, Some(job_id), || async {
            let mode = deps.config.query_pipeline_mode;
            let prepared = prepare_query(&request.query, mode);

            let selected: Vec<_> = deps.providers.iter().filter(|(source, _)| provider_profile.contains(source)).collect();

            let max_candidates = request.max_candidates.unwrap_or(45);
            let calls = selected.iter().map(|(source, provider)| {
                let prepared_query = PreparedQuery {
                    original_keyword_query: prepared.prepared.original_keyword_query.clone(),
                    expanded_keyword_query: prepared.prepared.expanded_keyword_query.clone(),
                    api_query: prepared.prepared.api_query.clone(),
                };
                let source = *source;
                let provider = provider.clone();
                async move { (source, provider.search(&prepared_query, max_candidates).await) }
            });

            let results = join_all(calls).await;

            let mut candidates = Vec::new();
            let mut providers_coverage = Vec::new();
            for (source, result) in results {
                match result {
                    Ok(response) => {
                        providers_coverage.push(ProviderCoverage {
                            source: Some(source),
                            retrieved: response.papers.len() as u32,
                            succeeded: true,
                            retry_count: response.stats.retry_count,
                        });
                        candidates.extend(response.papers);
                    }
                    Err(e) => {
                        tracing::warn!(source = source.as_str(), error = %e, "provider call failed");
                        providers_coverage.push(ProviderCoverage { source: Some(source), retrieved: 0, succeeded: false, retry_count: 0 });
                    }
                }
            }

            hydrate_from_doi_cache(deps, &mut candidates).await;
            write_doi_cache(deps, &candidates).await;

            let candidates_total = candidates.len() as u32;
            let coverage = CoverageReport { providers: providers_coverage, candidates_total, candidates_filtered: 0 };

            if let Some(shadow) = &prepared.shadow_query {
                tracing::debug!(report_id = %report_id, shadow_query = shadow, "shadow query computed, served query unchanged");
            }

            let output = IngestOutput {
                candidates,
                coverage,
                normalized_query: prepared.prepared.expanded_keyword_query,
                shadow_query: prepared.shadow_query,
            };
            Ok(serde_json::to_value(&output)?)
        })
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::IngestProvider, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::IngestProvider, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::IngestProvider, output.id).await?;
    Ok(output.id)
}

/// Metadata enrichment (§4.5.1 step 4), DOI-cache side only: this repo has
/// no Crossref adaptor, so "resolve against Crossref and OpenAlex" narrows
/// to filling empty fields from a prior run's cached DOI metadata.
async fn hydrate_from_doi_cache(deps: &PipelineDeps, candidates: &mut [UnifiedPaper]) {
    for paper in candidates.iter_mut() {
        let Some(doi) = paper.doi.clone() else { continue };
        if let Ok(Lookup::Hit(cached) | Lookup::Stale(cached)) = deps.doi_cache.get(&doi).await {
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
            }
        }
    }
}

/// Refresh the DOI cache with whatever this run observed, so a later
/// report's ingest can hydrate from it even if a provider is unavailable.
async fn write_doi_cache(deps: &PipelineDeps, candidates: &[UnifiedPaper]) {
    for paper in candidates {
        let Some(doi) = paper.doi.clone() else { continue };
        if let Ok(value) = serde_json::to_value(paper) {
            let _ = deps.doi_cache.put(&doi, &value, litreview_cache::ttl::doi()).await;
        }
    }
}
