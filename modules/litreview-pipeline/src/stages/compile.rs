//! COMPILE_REPORT (§4.5.7): assemble the final response payload, persist
//! the report and its extraction-run snapshot, refresh the query cache,
//! and trigger a best-effort PDF backfill.

use std::time::Instant;

use litreview_common::types::{ExtractionStats, Job, ReportStats, RunCell, RunRow, RunTrigger, SearchResponse, Stage};
use litreview_common::Result;
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::augment::AugmentOutput;
use crate::stages::common::predecessor_output_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct CompileOutput {
    pub response: SearchResponse,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("compile: missing predecessor {predecessor_id}")))?;
    let augmented: AugmentOutput = serde_json::from_value(predecessor.payload)?;

    let report = deps
        .report_repo
        .get(job.report_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("compile: missing report {}", job.report_id)))?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::CompileReport,
            &serde_json::to_value(&augmented)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let latency_ms = start.elapsed().as_millis() as u64;

                let extraction_stats = ExtractionStats {
                    strict_complete_total: augmented.strict_complete.len() as u32,
                    partial_total: augmented.partial.len() as u32,
                    fallback_reasons: augmented.fallback_reasons.clone(),
                    engine: format!("{:?}", deps.config.extraction_engine).to_lowercase(),
                    llm_fallback_applied: augmented.llm_fallback_applied,
                    latency_ms,
                };

                let stats = ReportStats {
                    latency_ms,
                    candidates_total: augmented.coverage.candidates_total,
                    candidates_filtered: augmented.coverage.candidates_filtered,
                    retrieved_total: augmented.coverage.candidates_total,
                    abstract_eligible_total: augmented.abstract_eligible_total,
                    quality_kept_total: augmented.kept_papers.len() as u32,
                    extraction_input_total: augmented.extraction_input_total,
                    strict_complete_total: augmented.strict_complete.len() as u32,
                    partial_total: augmented.partial.len() as u32,
                };

                let now = chrono::Utc::now();
                let response = SearchResponse {
                    search_id: report_id,
                    status: litreview_common::types::ReportStatus::Completed,
                    normalized_query: Some(augmented.normalized_query.clone()),
                    results: augmented.strict_complete.clone(),
                    partial_results: augmented.partial.clone(),
                    extraction_stats: Some(extraction_stats.clone()),
                    evidence_table: augmented.evidence_table.clone(),
                    brief: Some(augmented.brief.clone()),
                    coverage: Some(augmented.coverage.clone()),
                    stats: Some(stats),
                    canonical_papers: augmented.kept_papers.clone(),
                    active_run_id: None,
                    run_version: report.run_version,
                    error: None,
                    created_at: report.created_at,
                    updated_at: now,
                };

                let payload = serde_json::to_value(&response)?;

                let run_id = deps
                    .run_repo
                    .start(
                        report_id,
                        None,
                        RunTrigger::Initial,
                        &extraction_stats.engine,
                        &serde_json::json!({"pipeline_version_id": deps.pipeline_version_id}),
                    )
                    .await?;

                let columns = vec!["study_id".to_string(), "title".to_string(), "completeness".to_string()];
                let rows: Vec<RunRow> = augmented
                    .strict_complete
                    .iter()
                    .chain(augmented.partial.iter())
                    .map(|study| RunRow {
                        study_id: study.study_id.clone(),
                        cells: vec![
                            RunCell { column: "title".to_string(), value: serde_json::json!(study.title) },
                            RunCell { column: "completeness".to_string(), value: serde_json::json!(format!("{:?}", study.completeness)) },
                        ],
                    })
                    .collect();

                let input_hash = predecessor.output_hash.clone();
                let output_hash = litreview_common::hashing::content_hash_value(&payload);

                deps.run_repo
                    .complete(run_id, report_id, &input_hash, &output_hash, &serde_json::to_value(&stats_for_run(&response))?, &columns, &rows)
                    .await?;

                deps.report_repo.complete(report_id, &augmented.normalized_query, &payload, run_id).await?;

                let cache_key = crate::cache_keys::query_cache_key(&report.query, &report.filters, report.response_mode, deps.pipeline_version_id);
                deps.query_cache.put(&cache_key, &payload, litreview_cache::ttl::query()).await?;

                trigger_pdf_backfill(deps, &response).await;

                let output = CompileOutput { response };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::CompileReport, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::CompileReport, output.input_hash.clone(), output.output_hash.clone()));
    }

    Ok(output.id)
}

fn stats_for_run(response: &SearchResponse) -> serde_json::Value {
    serde_json::json!({
        "strict_complete": response.results.len(),
        "partial": response.partial_results.len(),
    })
}

/// Best-effort: the pipeline does not block completion on the downloader
/// being reachable. The summary is included even when no DOIs are present
/// so the suppressed-request log line stays informative.
async fn trigger_pdf_backfill(deps: &PipelineDeps, response: &SearchResponse) {
    let Some(endpoint) = &deps.config.pdf_downloader_endpoint else { return };
    let dois: Vec<&str> = response.canonical_papers.iter().filter_map(|p| p.doi.as_deref()).collect();
    if dois.is_empty() {
        return;
    }
    let client = deps.http_client.clone();
    let endpoint = endpoint.clone();
    let dois: Vec<String> = dois.into_iter().map(|s| s.to_string()).collect();
    tokio::spawn(async move {
        if let Err(e) = client.post(&endpoint).json(&serde_json::json!({ "dois": dois })).send().await {
            tracing::warn!(error = %e, "pdf backfill request failed");
        }
    });
}
