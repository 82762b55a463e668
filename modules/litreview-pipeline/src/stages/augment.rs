//! LLM_AUGMENT (§4.5.6): fill nullable extraction gaps from a
//! locked-baseline model pass, hydrating from the extraction cache first
//! and falling back to synthesized studies if nothing survives.

use std::time::Instant;

use litreview_cache::Lookup;
use litreview_common::types::{Brief, CanonicalPaper, CompletenessTier, CoverageReport, EvidenceRow, Job, Stage, StudyResult};
use litreview_common::Result;
use litreview_extract::{classify_completeness, merge_augmented, synthesize_fallback_studies, BATCH_SIZE};
use litreview_observability::{emit_stage_event, StageEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deps::PipelineDeps;
use crate::stages::common::{enqueue_next, predecessor_output_id};
use crate::stages::extract::ExtractOutput;

#[derive(Debug, Serialize, Deserialize)]
pub struct AugmentOutput {
    pub strict_complete: Vec<StudyResult>,
    pub partial: Vec<StudyResult>,
    pub kept_papers: Vec<CanonicalPaper>,
    pub evidence_table: Vec<EvidenceRow>,
    pub brief: Brief,
    pub coverage: CoverageReport,
    pub normalized_query: String,
    pub abstract_eligible_total: u32,
    pub extraction_input_total: u32,
    pub llm_fallback_applied: bool,
    pub fallback_reasons: Vec<String>,
}

pub async fn run(deps: &PipelineDeps, job: &Job) -> Result<Uuid> {
    let predecessor_id = predecessor_output_id(job)?;
    let predecessor = deps
        .store
        .load_by_id(predecessor_id)
        .await?
        .ok_or_else(|| litreview_common::PipelineError::Internal(format!("augment: missing predecessor {predecessor_id}")))?;
    let extracted: ExtractOutput = serde_json::from_value(predecessor.payload)?;

    let job_id = job.id;
    let report_id = job.report_id;
    let start = Instant::now();

    let (output, ran) = deps
        .store
        .compute_or_load(
            report_id,
            Stage::LlmAugment,
            &serde_json::to_value(&extracted)?,
            deps.pipeline_version_id,
            Some(job_id),
            || async {
                let augmentable = extracted.studies.iter().any(|s| s.has_augmentable_gap());
                let mut studies = extracted.studies;
                let mut llm_fallback_applied = false;
                let mut fallback_reasons = Vec::new();

                if augmentable {
                    if let Some(client) = &deps.llm_client {
                        studies = augment_studies(deps, client, studies, &mut llm_fallback_applied, &mut fallback_reasons).await;
                    } else {
                        fallback_reasons.push("model_augmentation_disabled".to_string());
                    }
                }

                for study in studies.iter_mut() {
                    study.completeness = classify_completeness(study);
                }

                let mut strict_complete: Vec<StudyResult> = studies.iter().filter(|s| s.completeness == CompletenessTier::StrictComplete).cloned().collect();
                let mut partial: Vec<StudyResult> = studies.iter().filter(|s| s.completeness == CompletenessTier::Partial).cloned().collect();

                if strict_complete.is_empty() && partial.is_empty() && !extracted.kept_papers.is_empty() {
                    fallback_reasons.push("synthesized_from_canonical_record".to_string());
                    partial = synthesize_fallback_studies(&extracted.kept_papers);
                }

                strict_complete.sort_by(|a, b| a.study_id.cmp(&b.study_id));
                partial.sort_by(|a, b| a.study_id.cmp(&b.study_id));

                let output = AugmentOutput {
                    strict_complete,
                    partial,
                    kept_papers: extracted.kept_papers.clone(),
                    evidence_table: extracted.evidence_table.clone(),
                    brief: extracted.brief.clone(),
                    coverage: extracted.coverage.clone(),
                    normalized_query: extracted.normalized_query.clone(),
                    abstract_eligible_total: extracted.abstract_eligible_total,
                    extraction_input_total: extracted.extraction_input_total,
                    llm_fallback_applied,
                    fallback_reasons,
                };
                Ok(serde_json::to_value(&output)?)
            },
        )
        .await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if ran {
        emit_stage_event(&StageEvent::success(report_id, job_id, Stage::LlmAugment, output.input_hash.clone(), output.output_hash.clone(), duration_ms));
    } else {
        emit_stage_event(&StageEvent::idempotent(report_id, job_id, Stage::LlmAugment, output.input_hash.clone(), output.output_hash.clone()));
    }

    enqueue_next(deps, report_id, Stage::LlmAugment, output.id).await?;
    Ok(output.id)
}

fn augmented_cache_key(study_id: &str, model: &str) -> String {
    format!("{study_id}:augmented_v1:locked_baseline:{model}")
}

async fn augment_studies(
    deps: &PipelineDeps,
    client: &litreview_extract::LlmAugmentClient,
    studies: Vec<StudyResult>,
    llm_fallback_applied: &mut bool,
    fallback_reasons: &mut Vec<String>,
) -> Vec<StudyResult> {
    let model = "locked_baseline_v1";
    let mut result = Vec::with_capacity(studies.len());
    let mut to_send = Vec::new();

    for study in studies {
        if !study.has_augmentable_gap() {
            result.push(study);
            continue;
        }
        if let Ok(Lookup::Hit(cached)) = deps.extraction_cache.get(&augmented_cache_key(&study.study_id, model)).await {
            if let Ok(cached_study) = serde_json::from_value::<StudyResult>(cached) {
                result.push(cached_study);
                continue;
            }
        }
        to_send.push(study);
    }

    for batch in to_send.chunks(BATCH_SIZE) {
        match client.augment_batch(batch).await {
            Ok(augmented) => {
                for (study, aug) in batch.iter().zip(augmented.iter()) {
                    let merged = merge_augmented(study.clone(), aug);
                    if let Ok(value) = serde_json::to_value(&merged) {
                        let _ = deps.extraction_cache.put(&augmented_cache_key(&merged.study_id, model), &value, litreview_cache::ttl::extraction()).await;
                    }
                    result.push(merged);
                }
                *llm_fallback_applied = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "model augmentation failed, keeping deterministic result");
                fallback_reasons.push("model_augmentation_failed".to_string());
                result.extend(batch.iter().cloned());
            }
        }
    }

    result
}
