//! The per-stage dispatcher: enforces the stage's timeout, short-circuits
//! on an already-terminal report, and turns a stage's `Result` into the
//! job-queue outcome plus START/FAILURE events.

use std::time::Duration;

use litreview_common::types::{Job, ReportStatus, Stage};
use litreview_common::{PipelineError, Result};
use litreview_observability::{emit_stage_event, StageEvent};

use crate::deps::PipelineDeps;
use crate::stages;

/// What became of a claimed job, for callers (the worker loop, the
/// `/jobs/drain` endpoint) that report aggregate counts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Retried,
    Dead,
}

pub struct PipelineRunner {
    deps: PipelineDeps,
}

impl PipelineRunner {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    pub fn deps(&self) -> &PipelineDeps {
        &self.deps
    }

    /// Run one claimed job to completion (or failure), reporting the
    /// outcome back onto the queue. Returns `Ok(JobOutcome)` even when the
    /// job itself failed — queue bookkeeping is the side effect; only a
    /// failure to update the queue row propagates as `Err`.
    pub async fn run_job(&self, job: Job) -> Result<JobOutcome> {
        if self.report_is_terminal(job.report_id).await? {
            tracing::debug!(report_id = %job.report_id, stage = job.stage.as_str(), "report already terminal, skipping job");
            self.deps.queue.complete(job.id).await?;
            return Ok(JobOutcome::Completed);
        }

        emit_stage_event(&StageEvent::start(job.report_id, job.id, job.stage, job.input_hash.clone().unwrap_or_default()));

        let timeout = Duration::from_millis(job.stage.timeout_ms());
        let stage = job.stage;
        let report_id = job.report_id;
        let job_id = job.id;

        let outcome = tokio::time::timeout(timeout, self.dispatch(&job)).await;

        match outcome {
            Ok(Ok(_output_id)) => {
                self.deps.queue.complete(job_id).await?;
                Ok(JobOutcome::Completed)
            }
            Ok(Err(e)) => self.fail_job(job_id, report_id, stage, e).await,
            Err(_elapsed) => {
                let e = PipelineError::Timeout(job.stage.timeout_ms());
                self.fail_job(job_id, report_id, stage, e).await
            }
        }
    }

    async fn dispatch(&self, job: &Job) -> Result<uuid::Uuid> {
        match job.stage {
            Stage::IngestProvider => stages::ingest::run(&self.deps, job).await,
            Stage::Normalize => stages::normalize::run(&self.deps, job).await,
            Stage::Dedupe => stages::dedupe::run(&self.deps, job).await,
            Stage::QualityFilter => stages::quality::run(&self.deps, job).await,
            Stage::DeterministicExtract => stages::extract::run(&self.deps, job).await,
            Stage::LlmAugment => stages::augment::run(&self.deps, job).await,
            Stage::CompileReport => stages::compile::run(&self.deps, job).await,
        }
    }

    async fn fail_job(&self, job_id: uuid::Uuid, report_id: uuid::Uuid, stage: Stage, error: PipelineError) -> Result<JobOutcome> {
        let retryable = error.retryable();
        emit_stage_event(&StageEvent::failure(report_id, job_id, stage, None, error.to_string(), 0));

        let status = self.deps.queue.fail(job_id, &error.to_string(), retryable).await?;
        if status.is_terminal() {
            self.deps.report_repo.fail(report_id, &error.to_string()).await?;
            Ok(JobOutcome::Dead)
        } else {
            Ok(JobOutcome::Retried)
        }
    }

    async fn report_is_terminal(&self, report_id: uuid::Uuid) -> Result<bool> {
        let report = self.deps.report_repo.get(report_id).await?;
        Ok(report.map(|r| r.status != ReportStatus::Running).unwrap_or(false))
    }
}
