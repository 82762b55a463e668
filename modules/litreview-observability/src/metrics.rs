use litreview_common::types::Stage;
use serde::{Deserialize, Serialize};

/// A single point-in-time metric observation (§4.6). This crate only
/// defines the shape and a tracing-backed recorder; aggregation into a
/// time series is left to whatever scrapes the log/metrics exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetricSample {
    QueueDepth { stage: Option<Stage>, depth: u64 },
    QueueOldestAgeSeconds { stage: Option<Stage>, age_seconds: u64 },
    ProviderLatencyP50Ms { provider: String, ms: u64 },
    ProviderLatencyP95Ms { provider: String, ms: u64 },
    ProviderSuccessRate { provider: String, rate: f64 },
    CacheHitRate { cache: String, rate: f64 },
    ExtractionFallbackRate { rate: f64 },
    RunSuccessRate { rate: f64 },
    CostPerReport { usd: f64 },
}

/// Emit a metric sample as a structured tracing record under the
/// `metric_sample` target.
pub fn record_metric(sample: &MetricSample) {
    match sample {
        MetricSample::QueueDepth { stage, depth } => tracing::info!(
            target: "metric_sample",
            metric = "queue_depth",
            stage = stage.map(Stage::as_str),
            value = depth,
        ),
        MetricSample::QueueOldestAgeSeconds { stage, age_seconds } => tracing::info!(
            target: "metric_sample",
            metric = "queue_oldest_age_seconds",
            stage = stage.map(Stage::as_str),
            value = age_seconds,
        ),
        MetricSample::ProviderLatencyP50Ms { provider, ms } => tracing::info!(
            target: "metric_sample",
            metric = "provider_latency_p50_ms",
            provider = provider.as_str(),
            value = ms,
        ),
        MetricSample::ProviderLatencyP95Ms { provider, ms } => tracing::info!(
            target: "metric_sample",
            metric = "provider_latency_p95_ms",
            provider = provider.as_str(),
            value = ms,
        ),
        MetricSample::ProviderSuccessRate { provider, rate } => tracing::info!(
            target: "metric_sample",
            metric = "provider_success_rate",
            provider = provider.as_str(),
            value = rate,
        ),
        MetricSample::CacheHitRate { cache, rate } => tracing::info!(
            target: "metric_sample",
            metric = "cache_hit_rate",
            cache = cache.as_str(),
            value = rate,
        ),
        MetricSample::ExtractionFallbackRate { rate } => tracing::info!(
            target: "metric_sample",
            metric = "extraction_fallback_rate",
            value = rate,
        ),
        MetricSample::RunSuccessRate { rate } => tracing::info!(
            target: "metric_sample",
            metric = "run_success_rate",
            value = rate,
        ),
        MetricSample::CostPerReport { usd } => tracing::info!(
            target: "metric_sample",
            metric = "cost_per_report",
            value = usd,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_metric_does_not_panic() {
        record_metric(&MetricSample::QueueDepth { stage: Some(Stage::Normalize), depth: 3 });
        record_metric(&MetricSample::CacheHitRate { cache: "doi".into(), rate: 0.5 });
        record_metric(&MetricSample::CostPerReport { usd: 0.02 });
    }
}
