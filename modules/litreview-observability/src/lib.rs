pub mod events;
pub mod metrics;
pub mod tracing_init;

pub use events::{emit_stage_event, StageEvent};
pub use metrics::MetricSample;
pub use tracing_init::init_tracing;
