//! The stage-oriented pipeline: query preparation, per-stage modules, and
//! the job dispatcher that ties them to the queue and stage output store.

pub mod cache_keys;
pub mod deps;
pub mod providers_setup;
pub mod query_prep;
pub mod runner;
pub mod stages;

pub use deps::PipelineDeps;
pub use providers_setup::build_providers;
pub use runner::{JobOutcome, PipelineRunner};
