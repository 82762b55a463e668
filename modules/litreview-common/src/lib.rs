pub mod config;
pub mod error;
pub mod hashing;
pub mod types;

pub use config::Config;
pub use error::{ErrorCategory, PipelineError, Result};
