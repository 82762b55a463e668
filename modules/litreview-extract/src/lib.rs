pub mod deterministic;
pub mod fallback;
pub mod llm_augment;
pub mod patterns;
pub mod pdf_client;

pub use deterministic::{classify_completeness, extract_from_abstract};
pub use fallback::synthesize_fallback_studies;
pub use llm_augment::{merge as merge_augmented, AugmentError, AugmentedOutcome, AugmentedStudy, LlmAugmentClient, BATCH_SIZE};
pub use pdf_client::{PdfExtractionRequest, PdfExtractionResponse, PdfExtractorClient};
