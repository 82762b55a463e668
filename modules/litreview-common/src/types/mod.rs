pub mod evidence;
pub mod job;
pub mod paper;
pub mod search;
pub mod stage;
pub mod study;

pub use evidence::{Brief, CitationAnchor, ClaimCluster, ClaimDisposition, ClaimSentence, EvidenceRow, Stance};
pub use job::{backoff_seconds, Job, JobStatus};
pub use paper::{
    CanonicalPaper, PreprintStatus, ProvenanceEntry, QualityScoreBreakdown, Source, StudyDesignHint,
    UnifiedPaper,
};
pub use search::{
    CoverageReport, DrainRequest, DrainResponse, ExtractionRunDetail, ExtractionRunSummary, ExtractionStats,
    Filters, ProviderCoverage, ReportStats, ReportStatus, ResponseMode, RunCell, RunRow, RunStatus, RunTrigger,
    SearchRequest, SearchResponse,
};
pub use stage::{Stage, StageEventKind, StageOutput};
pub use study::{CompletenessTier, Outcome, ReviewType, StudyDesign, StudyResult};
