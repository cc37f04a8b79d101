pub mod capability;
pub mod classify;
pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod profiles;
pub mod summary;

pub use config::{DerivedFlag, DetectionResult, ProcessingHints, SiteConfiguration};
pub use discover::{CandidateUrl, UrlOrigin};
pub use error::AnalyzeError;
pub use fetch::{Fetch, FetchedPage, HttpFetcher};
pub use pipeline::{AnalysisOutcome, AnalysisStage, Analyzer};
pub use profiles::SiteType;
pub use summary::{LinkCandidate, RegionKind, StructuralSummary};
