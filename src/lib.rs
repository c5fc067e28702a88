pub mod about;
pub mod accessibility;
pub mod candidate;
pub mod complement;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod sequence;
pub mod stop_codon;
pub mod store;
pub mod windower;

pub use error::{ErrorKind, ToeholdError};
pub use pipeline::{AnalysisPipeline, AnalysisReport, ScoredCandidate, analyze};
