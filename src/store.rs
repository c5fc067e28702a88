use crate::{error::ToeholdError, pipeline::AnalysisReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use toehold_protocol::{AnalysisSummary, CandidateDetailRecord, RunId, RunListing};

pub const DEFAULT_STATE_PATH: &str = ".toehold_state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub run_id: RunId,
    pub created_at_unix_ms: u128,
    pub report: AnalysisReport,
}

/// Analysis results kept on the server side and addressed by run id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultStore {
    #[serde(default)]
    runs: Vec<StoredRun>,
    #[serde(default)]
    next_run_counter: u64,
}

fn now_unix_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

impl ResultStore {
    pub fn load_from_path(path: &str) -> Result<Self, ToeholdError> {
        let text = std::fs::read_to_string(path).map_err(|e| ToeholdError::Io {
            message: format!("Could not read state file '{path}': {e}"),
        })?;
        serde_json::from_str(&text).map_err(|e| ToeholdError::Io {
            message: format!("Could not parse state JSON '{path}': {e}"),
        })
    }

    /// Loads `path` when it exists, otherwise starts empty.
    pub fn load_or_default(path: &str) -> Result<Self, ToeholdError> {
        if Path::new(path).exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), ToeholdError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| ToeholdError::Io {
            message: format!("Could not serialize state: {e}"),
        })?;
        std::fs::write(path, text).map_err(|e| ToeholdError::Io {
            message: format!("Could not write state file '{path}': {e}"),
        })
    }

    fn next_run_id(&mut self) -> RunId {
        self.next_run_counter += 1;
        format!("run-{}", self.next_run_counter)
    }

    pub fn insert(&mut self, report: AnalysisReport) -> RunId {
        let run_id = self.next_run_id();
        self.runs.push(StoredRun {
            run_id: run_id.clone(),
            created_at_unix_ms: now_unix_ms(),
            report,
        });
        run_id
    }

    pub fn get(&self, run_id: &str) -> Result<&StoredRun, ToeholdError> {
        self.runs
            .iter()
            .find(|run| run.run_id == run_id)
            .ok_or_else(|| ToeholdError::NotFound {
                message: format!("Run '{run_id}' not found"),
            })
    }

    pub fn remove(&mut self, run_id: &str) -> Result<StoredRun, ToeholdError> {
        let idx = self
            .runs
            .iter()
            .position(|run| run.run_id == run_id)
            .ok_or_else(|| ToeholdError::NotFound {
                message: format!("Run '{run_id}' not found"),
            })?;
        Ok(self.runs.remove(idx))
    }

    pub fn runs(&self) -> Vec<RunListing> {
        self.runs
            .iter()
            .map(|run| RunListing {
                run_id: run.run_id.clone(),
                name: run.report.name.clone(),
                sequence_length: run.report.sequence.len(),
                window: run.report.window,
                candidate_count: run.report.candidates.len(),
            })
            .collect()
    }

    pub fn summary(&self, run_id: &str) -> Result<AnalysisSummary, ToeholdError> {
        let run = self.get(run_id)?;
        Ok(run.report.summary(&run.run_id))
    }

    /// Detail view of the candidate at `index`, which wraps around the ranked list.
    ///
    /// Variants are rebuilt with the construction settings stored on the run.
    pub fn candidate_detail(
        &self,
        run_id: &str,
        index: usize,
    ) -> Result<CandidateDetailRecord, ToeholdError> {
        let run = self.get(run_id)?;
        let candidates = &run.report.candidates;
        if candidates.is_empty() {
            return Err(ToeholdError::NotFound {
                message: format!("Run '{run_id}' has no candidates"),
            });
        }
        let index = index % candidates.len();
        let scored = &candidates[index];
        Ok(CandidateDetailRecord {
            run_id: run.run_id.clone(),
            index,
            candidate_count: candidates.len(),
            candidate: scored.to_record(index + 1),
            target_reverse_complement: scored.candidate.target_reverse_complement.clone(),
            target_accessibility: scored.target_accessibility.clone(),
            variants: run.report.construction.variants(&scored.candidate.target),
        })
    }
}
