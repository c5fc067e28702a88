//! Machine-readable contracts shared between the analysis core and its front
//! ends (CLI output, stored runs, CSV export).

use serde::{Deserialize, Serialize};

pub type RunId = String;

pub const PROTOCOL_VERSION: &str = "v1";

/// One row of the ranked candidate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidateRecord {
    pub rank: usize,
    pub offset: usize,
    pub target: String,
    pub toehold: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacer: Option<char>,
    pub accessibility: f64,
    pub defect: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub protocol_version: String,
    pub run_id: RunId,
    #[serde(default)]
    pub name: Option<String>,
    pub sequence_length: usize,
    pub window: usize,
    pub skipped_windows: usize,
    pub candidates: Vec<ScoredCandidateRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunListing {
    pub run_id: RunId,
    #[serde(default)]
    pub name: Option<String>,
    pub sequence_length: usize,
    pub window: usize,
    pub candidate_count: usize,
}

/// Everything the detail view needs for a single ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetailRecord {
    pub run_id: RunId,
    pub index: usize,
    pub candidate_count: usize,
    pub candidate: ScoredCandidateRecord,
    pub target_reverse_complement: String,
    pub target_accessibility: Vec<f64>,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_candidate_without_spacer_omits_field() {
        let record = ScoredCandidateRecord {
            rank: 1,
            offset: 3,
            target: "ACGU".to_string(),
            toehold: "UGCAACGU".to_string(),
            spacer: None,
            accessibility: 0.75,
            defect: 0.25,
            score: 3.75,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("spacer"));
        let back: ScoredCandidateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn detail_record_defaults_missing_variants() {
        let json = r#"{
            "run_id": "run-1",
            "index": 0,
            "candidate_count": 1,
            "candidate": {
                "rank": 1, "offset": 0, "target": "A", "toehold": "A",
                "accessibility": 1.0, "defect": 0.0, "score": 5.0
            },
            "target_reverse_complement": "U",
            "target_accessibility": [1.0]
        }"#;
        let detail: CandidateDetailRecord = serde_json::from_str(json).unwrap();
        assert!(detail.variants.is_empty());
        assert_eq!(detail.candidate.spacer, None);
    }
}
