use crate::{
    accessibility::{AccessibilityEstimator, AccessibilityProfile, PairsEstimator},
    candidate::{Candidate, CandidateBuilder},
    config::ToeholdConfig,
    error::ToeholdError,
    sequence::{NamedSequence, Sequence},
    windower::split_windows,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use toehold_protocol::{AnalysisSummary, PROTOCOL_VERSION, RunId, ScoredCandidateRecord};

/// Multiplier applied to `1 - defect` for the displayed score.
pub const DISPLAY_SCALE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Normalize,
    Window,
    BuildCandidates,
    EstimateAccessibility,
    Score,
    Rank,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Mean unpaired probability over the target slice. Higher is better.
    pub accessibility: f64,
    /// `1 - accessibility`. Lower is better.
    pub defect: f64,
    pub target_accessibility: Vec<f64>,
}

impl ScoredCandidate {
    pub fn display_score(&self) -> f64 {
        DISPLAY_SCALE * (1.0 - self.defect)
    }

    pub fn to_record(&self, rank: usize) -> ScoredCandidateRecord {
        ScoredCandidateRecord {
            rank,
            offset: self.candidate.offset,
            target: self.candidate.target.clone(),
            toehold: self.candidate.toehold.clone(),
            spacer: self.candidate.spacer,
            accessibility: self.accessibility,
            defect: self.defect,
            score: self.display_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub name: Option<String>,
    pub sequence: Sequence,
    pub window: usize,
    pub target_length: usize,
    pub skipped_windows: usize,
    /// Motifs, frames and spacer policy the candidates were built with.
    #[serde(default)]
    pub construction: CandidateBuilder,
    /// `None` when no window produced a candidate and the tool was never run.
    #[serde(default)]
    pub profile: Option<AccessibilityProfile>,
    /// Ranked, best first.
    pub candidates: Vec<ScoredCandidate>,
}

impl AnalysisReport {
    pub fn records(&self) -> Vec<ScoredCandidateRecord> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(idx, scored)| scored.to_record(idx + 1))
            .collect()
    }

    pub fn summary(&self, run_id: &RunId) -> AnalysisSummary {
        AnalysisSummary {
            protocol_version: PROTOCOL_VERSION.to_string(),
            run_id: run_id.clone(),
            name: self.name.clone(),
            sequence_length: self.sequence.len(),
            window: self.window,
            skipped_windows: self.skipped_windows,
            candidates: self.records(),
        }
    }
}

/// Scores every candidate against `profile`, unranked.
pub fn score_candidates(
    candidates: Vec<Candidate>,
    profile: &AccessibilityProfile,
    target_length: usize,
) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            let range = candidate.offset..candidate.offset.saturating_add(target_length);
            let target_accessibility = profile.slice(range.clone()).to_vec();
            let accessibility = profile.mean(range).unwrap_or(0.0);
            ScoredCandidate {
                candidate,
                accessibility,
                defect: 1.0 - accessibility,
                target_accessibility,
            }
        })
        .collect()
}

/// Best accessibility first; equal scores keep window order.
pub fn rank_candidates(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.accessibility
            .total_cmp(&a.accessibility)
            .then(a.candidate.offset.cmp(&b.candidate.offset))
    });
}

pub struct AnalysisPipeline<E> {
    config: ToeholdConfig,
    builder: CandidateBuilder,
    estimator: E,
}

impl AnalysisPipeline<PairsEstimator> {
    /// A pipeline backed by the external `pairs` tool described in `config`.
    pub fn with_pairs_tool(config: ToeholdConfig) -> Result<Self, ToeholdError> {
        let estimator =
            PairsEstimator::new(config.tool.clone(), &config.workdir).verbose(config.verbose);
        Self::new(config, estimator)
    }
}

impl<E: AccessibilityEstimator> AnalysisPipeline<E> {
    pub fn new(config: ToeholdConfig, estimator: E) -> Result<Self, ToeholdError> {
        config.validate()?;
        Ok(Self {
            builder: CandidateBuilder::from_config(&config)?,
            config,
            estimator,
        })
    }

    pub fn config(&self) -> &ToeholdConfig {
        &self.config
    }

    pub fn builder(&self) -> &CandidateBuilder {
        &self.builder
    }

    fn trace(&self, name: Option<&str>, stage: PipelineStage) {
        if self.config.verbose {
            eprintln!("[{}] {stage:?}", name.unwrap_or("sequence"));
        }
    }

    pub fn analyze(&self, raw: &str, window: usize) -> Result<AnalysisReport, ToeholdError> {
        self.analyze_named(None, raw, window)
    }

    pub fn analyze_named(
        &self,
        name: Option<String>,
        raw: &str,
        window: usize,
    ) -> Result<AnalysisReport, ToeholdError> {
        let label = name.as_deref();

        self.trace(label, PipelineStage::Normalize);
        let sequence = Sequence::new(raw).map_err(|e| e.at_stage(PipelineStage::Normalize))?;

        self.trace(label, PipelineStage::Window);
        let windows =
            split_windows(&sequence, window).map_err(|e| e.at_stage(PipelineStage::Window))?;

        self.trace(label, PipelineStage::BuildCandidates);
        let mut candidates = Vec::with_capacity(windows.len());
        let mut skipped_windows = 0;
        for window in &windows {
            match self.builder.build(window) {
                Ok(candidate) => candidates.push(candidate),
                Err(ToeholdError::NoValidCandidate { .. }) => skipped_windows += 1,
                Err(e) => return Err(e.at_stage(PipelineStage::BuildCandidates)),
            }
        }
        if skipped_windows > 0 && self.config.verbose {
            eprintln!(
                "[{}] skipped {skipped_windows} of {} windows without a valid toehold",
                label.unwrap_or("sequence"),
                windows.len()
            );
        }

        let target_length = self.config.target_length.unwrap_or(window);
        let mut report = AnalysisReport {
            name: name.clone(),
            sequence: sequence.clone(),
            window,
            target_length,
            skipped_windows,
            construction: self.builder.clone(),
            profile: None,
            candidates: vec![],
        };
        if candidates.is_empty() {
            self.trace(label, PipelineStage::Done);
            return Ok(report);
        }

        self.trace(label, PipelineStage::EstimateAccessibility);
        let profile = self
            .estimator
            .estimate(&sequence)
            .map_err(|e| e.at_stage(PipelineStage::EstimateAccessibility))?;
        if profile.len() != sequence.len() {
            return Err(ToeholdError::parse(
                None,
                format!(
                    "accessibility profile has {} values for {} bases",
                    profile.len(),
                    sequence.len()
                ),
            )
            .at_stage(PipelineStage::EstimateAccessibility));
        }

        self.trace(label, PipelineStage::Score);
        let mut scored = score_candidates(candidates, &profile, target_length);

        self.trace(label, PipelineStage::Rank);
        rank_candidates(&mut scored);

        self.trace(label, PipelineStage::Done);
        report.profile = Some(profile);
        report.candidates = scored;
        Ok(report)
    }
}

impl<E: AccessibilityEstimator + Sync> AnalysisPipeline<E> {
    /// Analyzes several sequences concurrently; results keep the input order.
    pub fn analyze_batch(
        &self,
        records: &[NamedSequence],
        window: usize,
    ) -> Vec<Result<AnalysisReport, ToeholdError>> {
        records
            .par_iter()
            .map(|record| self.analyze_named(record.name.clone(), &record.raw, window))
            .collect()
    }
}

/// Analyzes `sequence` with the default configuration, running the folding
/// tool inside a fresh temporary directory under `workdir`.
pub fn analyze<P: AsRef<Path>>(
    sequence: &str,
    window: usize,
    workdir: P,
) -> Result<AnalysisReport, ToeholdError> {
    AnalysisPipeline::with_pairs_tool(ToeholdConfig::with_workdir(workdir))?
        .analyze(sequence, window)
}
