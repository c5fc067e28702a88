use crate::{
    complement::reverse_complement,
    config::ToeholdConfig,
    error::ToeholdError,
    sequence::Sequence,
    stop_codon::{ReadingFrames, has_no_stop_codon},
    windower::Window,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEM5: &str = "UGCAUCCUCCUCCUCCU";
pub const DEFAULT_STEM3: &str = "AGGAGGAGAAAAAUGCA";
pub const DEFAULT_LINKER: &str = "AACCUGGCGGCAGCGCAAAAG";

/// Spacer bases in the order they are tried.
pub const SPACER_BASES: [char; 4] = ['A', 'G', 'U', 'C'];

/// Trailing stem3 bases that open the validated junction.
const JUNCTION_STEM3_BASES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToeholdMotifs {
    pub stem5: String,
    pub stem3: String,
    pub linker: String,
}

impl Default for ToeholdMotifs {
    fn default() -> Self {
        Self {
            stem5: DEFAULT_STEM5.to_string(),
            stem3: DEFAULT_STEM3.to_string(),
            linker: DEFAULT_LINKER.to_string(),
        }
    }
}

impl ToeholdMotifs {
    /// Returns the motifs normalized to upper-case RNA, rejecting empty or invalid ones.
    pub fn normalized(&self) -> Result<Self, ToeholdError> {
        let motif = |name: &str, value: &str| {
            Sequence::new(value)
                .map(String::from)
                .map_err(|e| ToeholdError::InvalidConfig {
                    message: format!("motif {name}: {e}"),
                })
        };
        Ok(Self {
            stem5: motif("stem5", &self.stem5)?,
            stem3: motif("stem3", &self.stem3)?,
            linker: motif("linker", &self.linker)?,
        })
    }
}

/// A toehold switch built from one target window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub offset: usize,
    pub target: String,
    pub target_reverse_complement: String,
    pub toehold: String,
    #[serde(default)]
    pub spacer: Option<char>,
}

/// Construction settings. Stored with each report so later detail views
/// rebuild variants with the motifs the run was analyzed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateBuilder {
    motifs: ToeholdMotifs,
    frames: ReadingFrames,
    allow_spacer: bool,
}

impl Default for CandidateBuilder {
    fn default() -> Self {
        Self {
            motifs: ToeholdMotifs::default(),
            frames: ReadingFrames::default(),
            allow_spacer: true,
        }
    }
}

impl CandidateBuilder {
    pub fn new(
        motifs: &ToeholdMotifs,
        frames: ReadingFrames,
        allow_spacer: bool,
    ) -> Result<Self, ToeholdError> {
        Ok(Self {
            motifs: motifs.normalized()?,
            frames,
            allow_spacer,
        })
    }

    pub fn from_config(config: &ToeholdConfig) -> Result<Self, ToeholdError> {
        Self::new(&config.motifs, config.reading_frames, config.allow_spacer)
    }

    pub fn motifs(&self) -> &ToeholdMotifs {
        &self.motifs
    }

    /// The region scanned for stop codons: stem3 tail, optional spacer, linker.
    pub fn junction(&self, spacer: Option<char>) -> String {
        let stem3 = &self.motifs.stem3;
        let tail = &stem3[stem3.len().saturating_sub(JUNCTION_STEM3_BASES)..];
        let mut ret = String::with_capacity(tail.len() + 1 + self.motifs.linker.len());
        ret.push_str(tail);
        ret.extend(spacer);
        ret.push_str(&self.motifs.linker);
        ret
    }

    pub fn is_valid_junction(&self, spacer: Option<char>) -> bool {
        has_no_stop_codon(&self.junction(spacer), self.frames)
    }

    fn assemble(&self, loop_bases: &str, spacer: Option<char>) -> String {
        let mut ret = String::with_capacity(
            self.motifs.stem5.len()
                + loop_bases.len()
                + self.motifs.stem3.len()
                + 1
                + self.motifs.linker.len(),
        );
        ret.push_str(&self.motifs.stem5);
        ret.push_str(loop_bases);
        ret.push_str(&self.motifs.stem3);
        ret.extend(spacer);
        ret.push_str(&self.motifs.linker);
        ret
    }

    /// Spacer choices in preference order: none first, then each spacer base if allowed.
    fn spacer_choices(&self) -> impl Iterator<Item = Option<char>> + '_ {
        std::iter::once(None).chain(
            SPACER_BASES
                .into_iter()
                .map(Some)
                .filter(|_| self.allow_spacer),
        )
    }

    pub fn build(&self, window: &Window<'_>) -> Result<Candidate, ToeholdError> {
        let spacer = self
            .spacer_choices()
            .find(|spacer| self.is_valid_junction(*spacer))
            .ok_or(ToeholdError::NoValidCandidate {
                offset: window.offset(),
            })?;
        Ok(Candidate {
            offset: window.offset(),
            target: window.bases().to_string(),
            target_reverse_complement: reverse_complement(window.bases())?,
            toehold: self.assemble(window.bases(), spacer),
            spacer,
        })
    }

    /// Every construction for `loop_bases` whose junction passes, in preference order.
    pub fn variants(&self, loop_bases: &str) -> Vec<String> {
        self.spacer_choices()
            .filter(|spacer| self.is_valid_junction(*spacer))
            .map(|spacer| self.assemble(loop_bases, spacer))
            .collect()
    }
}
