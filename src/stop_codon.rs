use serde::{Deserialize, Serialize};

pub const STOP_CODONS: [&[u8; 3]; 3] = [b"UAA", b"UAG", b"UGA"];

/// Which reading frames the scanner checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingFrames {
    /// Frame 0 only. A trailing partial codon is never checked.
    #[default]
    First,
    /// Frames 0, 1 and 2.
    All,
}

impl ReadingFrames {
    pub fn offsets(self) -> &'static [usize] {
        match self {
            Self::First => &[0],
            Self::All => &[0, 1, 2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopCodonHit {
    pub frame: usize,
    pub position: usize,
}

#[inline(always)]
pub fn is_stop_codon(codon: &[u8]) -> bool {
    if codon.len() != 3 {
        return false;
    }
    let normalized = [
        normalize_base(codon[0]),
        normalize_base(codon[1]),
        normalize_base(codon[2]),
    ];
    STOP_CODONS.iter().any(|stop| **stop == normalized)
}

#[inline(always)]
fn normalize_base(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'T' => b'U',
        other => other,
    }
}

pub fn first_stop_codon(sequence: &str, frames: ReadingFrames) -> Option<StopCodonHit> {
    let bytes = sequence.as_bytes();
    frames.offsets().iter().find_map(|&frame| {
        bytes
            .get(frame..)?
            .chunks_exact(3)
            .position(is_stop_codon)
            .map(|codon_idx| StopCodonHit {
                frame,
                position: frame + codon_idx * 3,
            })
    })
}

/// `true` when no stop codon occurs in any of the checked frames.
pub fn has_no_stop_codon(sequence: &str, frames: ReadingFrames) -> bool {
    first_stop_codon(sequence, frames).is_none()
}
