use crate::error::ToeholdError;
use anyhow::{Context, Result};
use bio::io::fasta;
use serde::{Deserialize, Serialize};
use std::{fmt, fs::File, path::Path, str::FromStr};

/// Strips whitespace, upper-cases and rewrites `T` as `U`. Does not validate.
pub fn normalize_rna(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'T' => 'U',
            other => other,
        })
        .collect()
}

#[inline(always)]
pub fn is_rna_base(base: char) -> bool {
    matches!(base, 'A' | 'C' | 'G' | 'U')
}

/// A normalized RNA sequence over {A, C, G, U}.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence(String);

impl Sequence {
    pub fn new(raw: &str) -> Result<Self, ToeholdError> {
        let normalized = normalize_rna(raw);
        if normalized.is_empty() {
            return Err(ToeholdError::EmptySequence);
        }
        if let Some((position, base)) = normalized
            .chars()
            .enumerate()
            .find(|(_, c)| !is_rna_base(*c))
        {
            return Err(ToeholdError::InvalidBase { base, position });
        }
        Ok(Self(normalized))
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Sequence {
    type Err = ToeholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Sequence {
    type Error = ToeholdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Sequence> for String {
    fn from(value: Sequence) -> Self {
        value.0
    }
}

impl AsRef<str> for Sequence {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw (not yet normalized) input sequence with an optional record name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: Option<String>,
    pub raw: String,
}

pub fn load_fasta_records<P: AsRef<Path>>(path: P) -> Result<Vec<NamedSequence>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Could not open FASTA file '{}'", path.display()))?;
    let mut ret = vec![];
    for record in fasta::Reader::new(file).records() {
        let record = record
            .with_context(|| format!("Could not read FASTA record from '{}'", path.display()))?;
        ret.push(NamedSequence {
            name: Some(record.id().to_string()).filter(|id| !id.is_empty()),
            raw: String::from_utf8_lossy(record.seq()).to_string(),
        });
    }
    if ret.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no records", path.display());
    }
    Ok(ret)
}
