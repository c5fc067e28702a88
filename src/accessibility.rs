//! Per-base accessibility (unpaired probability) of a target sequence.
//!
//! The default estimator shells out to NUPACK's `pairs`, which reads
//! `<prefix>.in` and writes `<prefix>.ppairs`. Each call works inside its own
//! temporary directory so concurrent analyses never share files.

use crate::{config::ToolConfig, error::ToeholdError, sequence::Sequence};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, ErrorKind},
    ops::Range,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    time::Instant,
};

pub const INPUT_EXTENSION: &str = "in";
pub const OUTPUT_EXTENSION: &str = "ppairs";

const STDOUT_LOG: &str = "tool.stdout";
const STDERR_LOG: &str = "tool.stderr";
const TEMPDIR_PREFIX: &str = "toehold-";

/// Rounding slack allowed around [0, 1] before a probability is rejected.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessibilityProfile(Vec<f64>);

impl AccessibilityProfile {
    pub fn new(values: Vec<f64>) -> Result<Self, ToeholdError> {
        for (idx, value) in values.iter().enumerate() {
            if !(0.0..=1.0).contains(value) {
                return Err(ToeholdError::parse(
                    None,
                    format!("probability {value} at position {} is outside [0, 1]", idx + 1),
                ));
            }
        }
        Ok(Self(values))
    }

    #[inline(always)]
    pub fn values(&self) -> &[f64] {
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

    /// The part of `range` that lies inside the profile.
    pub fn slice(&self, range: Range<usize>) -> &[f64] {
        let end = range.end.min(self.0.len());
        let start = range.start.min(end);
        &self.0[start..end]
    }

    pub fn mean(&self, range: Range<usize>) -> Option<f64> {
        let values = self.slice(range);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

pub trait AccessibilityEstimator {
    fn estimate(&self, sequence: &Sequence) -> Result<AccessibilityProfile, ToeholdError>;
}

/// Returns a precomputed profile, e.g. one loaded from an earlier run.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedProfile {
    profile: AccessibilityProfile,
}

impl FixedProfile {
    pub fn new(values: Vec<f64>) -> Result<Self, ToeholdError> {
        Ok(Self {
            profile: AccessibilityProfile::new(values)?,
        })
    }

    pub fn uniform(value: f64, length: usize) -> Result<Self, ToeholdError> {
        Self::new(vec![value; length])
    }
}

impl AccessibilityEstimator for FixedProfile {
    fn estimate(&self, sequence: &Sequence) -> Result<AccessibilityProfile, ToeholdError> {
        if self.profile.len() != sequence.len() {
            return Err(ToeholdError::parse(
                None,
                format!(
                    "profile has {} values for a sequence of length {}",
                    self.profile.len(),
                    sequence.len()
                ),
            ));
        }
        Ok(self.profile.clone())
    }
}

/// Parses a `pairs` probability file for a sequence of `length` bases.
///
/// Only the unpaired records (`j == length + 1`) are kept, placed at position `i`.
pub fn parse_pairs_output<R: BufRead>(
    reader: R,
    length: usize,
) -> Result<AccessibilityProfile, ToeholdError> {
    let unpaired_column = length + 1;
    let mut values: Vec<Option<f64>> = vec![None; length];

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| ToeholdError::parse(Some(line_no), e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        match fields.as_slice() {
            [header] => {
                let declared = parse_position(header, line_no)?;
                if declared != length {
                    return Err(ToeholdError::parse(
                        Some(line_no),
                        format!("output is for {declared} bases, expected {length}"),
                    ));
                }
            }
            [i, j, p] => {
                let i = parse_position(i, line_no)?;
                let j = parse_position(j, line_no)?;
                if j != unpaired_column {
                    continue;
                }
                if i == 0 || i > length {
                    return Err(ToeholdError::parse(
                        Some(line_no),
                        format!("position {i} is outside 1..={length}"),
                    ));
                }
                let p = parse_probability(p, line_no)?;
                let slot = &mut values[i - 1];
                if slot.is_some() {
                    return Err(ToeholdError::parse(
                        Some(line_no),
                        format!("duplicate unpaired record for position {i}"),
                    ));
                }
                *slot = Some(p);
            }
            _ => {
                return Err(ToeholdError::parse(
                    Some(line_no),
                    format!("expected 'i j p', found '{trimmed}'"),
                ));
            }
        }
    }

    let found = values.iter().filter(|v| v.is_some()).count();
    if found != length {
        return Err(ToeholdError::parse(
            None,
            format!("found unpaired probabilities for {found} of {length} positions"),
        ));
    }
    AccessibilityProfile::new(values.into_iter().flatten().collect())
}

fn parse_position(field: &str, line_no: usize) -> Result<usize, ToeholdError> {
    field
        .parse::<usize>()
        .map_err(|e| ToeholdError::parse(Some(line_no), format!("bad position '{field}': {e}")))
}

fn parse_probability(field: &str, line_no: usize) -> Result<f64, ToeholdError> {
    let p = field.parse::<f64>().map_err(|e| {
        ToeholdError::parse(Some(line_no), format!("bad probability '{field}': {e}"))
    })?;
    if p.is_nan() || p < -PROBABILITY_TOLERANCE || p > 1.0 + PROBABILITY_TOLERANCE {
        return Err(ToeholdError::parse(
            Some(line_no),
            format!("probability {p} is outside [0, 1]"),
        ));
    }
    Ok(p.clamp(0.0, 1.0))
}

/// Runs the external `pairs` tool once per estimate.
#[derive(Debug, Clone)]
pub struct PairsEstimator {
    tool: ToolConfig,
    workdir: PathBuf,
    verbose: bool,
}

impl PairsEstimator {
    pub fn new<P: AsRef<Path>>(tool: ToolConfig, workdir: P) -> Self {
        Self {
            tool,
            workdir: workdir.as_ref().to_path_buf(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn tool_failed(executable: &str, args: &[String], e: std::io::Error) -> ToeholdError {
        ToeholdError::ToolFailed {
            executable: executable.to_string(),
            args: args.to_vec(),
            status: None,
            stderr: e.to_string(),
        }
    }

    fn spawn(&self, executable: &str, args: &[String], dir: &Path) -> Result<Child, ToeholdError> {
        let stdout = File::create(dir.join(STDOUT_LOG))?;
        let stderr = File::create(dir.join(STDERR_LOG))?;
        Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ToeholdError::ToolNotFound {
                        executable: executable.to_string(),
                    }
                } else {
                    Self::tool_failed(executable, args, e)
                }
            })
    }

    /// Waits for `child`, killing it once the configured timeout elapses.
    fn wait_bounded(
        &self,
        child: &mut Child,
        executable: &str,
        args: &[String],
    ) -> Result<Option<ExitStatus>, ToeholdError> {
        let started = Instant::now();
        let timeout = self.tool.timeout();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Self::tool_failed(executable, args, e));
                }
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                // The child may exit between try_wait and kill
                let _ = child.kill();
                child
                    .wait()
                    .map_err(|e| Self::tool_failed(executable, args, e))?;
                return Ok(None);
            }
            std::thread::sleep(self.tool.poll_interval().min(timeout - elapsed));
        }
    }

    fn run_in(
        &self,
        dir: &Path,
        sequence: &Sequence,
    ) -> Result<AccessibilityProfile, ToeholdError> {
        let file_prefix = &self.tool.file_prefix;
        let prefix = dir.join(file_prefix);
        let input_path = dir.join(format!("{file_prefix}.{INPUT_EXTENSION}"));
        let output_path = dir.join(format!("{file_prefix}.{OUTPUT_EXTENSION}"));
        fs::write(&input_path, format!("{sequence}\n"))?;

        let executable = self.tool.resolved_executable();
        let mut args = self.tool.args.clone();
        args.push(prefix.to_string_lossy().to_string());

        let mut child = self.spawn(&executable, &args, dir)?;
        let Some(status) = self.wait_bounded(&mut child, &executable, &args)? else {
            return Err(ToeholdError::Timeout {
                executable,
                timeout_ms: self.tool.timeout_ms,
            });
        };

        if !status.success() {
            let stderr = fs::read_to_string(dir.join(STDERR_LOG)).unwrap_or_default();
            return Err(ToeholdError::ToolFailed {
                executable,
                args,
                status: status.code(),
                stderr,
            });
        }

        let file = match File::open(&output_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ToeholdError::MissingOutput {
                    executable,
                    path: output_path.to_string_lossy().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        parse_pairs_output(BufReader::new(file), sequence.len())
    }
}

impl AccessibilityEstimator for PairsEstimator {
    fn estimate(&self, sequence: &Sequence) -> Result<AccessibilityProfile, ToeholdError> {
        fs::create_dir_all(&self.workdir).map_err(|e| ToeholdError::Io {
            message: format!(
                "Could not create work directory '{}': {e}",
                self.workdir.display()
            ),
        })?;
        let scratch = tempfile::Builder::new()
            .prefix(TEMPDIR_PREFIX)
            .tempdir_in(&self.workdir)
            .map_err(|e| ToeholdError::Io {
                message: format!(
                    "Could not create temporary directory in '{}': {e}",
                    self.workdir.display()
                ),
            })?;
        let result = self.run_in(scratch.path(), sequence);
        if self.verbose {
            if let Err(e) = &result {
                eprintln!(
                    "Accessibility estimate failed in {}: {e}",
                    scratch.path().display()
                );
            }
        }
        // Dropping `scratch` removes the input, output and log files
        result
    }
}
