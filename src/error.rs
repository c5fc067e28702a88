use crate::pipeline::PipelineStage;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Coarse classification of failures, stable enough for machine consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    ExternalToolFailure,
    NoValidCandidate,
    PipelineFailure,
    NotFound,
    Io,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToeholdError {
    EmptySequence,
    InvalidBase {
        base: char,
        position: usize,
    },
    InvalidWindow {
        window: usize,
        sequence_length: usize,
    },
    InvalidConfig {
        message: String,
    },
    NoValidCandidate {
        offset: usize,
    },
    ToolNotFound {
        executable: String,
    },
    ToolFailed {
        executable: String,
        args: Vec<String>,
        status: Option<i32>,
        stderr: String,
    },
    MissingOutput {
        executable: String,
        path: String,
    },
    Timeout {
        executable: String,
        timeout_ms: u64,
    },
    Parse {
        line: Option<usize>,
        message: String,
    },
    Pipeline {
        stage: PipelineStage,
        source: Box<ToeholdError>,
    },
    NotFound {
        message: String,
    },
    Io {
        message: String,
    },
}

impl ToeholdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySequence
            | Self::InvalidBase { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidConfig { .. } => ErrorKind::InvalidInput,
            Self::NoValidCandidate { .. } => ErrorKind::NoValidCandidate,
            Self::ToolNotFound { .. }
            | Self::ToolFailed { .. }
            | Self::MissingOutput { .. }
            | Self::Timeout { .. }
            | Self::Parse { .. } => ErrorKind::ExternalToolFailure,
            Self::Pipeline { stage, source } => match stage {
                PipelineStage::EstimateAccessibility => ErrorKind::PipelineFailure,
                _ => source.kind(),
            },
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Wraps the error with the pipeline stage it was raised in.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        match self {
            Self::Pipeline { .. } => self,
            other => Self::Pipeline {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping pipeline stage wrappers.
    pub fn root_cause(&self) -> &ToeholdError {
        match self {
            Self::Pipeline { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn parse(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ToeholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySequence => write!(f, "Sequence is empty after normalization"),
            Self::InvalidBase { base, position } => write!(
                f,
                "Invalid base '{base}' at position {position}, expected one of A, C, G, U/T"
            ),
            Self::InvalidWindow {
                window,
                sequence_length,
            } => write!(
                f,
                "Window length {window} is out of range for a sequence of length {sequence_length}"
            ),
            Self::InvalidConfig { message } => write!(f, "Invalid configuration: {message}"),
            Self::NoValidCandidate { offset } => write!(
                f,
                "No stop-codon-free toehold could be built for the window at offset {offset}"
            ),
            Self::ToolNotFound { executable } => write!(
                f,
                "Could not find folding tool executable '{}'. Install NUPACK or set {}",
                executable,
                crate::config::PAIRS_ENV_BIN
            ),
            Self::ToolFailed {
                executable,
                args,
                status,
                stderr,
            } => write!(
                f,
                "Folding tool failed: {} {} (status={:?}, stderr='{}')",
                executable,
                args.join(" "),
                status,
                stderr.trim()
            ),
            Self::MissingOutput { executable, path } => write!(
                f,
                "Folding tool '{executable}' reported success but did not produce '{path}'"
            ),
            Self::Timeout {
                executable,
                timeout_ms,
            } => write!(
                f,
                "Folding tool '{executable}' did not finish within {timeout_ms} ms and was killed"
            ),
            Self::Parse {
                line: Some(line),
                message,
            } => write!(f, "Could not parse pair probabilities (line {line}): {message}"),
            Self::Parse {
                line: None,
                message,
            } => write!(f, "Could not parse pair probabilities: {message}"),
            Self::Pipeline { stage, source } => {
                write!(f, "Analysis failed during {stage:?}: {source}")
            }
            Self::NotFound { message } => write!(f, "{message}"),
            Self::Io { message } => write!(f, "{message}"),
        }
    }
}

impl Error for ToeholdError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pipeline { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ToeholdError {
    fn from(err: std::io::Error) -> Self {
        ToeholdError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ToeholdError {
    fn from(err: serde_json::Error) -> Self {
        ToeholdError::Io {
            message: format!("JSON error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessibility_failure_is_pipeline_failure() {
        let err = ToeholdError::Timeout {
            executable: "pairs".to_string(),
            timeout_ms: 10,
        }
        .at_stage(PipelineStage::EstimateAccessibility);
        assert_eq!(err.kind(), ErrorKind::PipelineFailure);
        assert_eq!(err.root_cause().kind(), ErrorKind::ExternalToolFailure);
        assert!(err.to_string().contains("EstimateAccessibility"));
    }

    #[test]
    fn test_input_errors_keep_their_kind_when_staged() {
        let err = ToeholdError::InvalidWindow {
            window: 30,
            sequence_length: 20,
        }
        .at_stage(PipelineStage::Window);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        // Restaging does not nest wrappers
        let again = err.clone().at_stage(PipelineStage::Score);
        assert_eq!(again, err);
    }
}
