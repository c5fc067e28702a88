use crate::{candidate::ToeholdMotifs, error::ToeholdError, stop_codon::ReadingFrames};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_CONFIG_PATH: &str = ".toehold_config.json";
pub const DEFAULT_PAIRS_BIN: &str = "pairs";
pub const PAIRS_ENV_BIN: &str = "TOEHOLD_PAIRS_BIN";
pub const DEFAULT_WINDOW: usize = 15;

fn normalized_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// How the external folding tool is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Explicit executable. Falls back to `TOEHOLD_PAIRS_BIN`, then `pairs` on PATH.
    pub executable: Option<String>,
    /// Arguments placed before the file prefix, e.g. `["-material", "rna"]`.
    pub args: Vec<String>,
    pub file_prefix: String,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: None,
            args: vec![],
            file_prefix: "toehold".to_string(),
            timeout_ms: 60_000,
            poll_interval_ms: 50,
        }
    }
}

impl ToolConfig {
    pub fn resolved_executable(&self) -> String {
        self.executable
            .as_deref()
            .and_then(normalized_non_empty)
            .or_else(|| {
                std::env::var(PAIRS_ENV_BIN)
                    .ok()
                    .and_then(|v| normalized_non_empty(&v))
            })
            .unwrap_or_else(|| DEFAULT_PAIRS_BIN.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToeholdConfig {
    /// Root under which each folding run creates its own temporary directory.
    pub workdir: PathBuf,
    pub window: usize,
    /// Length of the accessibility slice scored per candidate. Defaults to the window.
    pub target_length: Option<usize>,
    pub reading_frames: ReadingFrames,
    pub allow_spacer: bool,
    pub motifs: ToeholdMotifs,
    pub tool: ToolConfig,
    pub verbose: bool,
}

impl Default for ToeholdConfig {
    fn default() -> Self {
        Self {
            workdir: std::env::temp_dir(),
            window: DEFAULT_WINDOW,
            target_length: None,
            reading_frames: ReadingFrames::default(),
            allow_spacer: true,
            motifs: ToeholdMotifs::default(),
            tool: ToolConfig::default(),
            verbose: false,
        }
    }
}

impl ToeholdConfig {
    pub fn with_workdir<P: AsRef<Path>>(workdir: P) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn load_from_path(path: &str) -> Result<Self, ToeholdError> {
        let text = std::fs::read_to_string(path).map_err(|e| ToeholdError::Io {
            message: format!("Could not read config file '{path}': {e}"),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ToeholdError::InvalidConfig {
            message: format!("Could not parse config JSON '{path}': {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &str) -> Result<Self, ToeholdError> {
        if Path::new(path).exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), ToeholdError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| ToeholdError::Io {
            message: format!("Could not write config file '{path}': {e}"),
        })
    }

    pub fn validate(&self) -> Result<(), ToeholdError> {
        let invalid = |message: String| -> Result<(), ToeholdError> {
            Err(ToeholdError::InvalidConfig { message })
        };
        if self.window == 0 {
            return invalid("window must be positive".to_string());
        }
        if self.target_length == Some(0) {
            return invalid("target_length must be positive".to_string());
        }
        if self.tool.timeout_ms == 0 {
            return invalid("tool.timeout_ms must be positive".to_string());
        }
        if self.tool.poll_interval_ms == 0 {
            return invalid("tool.poll_interval_ms must be positive".to_string());
        }
        let prefix = self.tool.file_prefix.trim();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return invalid(format!(
                "tool.file_prefix '{}' must be a non-empty file name",
                self.tool.file_prefix
            ));
        }
        self.motifs.normalized()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ToeholdConfig =
            serde_json::from_str(r#"{"window": 12, "tool": {"timeout_ms": 500}}"#).unwrap();
        assert_eq!(config.window, 12);
        assert_eq!(config.tool.timeout_ms, 500);
        assert_eq!(config.tool.poll_interval_ms, 50);
        assert_eq!(config.tool.file_prefix, "toehold");
        assert_eq!(config.reading_frames, ReadingFrames::First);
        assert!(config.allow_spacer);
        assert_eq!(config.motifs, ToeholdMotifs::default());
    }

    #[test]
    fn test_explicit_executable_wins() {
        let tool = ToolConfig {
            executable: Some("  /opt/nupack/bin/pairs ".to_string()),
            ..ToolConfig::default()
        };
        assert_eq!(tool.resolved_executable(), "/opt/nupack/bin/pairs");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ToeholdConfig::default();
        config.tool.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ToeholdConfig::default();
        config.tool.file_prefix = "../escape".to_string();
        assert!(config.validate().is_err());

        let mut config = ToeholdConfig::default();
        config.target_length = Some(0);
        assert!(config.validate().is_err());

        let mut config = ToeholdConfig::default();
        config.motifs.linker = "AXC".to_string();
        assert!(config.validate().is_err());

        assert!(ToeholdConfig::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let td = tempdir().unwrap();
        let path = td.path().join("config.json");
        let path = path.to_string_lossy().to_string();
        let mut config = ToeholdConfig::with_workdir(td.path());
        config.reading_frames = ReadingFrames::All;
        config.tool.args = vec!["-material".to_string(), "rna".to_string()];
        config.save_to_path(&path).unwrap();
        assert_eq!(ToeholdConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("absent.json");
        let config = ToeholdConfig::load_or_default(&path.to_string_lossy()).unwrap();
        assert_eq!(config.window, DEFAULT_WINDOW);
    }
}
