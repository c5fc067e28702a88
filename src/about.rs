use crate::config::{DEFAULT_PAIRS_BIN, PAIRS_ENV_BIN};
use serde::Serialize;
use toehold_protocol::PROTOCOL_VERSION;

pub const TOEHOLD_DISPLAY_VERSION: &str = env!("TOEHOLD_DISPLAY_VERSION");
pub const TOEHOLD_BUILD_N: &str = env!("TOEHOLD_BUILD_N");
/// Rust target the binary was built for, e.g. `x86_64-unknown-linux-gnu`.
pub const TOEHOLD_BUILD_TARGET: &str = env!("TOEHOLD_BUILD_TARGET");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build: &'static str,
    pub target: &'static str,
    pub protocol_version: &'static str,
    pub folding_tool: &'static str,
    pub folding_tool_env: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: TOEHOLD_DISPLAY_VERSION,
        build: TOEHOLD_BUILD_N,
        target: TOEHOLD_BUILD_TARGET,
        protocol_version: PROTOCOL_VERSION,
        folding_tool: DEFAULT_PAIRS_BIN,
        folding_tool_env: PAIRS_ENV_BIN,
    }
}

pub fn version_cli_text() -> String {
    let info = build_info();
    format!(
        "toehold-designer {} ({})\nBuild {}\nOutput protocol {}\nFolding tool: ${} or '{}'",
        info.version,
        info.target,
        info.build,
        info.protocol_version,
        info.folding_tool_env,
        info.folding_tool
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_text_names_protocol_and_tool() {
        let text = version_cli_text();
        assert!(text.starts_with(&format!("toehold-designer {TOEHOLD_DISPLAY_VERSION}")));
        assert!(text.contains(&format!("Output protocol {PROTOCOL_VERSION}")));
        assert!(text.contains("$TOEHOLD_PAIRS_BIN or 'pairs'"));
        assert_eq!(build_info().protocol_version, "v1");
    }
}
