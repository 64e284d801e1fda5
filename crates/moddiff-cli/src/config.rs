use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use moddiff_patch::PatchConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "moddiff.toml";

/// Settings read from `moddiff.toml`. Command-line flags take precedence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Class schema used by `apply` when `--schema` is not given.
    pub schema: Option<PathBuf>,
    /// Pretty-print JSON output.
    pub pretty: bool,
    pub patch: PatchConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            schema: None,
            pretty: true,
            patch: PatchConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load `path`, or `moddiff.toml` if present, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
