use crate::ledger::UndoLedger;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Oldest entries are evicted past this many. Absent means unbounded.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl LedgerConfig {
    #[must_use]
    pub const fn build(&self) -> UndoLedger {
        UndoLedger::with_capacity_limit(self.max_entries)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".brandops/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("brandops/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Canonical output mode name for a user-supplied value.
///
/// Accepts `pretty`, `text`, `json` and the aliases `human` (pretty) and
/// `table` (text), case-insensitively.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Pick the output mode. First match wins: explicit format, `--json`,
/// `FORMAT` env, user config, then pretty on a terminal and text otherwise.
/// Unrecognised values at any level are skipped.
#[must_use]
pub fn resolve_output(
    cli_format: Option<&str>,
    cli_json: bool,
    env_format: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> &'static str {
    if let Some(mode) = cli_format.and_then(normalize_output_mode) {
        return mode;
    }
    if cli_json {
        return "json";
    }
    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode;
    }
    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode;
    }
    if is_tty { "pretty" } else { "text" }
}

const fn default_true() -> bool {
    true
}
