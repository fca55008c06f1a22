//! Analysis settings.
//!
//! Settings can come from a YAML or JSON file (chosen by extension) and are then
//! overridden by frontend flags. Missing or zero values fall back to defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::formats::ExportStrategy;
use crate::analysis::strings::{StringExtractor, DEFAULT_STRINGS_TOOL};
use crate::analysis::{Inspector, MAX_FILE_SIZE};

pub const DEFAULT_MODEL: &str = "deepseek:8b";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 120;
/// Bytes of file content embedded in each prompt.
pub const DEFAULT_SAMPLE_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Registry name of the insight capability.
    pub model: String,
    /// Base URL of the Ollama-style API.
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Upper bound on each task's capability call.
    pub task_timeout_secs: u64,
    /// Optional HTTP client timeout, independent of the task timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub max_file_size: u64,
    pub sample_len: usize,
    /// Try the external strings tool before the builtin scanner.
    pub use_external_strings: bool,
    pub strings_tool: String,
    pub export_strategy: ExportStrategy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            request_timeout_secs: None,
            max_file_size: MAX_FILE_SIZE,
            sample_len: DEFAULT_SAMPLE_LEN,
            use_external_strings: true,
            strings_tool: DEFAULT_STRINGS_TOOL.to_string(),
            export_strategy: ExportStrategy::default(),
        }
    }
}

impl AnalysisSettings {
    /// Replace empty or zero values with defaults.
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.model.trim().is_empty() {
            self.model = defaults.model;
        }
        if self.endpoint.trim().is_empty() {
            self.endpoint = defaults.endpoint;
        }
        if self.max_tokens == 0 {
            self.max_tokens = defaults.max_tokens;
        }
        if self.temperature == 0.0 {
            self.temperature = defaults.temperature;
        }
        if self.task_timeout_secs == 0 {
            self.task_timeout_secs = defaults.task_timeout_secs;
        }
        if self.max_file_size == 0 {
            self.max_file_size = defaults.max_file_size;
        }
        if self.sample_len == 0 {
            self.sample_len = defaults.sample_len;
        }
        if self.strings_tool.trim().is_empty() {
            self.strings_tool = defaults.strings_tool;
        }
        self
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Inspector configured from these settings.
    pub fn inspector(&self) -> Inspector {
        let strings = if self.use_external_strings {
            StringExtractor::with_tool(&self.strings_tool)
        } else {
            StringExtractor::builtin()
        };
        Inspector::new()
            .with_max_file_size(self.max_file_size)
            .with_strings(strings)
            .with_export_strategy(self.export_strategy)
    }
}

/// Load settings from YAML (`.yaml`/`.yml`) or JSON (anything else).
pub fn load_settings(path: &Path) -> Result<AnalysisSettings> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings at {}", path.display()))?;
    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
    let settings: AnalysisSettings = if is_yaml {
        serde_yaml::from_str(&body).context("Failed to parse settings YAML")?
    } else {
        serde_json::from_str(&body).context("Failed to parse settings JSON")?
    };
    Ok(settings.with_defaults())
}
