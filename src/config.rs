//! Runtime settings for the analyzer.
//!
//! Plain serde structure: loadable from a JSON file, overridable through
//! environment variables, with defaults matching the demo layout.

use crate::error::Result;
use crate::indicators::{CURRENT_RATIO, NET_PROFIT_MARGIN, ROE};
use crate::schema::MissingValuePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub input_dir: String,
    pub output_dir: String,
    pub db_path: String,
    pub missing_value_policy: MissingValuePolicy,
    pub indicator_weights: BTreeMap<String, f64>,
    pub log_level: String,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            input_dir: "data/input".to_string(),
            output_dir: "data/output".to_string(),
            db_path: "data/finance.db".to_string(),
            missing_value_policy: MissingValuePolicy::Warn,
            indicator_weights: BTreeMap::from([
                (NET_PROFIT_MARGIN.to_string(), 0.4),
                (CURRENT_RATIO.to_string(), 0.3),
                (ROE.to_string(), 0.3),
            ]),
            log_level: "info".to_string(),
        }
    }
}

impl AnalyzerSettings {
    /// Load settings from a JSON file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut settings: AnalyzerSettings = serde_json::from_str(&contents)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Defaults plus environment overrides, for when no settings file exists.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("ANALYZER_INPUT_DIR") {
            self.input_dir = value;
        }
        if let Ok(value) = std::env::var("ANALYZER_OUTPUT_DIR") {
            self.output_dir = value;
        }
        if let Ok(value) = std::env::var("ANALYZER_DB_PATH") {
            self.db_path = value;
        }
        if let Ok(value) = std::env::var("ANALYZER_MISSING_VALUE_POLICY") {
            if let Ok(policy) = value.parse() {
                self.missing_value_policy = policy;
            }
        }
        if let Ok(value) = std::env::var("ANALYZER_LOG_LEVEL") {
            self.log_level = value;
        }
    }
}
