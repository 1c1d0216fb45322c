//! Pipeline configuration
//!
//! All tunables in one place with production defaults; loadable from TOML so
//! deployments can override models, deadlines, and score bounds without a
//! rebuild.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Top-level configuration for one analyzer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum trimmed text length before the pipeline even starts
    pub min_text_len: usize,
    /// Finding-count floor below which the coverage top-up pass fires
    pub coverage_floor: usize,
    pub llm: LlmConfig,
    pub score: ScoreConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_text_len: 100,
            coverage_floor: 10,
            llm: LlmConfig::default(),
            score: ScoreConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML document; missing keys keep defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AnalysisError::Config(e.to_string()))
    }
}

/// External text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Primary model id
    pub primary_model: String,
    /// Cheaper/smaller fallback model id
    pub secondary_model: String,
    /// Deadline for primary-model calls, in milliseconds
    pub primary_timeout_ms: u64,
    /// Deadline for secondary-model and top-up calls, in milliseconds
    pub secondary_timeout_ms: u64,
    /// Transport retry budget per tier
    pub max_attempts: u32,
    /// Exponential backoff base, in milliseconds
    pub backoff_base_ms: u64,
    /// Token budget for the full analysis response
    pub max_tokens: u32,
    /// Sampling temperature; deterministic analysis uses 0.0
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary_model: "gpt-4.1".to_string(),
            secondary_model: "gpt-4.1-mini".to_string(),
            primary_timeout_ms: 300_000,
            secondary_timeout_ms: 120_000,
            max_attempts: 3,
            backoff_base_ms: 500,
            max_tokens: 8_192,
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_timeout_ms)
    }

    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_millis(self.secondary_timeout_ms)
    }
}

/// Health-score bounds and shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Score for a contract with zero surviving findings
    pub ceiling: u8,
    /// Hard floor before integrity capping
    pub floor: u8,
    /// Weighted-issue count up to which only the small linear penalty applies
    pub minor_issue_threshold: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            ceiling: 98,
            floor: 30,
            minor_issue_threshold: 3.0,
        }
    }
}
