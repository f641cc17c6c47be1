//! Configuration management
//!
//! Cost model constants, pre-flight token estimates, inference endpoint
//! settings, and execution limits.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Cost model and ceiling defaults
    #[serde(default)]
    pub cost: CostConfig,
    /// Pre-flight token estimates per lifecycle step
    #[serde(default)]
    pub estimates: EstimateConfig,
    /// Inference endpoint settings
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Execution limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Cost model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Dollars per token, applied uniformly to all calls
    #[serde(default = "default_cost_per_token")]
    pub cost_per_token: Decimal,
    /// Ceiling used when a request does not set its own
    #[serde(default = "default_max_cost")]
    pub default_max_cost: Decimal,
}

fn default_cost_per_token() -> Decimal {
    Decimal::new(3, 6) // $0.000003
}

fn default_max_cost() -> Decimal {
    Decimal::ONE
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            cost_per_token: default_cost_per_token(),
            default_max_cost: default_max_cost(),
        }
    }
}

/// Expected token counts used for pre-flight estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateConfig {
    /// Fixed-size orchestration call
    #[serde(default = "default_orchestration_tokens")]
    pub orchestration_tokens: u64,
    /// Per specialized agent in the batch
    #[serde(default = "default_per_agent_tokens")]
    pub per_agent_tokens: u64,
    /// Final synthesis call
    #[serde(default = "default_synthesis_tokens")]
    pub synthesis_tokens: u64,
}

fn default_orchestration_tokens() -> u64 {
    4000
}

fn default_per_agent_tokens() -> u64 {
    3000
}

fn default_synthesis_tokens() -> u64 {
    2000
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            orchestration_tokens: default_orchestration_tokens(),
            per_agent_tokens: default_per_agent_tokens(),
            synthesis_tokens: default_synthesis_tokens(),
        }
    }
}

/// Inference endpoint configuration (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// API key is read from the environment, never from the config file
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "meta-llama/llama-3.1-8b-instruct".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

/// Execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per inference call, treated as an agent failure on expiry
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Maximum tokens requested per agent call
    #[serde(default = "default_max_tokens_per_call")]
    pub max_tokens_per_call: u32,
    /// Suggestion list cap on the final response
    #[serde(default = "default_suggestion_cap")]
    pub suggestion_cap: usize,
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_max_tokens_per_call() -> u32 {
    4096
}

fn default_suggestion_cap() -> usize {
    10
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            max_tokens_per_call: default_max_tokens_per_call(),
            suggestion_cap: default_suggestion_cap(),
        }
    }
}

impl CouncilConfig {
    /// Load from a TOML file, applying the `AGENT_COUNCIL_API_KEY`
    /// environment override for the inference key.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: CouncilConfig =
            toml::from_str(&content).context("Failed to parse config TOML")?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("AGENT_COUNCIL_API_KEY") {
            if !key.is_empty() {
                self.inference.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("AGENT_COUNCIL_BASE_URL") {
            if !url.is_empty() {
                self.inference.base_url = url;
            }
        }
    }
}
