// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::AtelierError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub cost: CostConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// AI provider endpoints, tried in order. Empty = deterministic only.
    #[serde(default)]
    pub providers: Vec<ProviderEndpoint>,

    /// Per-provider call timeout.
    pub provider_timeout_secs: u64,

    /// Total deadline for one generate() call. When exceeded, remaining
    /// providers are abandoned and the deterministic path runs immediately.
    pub total_deadline_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            provider_timeout_secs: 20,
            total_deadline_secs: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub name: String,
    pub base_url: String,
    /// Environment variable holding the API key, if the endpoint needs one.
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Construction rate per square meter per story.
    pub rate_per_sqm: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self { rate_per_sqm: 850.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Emit a retraining trigger every N evaluations per spec.
    pub retrain_every: u32,

    /// Ratings strictly below this emit an immediate trigger.
    pub negative_threshold: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            retrain_every: 5,
            negative_threshold: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Consecutive live failures before a breaker opens.
    pub failure_threshold: u32,

    /// How long an open breaker serves mocks before probing.
    pub cooldown_secs: u64,

    /// Timeout for every live service call. Exceeding it counts as a failure.
    pub call_timeout_secs: u64,

    pub compliance_url: Option<String>,
    pub optimizer_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 30,
            call_timeout_secs: 5,
            compliance_url: None,
            optimizer_url: None,
        }
    }
}

impl Config {
    /// Load config from an explicit path. Errors if the file is missing
    /// or malformed.
    pub fn load_from(path: &Path) -> Result<Self, AtelierError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AtelierError::Config(e.to_string()))
    }

    /// Load `atelier.toml` from the working directory, falling back to
    /// defaults when absent.
    pub fn load() -> Result<Self, AtelierError> {
        let path = Path::new("atelier.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }
}
