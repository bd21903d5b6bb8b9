//! Configuration for the advisor.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skinglow_completion::{ChatCompletionsProvider, CompletionProvider};
use skinglow_embeddings::{
    DEFAULT_MATCH_THRESHOLD, EmbeddingProvider, HuggingFaceProvider, OpenAIProvider,
};
use tracing::debug;

use crate::error::{AdvisorError, Result};

/// Default number of words kept from an unsafe advisory.
pub const DEFAULT_ADVISORY_WORD_CAP: usize = 70;

/// Default phrase that marks a reply as an unsafe pairing.
pub const DEFAULT_UNSAFE_MARKER: &str = "not advised";

/// Default text appended to every unsafe advisory.
pub const DEFAULT_CONSULT_SUFFIX: &str =
    "We recommend you consult a doctor or dermatologist, since this combination may be harmful to your skin.";

/// Top-level advisor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Scoring and advisory policy.
    pub policy: PolicyConfig,

    /// Embedding backend.
    pub embedding: EmbeddingConfig,

    /// Generative backend.
    pub completion: CompletionConfig,
}

impl AdvisorConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading advisor config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Set the policy configuration.
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.embedding = embedding;
        self
    }

    /// Set the completion configuration.
    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        if !(0.0..=2.0).contains(&self.completion.routine_temperature) {
            return Err(AdvisorError::Config(format!(
                "completion.routine_temperature must be within [0, 2], got {}",
                self.completion.routine_temperature
            )));
        }

        Ok(())
    }
}

/// Policy constants with user-safety implications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// A pair matches when its score is strictly above this.
    pub match_threshold: f32,

    /// Words kept from an unsafe advisory before the suffix.
    pub advisory_word_cap: usize,

    /// Phrases (case-insensitive) that mark a reply as unsafe.
    pub unsafe_markers: Vec<String>,

    /// Appended to every unsafe advisory.
    pub consult_suffix: String,

    /// Shelf products processed concurrently per comparison.
    pub advisory_concurrency: usize,
}

impl PolicyConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(AdvisorError::Config(format!(
                "policy.match_threshold must be within [0, 1], got {}",
                self.match_threshold
            )));
        }
        if self.advisory_word_cap == 0 {
            return Err(AdvisorError::Config(
                "policy.advisory_word_cap must be at least 1".to_string(),
            ));
        }
        if self.advisory_concurrency == 0 {
            return Err(AdvisorError::Config(
                "policy.advisory_concurrency must be at least 1".to_string(),
            ));
        }
        if !self.unsafe_markers.iter().any(|m| !m.trim().is_empty()) {
            return Err(AdvisorError::Config(
                "policy.unsafe_markers needs at least one non-empty phrase".to_string(),
            ));
        }
        if self.consult_suffix.trim().is_empty() {
            return Err(AdvisorError::Config(
                "policy.consult_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            advisory_word_cap: DEFAULT_ADVISORY_WORD_CAP,
            unsafe_markers: vec![DEFAULT_UNSAFE_MARKER.to_string()],
            consult_suffix: DEFAULT_CONSULT_SUFFIX.to_string(),
            advisory_concurrency: 4,
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Hugging Face feature-extraction pipeline.
    HuggingFace,
    /// OpenAI embeddings API.
    #[serde(rename = "open_ai")]
    OpenAI,
}

/// Configuration for the embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderType,

    /// Model override.
    pub model: Option<String>,

    /// Base URL override.
    pub base_url: Option<String>,

    /// Environment variable holding the API key, instead of the provider's own.
    pub api_key_env: Option<String>,

    /// HTTP timeout; unset means the caller bounds latency.
    pub request_timeout_secs: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderType::HuggingFace,
            model: None,
            base_url: None,
            api_key_env: None,
            request_timeout_secs: None,
        }
    }
}

impl EmbeddingConfig {
    /// Construct the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let client = http_client(self.request_timeout_secs)?;
        let api_key = api_key_from_env(self.api_key_env.as_deref());

        let provider: Arc<dyn EmbeddingProvider> = match self.provider {
            EmbeddingProviderType::HuggingFace => {
                let mut provider = HuggingFaceProvider::new().with_client(client);
                if let Some(model) = &self.model {
                    provider = provider.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(key) = api_key {
                    provider = provider.with_api_key(key);
                }
                Arc::new(provider)
            }
            EmbeddingProviderType::OpenAI => {
                let mut provider = OpenAIProvider::new().with_client(client);
                if let Some(model) = &self.model {
                    provider = provider.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(key) = api_key {
                    provider = provider.with_api_key(key);
                }
                Arc::new(provider)
            }
        };

        Ok(provider)
    }
}

/// Configuration for the generative backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model override.
    pub model: Option<String>,

    /// Base URL override.
    pub base_url: Option<String>,

    /// Environment variable holding the API key, instead of `GROQ_API_KEY`.
    pub api_key_env: Option<String>,

    /// Sampling temperature for routine generation.
    pub routine_temperature: f64,

    /// HTTP timeout; unset means the caller bounds latency.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key_env: None,
            routine_temperature: 0.7,
            request_timeout_secs: None,
        }
    }
}

impl CompletionConfig {
    /// Construct the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn CompletionProvider>> {
        let mut provider =
            ChatCompletionsProvider::new().with_client(http_client(self.request_timeout_secs)?);
        if let Some(model) = &self.model {
            provider = provider.with_model(model);
        }
        if let Some(url) = &self.base_url {
            provider = provider.with_base_url(url);
        }
        if let Some(key) = api_key_from_env(self.api_key_env.as_deref()) {
            provider = provider.with_api_key(key);
        }
        Ok(Arc::new(provider))
    }
}

fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AdvisorError::Config(format!("failed to build HTTP client: {e}")))
}

fn api_key_from_env(var: Option<&str>) -> Option<String> {
    var.and_then(|name| std::env::var(name).ok())
}
