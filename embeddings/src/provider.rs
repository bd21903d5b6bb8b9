//! Embedding providers.
//!
//! Supports the Hugging Face feature-extraction pipeline and the OpenAI
//! embeddings API. Both send every text of a request in a single call.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the model this provider embeds with.
    fn model(&self) -> &str;

    /// Embed every text in one backend call, preserving input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a batch and verify one vector came back per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embed(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

/// Map rate limiting and non-2xx statuses to errors.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        return Err(EmbeddingError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::ApiRequest {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// Hugging Face inference feature-extraction provider.
pub struct HuggingFaceProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model repository id.
    model: String,
}

impl HuggingFaceProvider {
    /// Default hosted inference endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://router.huggingface.co/hf-inference";

    /// Default sentence-transformers model.
    pub const DEFAULT_MODEL: &'static str = "sentence-transformers/all-MiniLM-L6-v2";

    /// Create a new provider, reading the key from `HF_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("HF_API_KEY").ok(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for HuggingFaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "hugging_face"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        debug!(
            "Requesting {} feature-extraction embeddings with model: {}",
            texts.len(),
            self.model
        );

        let response = self
            .client
            .post(format!(
                "{}/models/{}/pipeline/feature-extraction",
                self.base_url.trim_end_matches('/'),
                self.model
            ))
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "inputs": texts }))
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let output: FeatureExtractionOutput = serde_json::from_str(&body)?;
        let embeddings = output.into_sentence_embeddings();

        info!("Generated {} feature-extraction embeddings", embeddings.len());
        Ok(embeddings)
    }
}

/// Feature-extraction output: pooled sentence vectors, or per-token vectors
/// for models without a pooling head.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionOutput {
    Pooled(Vec<Embedding>),
    TokenLevel(Vec<Vec<Embedding>>),
}

impl FeatureExtractionOutput {
    fn into_sentence_embeddings(self) -> Vec<Embedding> {
        match self {
            Self::Pooled(embeddings) => embeddings,
            Self::TokenLevel(sentences) => {
                sentences.iter().map(Vec::as_slice).map(mean_pool).collect()
            }
        }
    }
}

/// Average token vectors into one sentence vector.
fn mean_pool(tokens: &[Embedding]) -> Embedding {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let n = tokens.len() as f32;
    let mut pooled = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, val) in pooled.iter_mut().zip(token) {
            *acc += val / n;
        }
    }
    pooled
}

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model.
    model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider, reading the key from `OPENAI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "text-embedding-3-small".to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "open_ai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        debug!(
            "Generating batch embeddings for {} texts with model: {}",
            texts.len(),
            self.model
        );

        let body = serde_json::json!({
            "input": texts,
            "model": self.model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let mut result: OpenAIEmbeddingResponse = check_status(response).await?.json().await?;
        result.data.sort_by_key(|item| item.index);

        let embeddings: Vec<Embedding> = result.data.into_iter().map(|d| d.embedding).collect();

        info!("Generated {} batch embeddings", embeddings.len());
        Ok(embeddings)
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
