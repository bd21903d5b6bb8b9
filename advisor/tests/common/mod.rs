//! Deterministic in-process fakes for the embedding and completion backends.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use skinglow_advisor::{AdvisorConfig, IngredientList, ShelfProduct, SkincareAdvisor};
use skinglow_completion::{CompletionError, CompletionProvider, CompletionRequest};
use skinglow_embeddings::{Embedding, EmbeddingError, EmbeddingProvider};

const DIMENSION: usize = 64;

/// Gives every distinct text its own axis, so equal texts score 1 and
/// different texts score 0 unless overridden.
#[derive(Default)]
pub struct RegistryEmbedder {
    axes: Mutex<HashMap<String, usize>>,
    overrides: HashMap<String, Embedding>,
    fail_when_contains: Option<String>,
    calls: AtomicUsize,
}

impl RegistryEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Embedding) -> Self {
        self.overrides.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_when_contains = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Embedding {
        if let Some(vector) = self.overrides.get(text) {
            return vector.clone();
        }

        let mut axes = self.axes.lock().unwrap();
        let next = axes.len();
        let axis = *axes.entry(text.to_string()).or_insert(next);

        let mut vector = vec![0.0; DIMENSION];
        vector[axis % DIMENSION] = 1.0;
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for RegistryEmbedder {
    fn name(&self) -> &str {
        "registry"
    }

    fn model(&self) -> &str {
        "one-hot"
    }

    async fn embed(&self, texts: &[String]) -> skinglow_embeddings::Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .fail_when_contains
            .as_deref()
            .is_some_and(|needle| texts.iter().any(|t| t.contains(needle)));
        if failing {
            return Err(EmbeddingError::ApiRequest {
                status: 503,
                body: "model loading".to_string(),
            });
        }

        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Replies by matching needles against the prompt; first rule wins.
pub struct ScriptedCompleter {
    rules: Vec<(String, String)>,
    delays: Vec<(String, Duration)>,
    default_reply: String,
    fail_when_contains: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn replying(default_reply: &str) -> Self {
        Self {
            rules: Vec::new(),
            delays: Vec::new(),
            default_reply: default_reply.to_string(),
            fail_when_contains: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub fn delay_when(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_when_contains = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompleter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> skinglow_completion::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some((_, delay)) = self
            .delays
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
        {
            tokio::time::sleep(*delay).await;
        }

        let failing = self
            .fail_when_contains
            .as_deref()
            .is_some_and(|needle| request.prompt.contains(needle));
        if failing {
            return Err(CompletionError::ApiRequest {
                status: 500,
                body: "upstream error".to_string(),
            });
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map_or(&self.default_reply, |(_, reply)| reply);

        Ok(reply.clone())
    }
}

pub fn product(id: &str, name: &str, ingredients: &[&str]) -> ShelfProduct {
    ShelfProduct::new(id, name, IngredientList::normalize(ingredients))
}

pub fn advisor(
    embedder: Arc<RegistryEmbedder>,
    completer: Arc<ScriptedCompleter>,
) -> SkincareAdvisor {
    SkincareAdvisor::builder()
        .with_config(AdvisorConfig::default())
        .with_embedder(embedder)
        .with_completer(completer)
        .build()
        .unwrap()
}
