//! The advisor engine: product comparison and routine generation.

use std::sync::Arc;

use skinglow_completion::CompletionProvider;
use skinglow_embeddings::EmbeddingProvider;
use tracing::{debug, info};

use crate::advisory::AdvisoryGenerator;
use crate::aggregator::ShelfAggregator;
use crate::compare::{ComparisonReport, ProductSimilaritySummary};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::ingredients::IngredientList;
use crate::routine::{RoutineComposer, RoutineOutcome};
use crate::shelf::Shelf;

/// Entry point for comparisons and routines.
///
/// Holds no per-request state; one instance can serve concurrent requests.
pub struct SkincareAdvisor {
    config: AdvisorConfig,
    aggregator: ShelfAggregator,
    advisories: AdvisoryGenerator,
    routines: RoutineComposer,
}

impl SkincareAdvisor {
    /// Create a new advisor builder.
    pub fn builder() -> SkincareAdvisorBuilder {
        SkincareAdvisorBuilder::new()
    }

    /// Create an advisor from explicit providers.
    pub fn new(
        config: AdvisorConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing advisor (embedding: {}/{}, completion: {}/{})",
            embedder.name(),
            embedder.model(),
            completer.name(),
            completer.model()
        );

        Ok(Self {
            aggregator: ShelfAggregator::new(embedder, config.policy.match_threshold),
            advisories: AdvisoryGenerator::new(Arc::clone(&completer), &config.policy),
            routines: RoutineComposer::new(completer, config.completion.routine_temperature),
            config,
        })
    }

    /// Create an advisor with the providers the configuration describes.
    pub fn from_config(config: AdvisorConfig) -> Result<Self> {
        let embedder = config.embedding.build_provider()?;
        let completer = config.completion.build_provider()?;
        Self::new(config, embedder, completer)
    }

    /// The active configuration.
    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Compare a candidate product's ingredients against every shelf product.
    ///
    /// Products without ingredients are skipped. Embedding and advisory
    /// failures are reported on the product they affect; the rest of the
    /// shelf is still compared.
    pub async fn compare_candidate_against_shelf<I, S>(
        &self,
        candidate: I,
        shelf: &Shelf,
    ) -> Result<ComparisonReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if shelf.is_empty() {
            info!("Comparison skipped: shelf is empty");
            return Ok(ComparisonReport::empty_shelf());
        }

        let candidate = IngredientList::normalize(candidate);
        if candidate.is_empty() {
            return Err(AdvisorError::EmptyCandidate);
        }

        let concurrency = self.config.policy.advisory_concurrency;
        debug!(
            "Comparing {} candidate ingredients against {} products (concurrency {concurrency})",
            candidate.len(),
            shelf.len()
        );

        let (similarities, advisories) = tokio::join!(
            self.aggregator.aggregate(&candidate, shelf, concurrency),
            self.advisories.advise_shelf(&candidate, shelf, concurrency),
        );

        let summaries: Vec<ProductSimilaritySummary> = similarities
            .into_iter()
            .zip(advisories)
            .map(|(similarity, advisory)| ProductSimilaritySummary::new(similarity, advisory))
            .collect();

        let report = ComparisonReport::ok(summaries);
        info!(
            "Compared against {} products ({} flagged)",
            report.summaries.len(),
            report.flagged().count()
        );

        Ok(report)
    }

    /// Generate a `morning` or `night` routine from the shelf.
    pub async fn generate_routine(&self, time_of_day: &str, shelf: &Shelf) -> Result<RoutineOutcome> {
        self.routines.generate_routine(time_of_day, shelf).await
    }
}

/// Builder for [`SkincareAdvisor`].
pub struct SkincareAdvisorBuilder {
    config: AdvisorConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    completer: Option<Arc<dyn CompletionProvider>>,
}

impl SkincareAdvisorBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: AdvisorConfig::default(),
            embedder: None,
            completer: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AdvisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this embedding provider instead of the configured one.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use this completion provider instead of the configured one.
    pub fn with_completer(mut self, completer: Arc<dyn CompletionProvider>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Build the advisor.
    pub fn build(self) -> Result<SkincareAdvisor> {
        let embedder = match self.embedder {
            Some(embedder) => embedder,
            None => self.config.embedding.build_provider()?,
        };
        let completer = match self.completer {
            Some(completer) => completer,
            None => self.config.completion.build_provider()?,
        };
        SkincareAdvisor::new(self.config, embedder, completer)
    }
}

impl Default for SkincareAdvisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
