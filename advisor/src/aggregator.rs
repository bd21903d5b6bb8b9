//! Per-product similarity aggregation.
//!
//! For every comparable shelf product the aggregator embeds the candidate and
//! product ingredients in one batch, builds a [`ScoreMatrix`] and reports both
//! aggregates: the highest pairwise score and the share of candidate
//! ingredients with at least one match.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use skinglow_embeddings::{EmbeddingError, EmbeddingProvider, ScoreMatrix};
use tracing::{debug, warn};

use crate::error::Result;
use crate::ingredients::IngredientList;
use crate::shelf::{Shelf, ShelfProduct};

/// Whether a product's scores come from real embeddings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SimilarityStatus {
    Available,
    /// Embedding failed; scores are zero and must not be read as "no overlap".
    Unavailable { reason: String },
}

/// One candidate/shelf ingredient pair above the match threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub candidate_ingredient: String,
    pub shelf_ingredient: String,
    pub score: f32,
    pub shelf_product_id: String,
}

/// Similarity of the candidate against one shelf product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSimilarity {
    pub product_id: String,
    pub product_name: String,
    pub max_score: f32,
    pub coverage_percent: f32,
    pub matches: Vec<MatchRecord>,
    pub status: SimilarityStatus,
}

/// Scores a candidate ingredient list against shelf products.
pub struct ShelfAggregator {
    embedder: Arc<dyn EmbeddingProvider>,
    match_threshold: f32,
}

impl ShelfAggregator {
    /// Create an aggregator.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, match_threshold: f32) -> Self {
        Self {
            embedder,
            match_threshold,
        }
    }

    /// The threshold a pair score must exceed to match.
    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
    }

    /// Score every comparable product, in shelf order.
    ///
    /// At most `concurrency` products are embedded at a time. An embedding
    /// failure only affects the product it belongs to.
    pub async fn aggregate(
        &self,
        candidate: &IngredientList,
        shelf: &Shelf,
        concurrency: usize,
    ) -> Vec<ProductSimilarity> {
        stream::iter(shelf.comparable())
            .map(|product| self.score_product(candidate, product))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Score one product.
    pub async fn score_product(
        &self,
        candidate: &IngredientList,
        product: &ShelfProduct,
    ) -> ProductSimilarity {
        let (matrix, status) = match self.score_matrix(candidate, &product.ingredients).await {
            Ok(matrix) => (matrix, SimilarityStatus::Available),
            Err(err) => {
                warn!("Similarity unavailable for product {}: {err}", product.id);
                (
                    ScoreMatrix::zeros(candidate.len(), product.ingredients.len()),
                    SimilarityStatus::Unavailable {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let matches = matrix
            .matches(self.match_threshold)
            .into_iter()
            .filter_map(|pair| {
                Some(MatchRecord {
                    candidate_ingredient: candidate.as_slice().get(pair.row)?.clone(),
                    shelf_ingredient: product.ingredients.as_slice().get(pair.col)?.clone(),
                    score: pair.score,
                    shelf_product_id: product.id.clone(),
                })
            })
            .collect::<Vec<_>>();

        let similarity = ProductSimilarity {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            max_score: matrix.max_score(),
            coverage_percent: matrix.coverage_percent(self.match_threshold),
            matches,
            status,
        };

        debug!(
            "Product {}: max {:.3}, coverage {:.1}%, {} matches",
            similarity.product_id,
            similarity.max_score,
            similarity.coverage_percent,
            similarity.matches.len()
        );

        similarity
    }

    /// One batched embed call over candidate then product ingredients.
    async fn score_matrix(
        &self,
        candidate: &IngredientList,
        ingredients: &IngredientList,
    ) -> Result<ScoreMatrix> {
        let texts: Vec<String> = candidate.iter().chain(ingredients).cloned().collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let (candidate_vectors, shelf_vectors) = embeddings
            .split_at_checked(candidate.len())
            .ok_or(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            })?;
        Ok(ScoreMatrix::from_embeddings(candidate_vectors, shelf_vectors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use skinglow_embeddings::Embedding;

    /// Maps each known ingredient to a fixed axis.
    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        fn name(&self) -> &str {
            "axis"
        }

        fn model(&self) -> &str {
            "axis"
        }

        async fn embed(&self, texts: &[String]) -> skinglow_embeddings::Result<Vec<Embedding>> {
            texts
                .iter()
                .map(|t| match t.as_str() {
                    "niacinamide" => Ok(vec![1.0, 0.0, 0.0]),
                    "aqua" => Ok(vec![0.0, 1.0, 0.0]),
                    "zinc pca" => Ok(vec![0.8, 0.6, 0.0]),
                    "broken" => Err(EmbeddingError::InvalidResponse("broken".to_string())),
                    _ => Ok(vec![0.0, 0.0, 1.0]),
                })
                .collect()
        }
    }

    fn aggregator() -> ShelfAggregator {
        ShelfAggregator::new(Arc::new(AxisEmbedder), 0.6)
    }

    #[tokio::test]
    async fn test_identical_ingredient_is_full_match() {
        let candidate = IngredientList::normalize(["Niacinamide"]);
        let product = ShelfProduct::new("p1", "Serum", IngredientList::normalize(["Niacinamide"]));

        let similarity = aggregator().score_product(&candidate, &product).await;
        assert_eq!(similarity.max_score, 1.0);
        assert_eq!(similarity.coverage_percent, 100.0);
        assert_eq!(
            similarity.matches,
            vec![MatchRecord {
                candidate_ingredient: "niacinamide".to_string(),
                shelf_ingredient: "niacinamide".to_string(),
                score: 1.0,
                shelf_product_id: "p1".to_string(),
            }]
        );
        assert_eq!(similarity.status, SimilarityStatus::Available);
    }

    #[tokio::test]
    async fn test_partial_coverage() {
        let candidate = IngredientList::normalize(["Niacinamide", "Retinol"]);
        let product = ShelfProduct::new("p1", "Toner", IngredientList::normalize(["Zinc PCA"]));

        let similarity = aggregator().score_product(&candidate, &product).await;
        assert_eq!(similarity.coverage_percent, 50.0);
        assert_eq!(similarity.matches.len(), 1);
        assert_eq!(similarity.matches[0].shelf_ingredient, "zinc pca");
    }

    #[tokio::test]
    async fn test_embedding_failure_yields_zeroed_unavailable() {
        let candidate = IngredientList::normalize(["Niacinamide"]);
        let product = ShelfProduct::new("p1", "Odd", IngredientList::normalize(["Broken"]));

        let similarity = aggregator().score_product(&candidate, &product).await;
        assert_eq!(similarity.max_score, 0.0);
        assert_eq!(similarity.coverage_percent, 0.0);
        assert!(similarity.matches.is_empty());
        assert!(matches!(
            similarity.status,
            SimilarityStatus::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_aggregate_skips_empty_products_and_keeps_order() {
        let shelf = Shelf::default()
            .with_product(ShelfProduct::new("a", "A", IngredientList::normalize(["Aqua"])))
            .with_product(ShelfProduct::new("b", "B", IngredientList::default()))
            .with_product(ShelfProduct::new("c", "C", IngredientList::normalize(["Niacinamide"])));
        let candidate = IngredientList::normalize(["Niacinamide"]);

        let results = aggregator().aggregate(&candidate, &shelf, 2).await;
        let ids: Vec<&str> = results.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(results[1].max_score, 1.0);
    }
}
