//! Comparison report types.

use serde::Serialize;

use crate::advisory::Advisory;
use crate::aggregator::{MatchRecord, ProductSimilarity, SimilarityStatus};

/// Message returned with an empty-shelf comparison.
pub const EMPTY_SHELF_COMPARISON_MESSAGE: &str = "No products in shelf to compare.";

/// Overall status of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonStatus {
    Ok,
    EmptyShelf,
}

/// Everything known about the candidate versus one shelf product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSimilaritySummary {
    pub product_id: String,
    pub product_name: String,
    /// Highest pairwise score.
    pub max_score: f32,
    /// Share of candidate ingredients with a match, 0 to 100.
    pub coverage_percent: f32,
    pub matches: Vec<MatchRecord>,
    pub similarity: SimilarityStatus,
    pub advisory: Advisory,
}

impl ProductSimilaritySummary {
    /// Join a product's similarity with its advisory.
    pub fn new(similarity: ProductSimilarity, advisory: Advisory) -> Self {
        Self {
            product_id: similarity.product_id,
            product_name: similarity.product_name,
            max_score: similarity.max_score,
            coverage_percent: similarity.coverage_percent,
            matches: similarity.matches,
            similarity: similarity.status,
            advisory,
        }
    }

    /// Overall similarity (max mode) formatted for display, e.g. `"87.3%"`.
    pub fn headline_percent(&self) -> String {
        format!("{:.1}%", self.max_score * 100.0)
    }
}

/// Result of comparing a candidate product against a shelf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// One entry per comparable shelf product, in shelf order.
    pub summaries: Vec<ProductSimilaritySummary>,
    pub status: ComparisonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComparisonReport {
    /// Report for a shelf with no products.
    pub fn empty_shelf() -> Self {
        Self {
            summaries: Vec::new(),
            status: ComparisonStatus::EmptyShelf,
            message: Some(EMPTY_SHELF_COMPARISON_MESSAGE.to_string()),
        }
    }

    /// Report with results.
    pub fn ok(summaries: Vec<ProductSimilaritySummary>) -> Self {
        Self {
            summaries,
            status: ComparisonStatus::Ok,
            message: None,
        }
    }

    /// Summaries whose advisory flagged the pairing as unsafe.
    pub fn flagged(&self) -> impl Iterator<Item = &ProductSimilaritySummary> {
        self.summaries
            .iter()
            .filter(|s| matches!(s.advisory, Advisory::Unsafe { .. }))
    }
}
