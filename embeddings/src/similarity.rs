//! Similarity scoring for ingredient embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::Embedding;

/// Default score a pair must exceed to count as a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Compute the cosine similarity between two embeddings, clamped to `[0, 1]`.
///
/// Never fails: vectors of different length, or with zero magnitude, are
/// incomparable and score 0. The result is symmetric in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    let score = dot_product / (magnitude_a * magnitude_b);
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Whether a score counts as a match under the given threshold.
pub fn is_match(score: f32, threshold: f32) -> bool {
    score > threshold
}

/// A single cell of a [`ScoreMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    /// Index into the candidate (row) side.
    pub row: usize,

    /// Index into the shelf (column) side.
    pub col: usize,

    /// Cosine similarity of the pair.
    pub score: f32,
}

/// Pairwise scores between a candidate list (rows) and a shelf list (columns).
///
/// Both aggregate modes read the same cells, so the headline number and the
/// match list always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    scores: Vec<f32>,
}

impl ScoreMatrix {
    /// Score every candidate embedding against every shelf embedding.
    pub fn from_embeddings(candidates: &[Embedding], shelf: &[Embedding]) -> Self {
        let scores = candidates
            .iter()
            .flat_map(|c| shelf.iter().map(move |s| cosine_similarity(c, s)))
            .collect();

        Self {
            rows: candidates.len(),
            cols: shelf.len(),
            scores,
        }
    }

    /// A matrix with no similarity signal.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            scores: vec![0.0; rows * cols],
        }
    }

    /// Number of candidate rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of shelf columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Score at `(row, col)`, if in range.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.scores.get(row * self.cols + col).copied()
    }

    /// Max mode: the highest pairwise score, 0 for an empty matrix.
    pub fn max_score(&self) -> f32 {
        self.scores
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map_or(0.0, |s| s.0)
    }

    /// Coverage mode: percentage of candidate rows with at least one match.
    pub fn coverage_percent(&self, threshold: f32) -> f32 {
        if self.rows == 0 || self.cols == 0 {
            return 0.0;
        }

        let covered = self
            .scores
            .chunks(self.cols)
            .filter(|row| row.iter().any(|&s| is_match(s, threshold)))
            .count();

        covered as f32 / self.rows as f32 * 100.0
    }

    /// Every pair scoring above the threshold, in row-major order.
    pub fn matches(&self, threshold: f32) -> Vec<PairScore> {
        if self.cols == 0 {
            return Vec::new();
        }

        self.scores
            .iter()
            .enumerate()
            .filter(|(_, s)| is_match(**s, threshold))
            .map(|(i, &score)| PairScore {
                row: i / self.cols,
                col: i % self.cols,
                score,
            })
            .collect()
    }
}
