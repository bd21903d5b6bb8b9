//! # Embeddings
//!
//! This crate turns ingredient names into dense vectors and scores how
//! semantically close two ingredient lists are.
//!
//! ## Features
//!
//! - **Batched Embedding**: One backend call per ingredient set
//! - **Multiple Providers**: Hugging Face feature extraction and OpenAI
//! - **Cosine Scoring**: Clamped, symmetric, never fails
//! - **Score Matrix**: Max and coverage aggregates from a single matrix
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► ScoreMatrix                │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  HuggingFace/OpenAI              max_score / coverage_percent   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, HuggingFaceProvider, OpenAIProvider};
pub use similarity::{DEFAULT_MATCH_THRESHOLD, PairScore, ScoreMatrix, cosine_similarity, is_match};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of `sentence-transformers/all-MiniLM-L6-v2` embeddings.
pub const DEFAULT_DIMENSION: usize = 384;
