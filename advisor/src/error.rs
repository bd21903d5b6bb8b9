//! Error types for the advisor.

use skinglow_completion::CompletionError;
use skinglow_embeddings::EmbeddingError;
use thiserror::Error;

/// Result type alias for advisor operations.
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Errors that can occur while comparing products or composing routines.
///
/// `EmbeddingUnavailable` and `AdvisoryUnavailable` are scoped to a single
/// shelf product and are folded into that product's summary by the
/// comparison; the rest fail the whole request.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Embedding backend unreachable or returned malformed output.
    #[error("embedding backend unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    /// Generative backend unreachable for a product's safety advisory.
    #[error("could not verify compatibility: {0}")]
    AdvisoryUnavailable(#[source] CompletionError),

    /// Generative backend unreachable for routine generation.
    #[error("routine generation failed: {0}")]
    RoutineGenerationFailed(#[source] CompletionError),

    /// Time of day other than `morning` or `night`.
    #[error("invalid time of day {0:?}: expected \"morning\" or \"night\"")]
    InvalidTimeOfDay(String),

    /// No usable candidate ingredients after normalization.
    #[error("candidate ingredient list is empty")]
    EmptyCandidate,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed configuration file.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
