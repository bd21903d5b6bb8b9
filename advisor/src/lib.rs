//! # Advisor
//!
//! Ingredient compatibility and routine advice for a user's product shelf.
//!
//! ## Features
//!
//! - **Shelf Comparison**: Max and coverage similarity per shelf product
//! - **Safety Advisories**: Bounded co-use verdicts from a generative model
//! - **Routine Composition**: Morning and night routines from owned products
//! - **Contained Failures**: A failing backend call only affects its product
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SkincareAdvisor                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  compare_candidate_against_shelf      generate_routine          │
//! │     │                 │                      │                  │
//! │     ▼                 ▼                      ▼                  │
//! │  ShelfAggregator  AdvisoryGenerator    RoutineComposer          │
//! │     │                 │                      │                  │
//! │     ▼                 └──────────┬───────────┘                  │
//! │  EmbeddingProvider        CompletionProvider                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use skinglow_advisor::{AdvisorConfig, Shelf, SkincareAdvisor};
//!
//! let advisor = SkincareAdvisor::from_config(AdvisorConfig::default())?;
//! let report = advisor
//!     .compare_candidate_against_shelf(["Niacinamide", "Zinc PCA"], &shelf)
//!     .await?;
//! ```

pub mod advisory;
pub mod aggregator;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod ingredients;
pub mod routine;
pub mod shelf;

pub use advisory::{Advisory, AdvisoryGenerator};
pub use aggregator::{MatchRecord, ProductSimilarity, ShelfAggregator, SimilarityStatus};
pub use compare::{ComparisonReport, ComparisonStatus, ProductSimilaritySummary};
pub use config::{
    AdvisorConfig, CompletionConfig, EmbeddingConfig, EmbeddingProviderType, PolicyConfig,
};
pub use engine::{SkincareAdvisor, SkincareAdvisorBuilder};
pub use error::{AdvisorError, Result};
pub use extraction::{ExtractedRoutine, extract_routine};
pub use ingredients::IngredientList;
pub use routine::{Routine, RoutineComposer, RoutineOutcome, RoutineStep, TimeOfDay};
pub use shelf::{Shelf, ShelfProduct};
