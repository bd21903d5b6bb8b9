//! Skincare routine composition from the products a user owns.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use skinglow_completion::{CompletionProvider, CompletionRequest};
use tracing::{debug, info, warn};

use crate::error::{AdvisorError, Result};
use crate::extraction::{ExtractedRoutine, RoutinePayload, SuggestedStep, extract_routine};
use crate::shelf::Shelf;

/// Message returned instead of a routine when the shelf is empty.
pub const EMPTY_SHELF_MESSAGE: &str =
    "No products found in shelf. Add products to generate routines.";

/// Time of day a routine is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Night,
}

impl TimeOfDay {
    /// The wire value, `morning` or `night`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Night => "night",
        }
    }

    fn ordering_rule(self) -> &'static str {
        match self {
            Self::Morning => {
                "Morning routine order: cleanser, toner, serum, moisturizer, sunscreen"
            }
            Self::Night => "Night routine order: cleanser, toner, actives, moisturizer",
        }
    }

    fn emphasis_rule(self) -> &'static str {
        match self {
            Self::Morning => "Emphasize daily SPF use",
            Self::Night => "Recommend night-time actives (retinol, AHA/BHA) where available",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = AdvisorError;

    /// Only the exact values `morning` and `night` are accepted.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "morning" => Ok(Self::Morning),
            "night" => Ok(Self::Night),
            other => Err(AdvisorError::InvalidTimeOfDay(other.to_string())),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routine step with its product resolved against the shelf when possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStep {
    pub order: u32,
    pub title: Option<String>,
    /// Shelf name when resolved, otherwise the model's suggestion.
    pub product: Option<String>,
    pub resolved_product_id: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub wait_time: Option<String>,
    pub tips: Option<String>,
}

/// A structured routine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub time_of_day: TimeOfDay,
    pub steps: Vec<RoutineStep>,
    pub total_time: Option<String>,
    pub benefits: Option<String>,
    pub warnings: Option<String>,
}

/// Outcome of a routine request. Callers must handle every variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "status",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum RoutineOutcome {
    /// The reply contained a parseable routine.
    Structured(Routine),
    /// The reply could not be parsed; shown to the user as-is.
    Raw { raw_text: String },
    /// The shelf has no products.
    EmptyShelf { message: String },
}

/// Builds routines with the generative backend.
pub struct RoutineComposer {
    completer: Arc<dyn CompletionProvider>,
    temperature: f64,
}

impl RoutineComposer {
    /// Create a composer sampling at `temperature`.
    pub fn new(completer: Arc<dyn CompletionProvider>, temperature: f64) -> Self {
        Self {
            completer,
            temperature,
        }
    }

    /// Generate a routine for `time_of_day` from the shelf.
    ///
    /// The time of day is validated before any backend call. An empty shelf
    /// is an outcome, not an error.
    pub async fn generate_routine(&self, time_of_day: &str, shelf: &Shelf) -> Result<RoutineOutcome> {
        let time_of_day: TimeOfDay = time_of_day.parse()?;

        if shelf.is_empty() {
            info!("Skipping {time_of_day} routine: shelf is empty");
            return Ok(RoutineOutcome::EmptyShelf {
                message: EMPTY_SHELF_MESSAGE.to_string(),
            });
        }

        let prompt = build_routine_prompt(time_of_day, shelf);
        let request = CompletionRequest::new(prompt).with_temperature(self.temperature);
        let reply = self
            .completer
            .complete(request)
            .await
            .map_err(AdvisorError::RoutineGenerationFailed)?;

        match extract_routine(&reply) {
            ExtractedRoutine::Structured(payload) => {
                let routine = resolve_routine(time_of_day, payload, shelf);
                info!(
                    "Generated {time_of_day} routine with {} steps",
                    routine.steps.len()
                );
                Ok(RoutineOutcome::Structured(routine))
            }
            ExtractedRoutine::Raw(raw_text) => {
                warn!("Could not parse {time_of_day} routine; returning raw reply");
                Ok(RoutineOutcome::Raw { raw_text })
            }
        }
    }
}

/// Build the routine prompt listing every shelf product.
pub fn build_routine_prompt(time_of_day: TimeOfDay, shelf: &Shelf) -> String {
    let products = shelf
        .iter()
        .map(|p| {
            format!(
                "- {} ({}) - Type: {}\n  Ingredients: {}",
                p.name,
                p.brand.as_deref().unwrap_or("unknown brand"),
                p.product_type.as_deref().unwrap_or("unspecified"),
                p.ingredients.joined()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Task: Build a {time_of_day} skincare routine using only the products the user owns.

Products:
{products}

Return your answer as JSON in this format:
{{
  "routine": [
    {{
      "step": 1,
      "title": "Step title",
      "product": "Recommended product name",
      "description": "What this step does",
      "waitTime": "Wait time (optional)",
      "tips": "Usage tips"
    }}
  ],
  "totalTime": "Total time",
  "benefits": "Benefits of this routine",
  "warnings": "Things to watch out for"
}}

Rules:
- {ordering}
- Only use the products listed above
- Place each product in a suitable order
- Give detailed descriptions
- {emphasis}
- Keep recommendations suitable for the user's skin
"#,
        ordering = time_of_day.ordering_rule(),
        emphasis = time_of_day.emphasis_rule(),
    )
}

fn resolve_routine(time_of_day: TimeOfDay, payload: RoutinePayload, shelf: &Shelf) -> Routine {
    let steps = payload
        .routine
        .into_iter()
        .enumerate()
        .map(|(index, step)| resolve_step(index, step, shelf))
        .collect();

    Routine {
        time_of_day,
        steps,
        total_time: payload.total_time,
        benefits: payload.benefits,
        warnings: payload.warnings,
    }
}

fn resolve_step(index: usize, step: SuggestedStep, shelf: &Shelf) -> RoutineStep {
    let order = step
        .step
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX));

    let resolved = step
        .product
        .as_deref()
        .and_then(|name| shelf.resolve_product(name));

    let (product, resolved_product_id, brand) = match resolved {
        Some(shelf_product) => {
            debug!(
                "Resolved step {order} product {:?} to {}",
                step.product, shelf_product.id
            );
            (
                Some(shelf_product.name.clone()),
                Some(shelf_product.id.clone()),
                shelf_product.brand.clone(),
            )
        }
        None => (step.product, None, None),
    };

    RoutineStep {
        order,
        title: step.title,
        product,
        resolved_product_id,
        brand,
        description: step.description,
        wait_time: step.wait_time,
        tips: step.tips,
    }
}
