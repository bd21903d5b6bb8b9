//! Natural-language co-use safety advisories.
//!
//! The `AdvisoryGenerator` asks the generative backend whether two products
//! can be used together and post-processes the free-text reply into a bounded
//! [`Advisory`]. The post-processing rules are part of the contract: an
//! unsafe reply is always capped and suffixed, and a failed call is never
//! reported as safe.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use skinglow_completion::{CompletionProvider, CompletionRequest};
use tracing::{debug, warn};

use crate::config::PolicyConfig;
use crate::error::{AdvisorError, Result};
use crate::ingredients::IngredientList;
use crate::shelf::Shelf;

/// Verdict on using a candidate product together with a shelf product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Advisory {
    /// The model judged the pairing safe; its reply is kept verbatim.
    Safe { text: String },

    /// The model flagged the pairing; the explanation is capped and suffixed.
    Unsafe { text: String, truncated: bool },

    /// No verdict could be obtained. Never to be read as safe.
    Unverified { reason: String },
}

impl Advisory {
    /// Advisory for a failed call.
    pub fn unverified(err: &AdvisorError) -> Self {
        Self::Unverified {
            reason: err.to_string(),
        }
    }

    /// User-facing text, if a verdict was obtained.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Safe { text } | Self::Unsafe { text, .. } => Some(text.as_str()),
            Self::Unverified { .. } => None,
        }
    }

    /// Whether the model produced a verdict.
    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::Unverified { .. })
    }
}

/// Generates one advisory per product pairing.
pub struct AdvisoryGenerator {
    completer: Arc<dyn CompletionProvider>,
    word_cap: usize,
    unsafe_markers: Vec<String>,
    consult_suffix: String,
}

impl AdvisoryGenerator {
    /// Create a generator with the given policy.
    pub fn new(completer: Arc<dyn CompletionProvider>, policy: &PolicyConfig) -> Self {
        Self {
            completer,
            word_cap: policy.advisory_word_cap,
            unsafe_markers: policy
                .unsafe_markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            consult_suffix: policy.consult_suffix.trim().to_string(),
        }
    }

    /// Build the prompt for one pairing. Deterministic for the same inputs.
    pub fn build_prompt(candidate: &IngredientList, shelf_product: &IngredientList) -> String {
        format!(
            "Task: You will be given the ingredients of two products. \
             Determine if they are safe to use together.\n\
             - If safe, answer exactly: \"It is okay to use.\"\n\
             - If not safe, answer: \"These products are not advised to be used together. \
             Because ...\" and briefly explain why.\n\
             \n\
             Product 1 Ingredients: {}\n\
             Product 2 Ingredients: {}\n",
            candidate.joined(),
            shelf_product.joined()
        )
    }

    /// Ask the backend about one pairing.
    ///
    /// Fails with [`AdvisorError::AdvisoryUnavailable`] when the backend is
    /// unreachable, answers non-2xx, or returns nothing.
    pub async fn advise(
        &self,
        candidate: &IngredientList,
        shelf_product: &IngredientList,
    ) -> Result<Advisory> {
        let prompt = Self::build_prompt(candidate, shelf_product);
        let reply = self
            .completer
            .complete(CompletionRequest::new(prompt))
            .await
            .map_err(AdvisorError::AdvisoryUnavailable)?;

        Ok(self.interpret(&reply))
    }

    /// Advise on every comparable shelf product, in shelf order.
    ///
    /// At most `concurrency` calls are in flight; failures are contained to
    /// the product they belong to.
    pub async fn advise_shelf(
        &self,
        candidate: &IngredientList,
        shelf: &Shelf,
        concurrency: usize,
    ) -> Vec<Advisory> {
        stream::iter(shelf.comparable())
            .map(|product| async move {
                self.advise(candidate, &product.ingredients)
                    .await
                    .unwrap_or_else(|err| {
                        warn!("Advisory unavailable for product {}: {err}", product.id);
                        Advisory::unverified(&err)
                    })
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Post-process a raw model reply.
    pub fn interpret(&self, reply: &str) -> Advisory {
        let reply = reply.trim();
        let lowered = reply.to_lowercase();

        if !self.unsafe_markers.iter().any(|m| lowered.contains(m)) {
            return Advisory::Safe {
                text: reply.to_string(),
            };
        }

        let (body, truncated) = cap_words(reply, self.word_cap);
        debug!("Unsafe advisory (truncated: {truncated})");

        let text = if truncated {
            let body = body.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'));
            format!("{body}. {}", self.consult_suffix)
        } else {
            format!("{body} {}", self.consult_suffix)
        };

        Advisory::Unsafe { text, truncated }
    }
}

/// Keep the first `cap` whitespace-separated words.
fn cap_words(text: &str, cap: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= cap {
        return (text.to_string(), false);
    }
    (words[..cap].join(" "), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::config::DEFAULT_CONSULT_SUFFIX;
    use pretty_assertions::assert_eq;
    use skinglow_completion::CompletionError;

    struct Unreachable;

    #[async_trait]
    impl CompletionProvider for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn model(&self) -> &str {
            "none"
        }

        async fn complete(&self, _request: CompletionRequest) -> skinglow_completion::Result<String> {
            Err(CompletionError::ProviderNotConfigured)
        }
    }

    fn generator() -> AdvisoryGenerator {
        AdvisoryGenerator::new(Arc::new(Unreachable), &PolicyConfig::default())
    }

    fn suffix() -> String {
        PolicyConfig::default().consult_suffix
    }

    #[test]
    fn test_safe_reply_is_verbatim() {
        let reply = "It is okay to use.\n\nBoth products are gentle and hydrating, with no conflicting actives at all in either formula, so they can be layered morning and night without concern for irritation or reduced efficacy over weeks of daily use alongside each other.";
        assert_eq!(
            generator().interpret(reply),
            Advisory::Safe {
                text: reply.to_string()
            }
        );
    }

    #[test]
    fn test_long_unsafe_reply_is_capped_and_suffixed() {
        let filler = vec!["irritation"; 113].join(" ");
        let reply = format!("These products are not advised together. {filler}");
        assert_eq!(reply.split_whitespace().count(), 120);

        let advisory = generator().interpret(&reply);
        let Advisory::Unsafe { text, truncated } = advisory else {
            panic!("expected unsafe advisory");
        };

        assert!(truncated);
        assert!(text.ends_with(&suffix()));
        let body = text.strip_suffix(&suffix()).unwrap();
        assert!(body.split_whitespace().count() <= 70);
        assert!(body.starts_with("These products are not advised together."));
        assert!(
            text.split_whitespace().count()
                <= 70 + DEFAULT_CONSULT_SUFFIX.split_whitespace().count()
        );
    }

    #[test]
    fn test_short_unsafe_reply_keeps_text_and_gets_suffix() {
        let reply = "These products are NOT ADVISED to be used together. Because retinol and AHA over-exfoliate.";
        let advisory = generator().interpret(reply);
        assert_eq!(
            advisory,
            Advisory::Unsafe {
                text: format!("{reply} {}", suffix()),
                truncated: false,
            }
        );
    }

    #[test]
    fn test_custom_markers_and_cap() {
        let policy = PolicyConfig {
            advisory_word_cap: 3,
            unsafe_markers: vec!["Avoid".to_string()],
            ..PolicyConfig::default()
        };
        let generator = AdvisoryGenerator::new(Arc::new(Unreachable), &policy);

        let advisory = generator.interpret("Avoid combining these, the pH clash, hurts.");
        assert_eq!(
            advisory.text(),
            Some(format!("Avoid combining these. {}", suffix()).as_str())
        );
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let candidate = IngredientList::normalize(["Retinol", "Squalane"]);
        let shelf = IngredientList::normalize(["Glycolic Acid"]);

        let prompt = AdvisoryGenerator::build_prompt(&candidate, &shelf);
        assert_eq!(prompt, AdvisoryGenerator::build_prompt(&candidate, &shelf));
        assert!(prompt.contains("Product 1 Ingredients: retinol, squalane\n"));
        assert!(prompt.contains("Product 2 Ingredients: glycolic acid\n"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable_not_safe() {
        let candidate = IngredientList::normalize(["Retinol"]);
        let err = generator()
            .advise(&candidate, &candidate)
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::AdvisoryUnavailable(_)));

        let advisory = Advisory::unverified(&err);
        assert!(!advisory.is_verified());
        assert_eq!(advisory.text(), None);
    }
}
