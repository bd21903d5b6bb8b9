//! End-to-end comparison tests against in-process backends.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RegistryEmbedder, ScriptedCompleter, advisor, product};
use pretty_assertions::assert_eq;
use skinglow_advisor::{
    Advisory, AdvisorError, ComparisonStatus, MatchRecord, Shelf, SimilarityStatus,
};

const SAFE: &str = "It is okay to use.";

#[tokio::test]
async fn test_empty_shelf_makes_no_backend_calls() {
    let embedder = Arc::new(RegistryEmbedder::new());
    let completer = Arc::new(ScriptedCompleter::replying(SAFE));
    let advisor = advisor(embedder.clone(), completer.clone());

    let report = advisor
        .compare_candidate_against_shelf(["Niacinamide"], &Shelf::default())
        .await
        .unwrap();

    assert_eq!(report.status, ComparisonStatus::EmptyShelf);
    assert!(report.summaries.is_empty());
    assert!(report.message.is_some());
    assert_eq!(embedder.calls(), 0);
    assert_eq!(completer.calls(), 0);
}

#[tokio::test]
async fn test_identical_ingredient_matches_fully() {
    let embedder = Arc::new(RegistryEmbedder::new());
    let completer = Arc::new(ScriptedCompleter::replying(SAFE));
    let advisor = advisor(embedder.clone(), completer.clone());
    let shelf = Shelf::default().with_product(product("42", "B5 Serum", &["Niacinamide"]));

    let report = advisor
        .compare_candidate_against_shelf([" NIACINAMIDE "], &shelf)
        .await
        .unwrap();

    assert_eq!(report.status, ComparisonStatus::Ok);
    assert_eq!(report.summaries.len(), 1);

    let summary = &report.summaries[0];
    assert_eq!(summary.product_id, "42");
    assert_eq!(summary.max_score, 1.0);
    assert_eq!(summary.coverage_percent, 100.0);
    assert_eq!(summary.headline_percent(), "100.0%");
    assert_eq!(
        summary.matches,
        vec![MatchRecord {
            candidate_ingredient: "niacinamide".to_string(),
            shelf_ingredient: "niacinamide".to_string(),
            score: 1.0,
            shelf_product_id: "42".to_string(),
        }]
    );
    assert_eq!(summary.similarity, SimilarityStatus::Available);
    assert_eq!(
        summary.advisory,
        Advisory::Safe {
            text: SAFE.to_string()
        }
    );

    // One batched embedding call and one advisory call per product.
    assert_eq!(embedder.calls(), 1);
    assert_eq!(completer.calls(), 1);
}

#[tokio::test]
async fn test_failures_are_contained_to_their_product() {
    let embedder = Arc::new(RegistryEmbedder::new().failing_on("mystery extract"));
    let completer = Arc::new(ScriptedCompleter::replying(SAFE).failing_on("glycolic acid"));
    let advisor = advisor(embedder, completer);

    let shelf = Shelf::default()
        .with_product(product("1", "Gel Cleanser", &["Aqua", "Niacinamide"]))
        .with_product(product("2", "Odd Balm", &["Mystery Extract"]))
        .with_product(product("3", "Peel Pads", &["Glycolic Acid"]));

    let report = advisor
        .compare_candidate_against_shelf(["Niacinamide", "Panthenol"], &shelf)
        .await
        .unwrap();

    assert_eq!(report.status, ComparisonStatus::Ok);
    let ids: Vec<&str> = report.summaries.iter().map(|s| s.product_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let cleanser = &report.summaries[0];
    assert_eq!(cleanser.similarity, SimilarityStatus::Available);
    assert_eq!(cleanser.max_score, 1.0);
    assert_eq!(cleanser.coverage_percent, 50.0);
    assert_eq!(cleanser.headline_percent(), "100.0%");
    assert!(cleanser.advisory.is_verified());

    let balm = &report.summaries[1];
    assert!(matches!(balm.similarity, SimilarityStatus::Unavailable { .. }));
    assert_eq!(balm.max_score, 0.0);
    assert!(balm.matches.is_empty());
    assert!(balm.advisory.is_verified());

    let pads = &report.summaries[2];
    assert_eq!(pads.similarity, SimilarityStatus::Available);
    assert!(matches!(pads.advisory, Advisory::Unverified { .. }));
    assert_eq!(pads.advisory.text(), None);
}

#[tokio::test]
async fn test_unsafe_advisory_is_capped_and_flagged() {
    let long_reason = vec!["over-exfoliation"; 100].join(" ");
    let unsafe_reply =
        format!("These products are not advised to be used together. Because {long_reason}");

    let completer = Arc::new(
        ScriptedCompleter::replying(SAFE).when("Product 2 Ingredients: retinol", &unsafe_reply),
    );
    let advisor = advisor(Arc::new(RegistryEmbedder::new()), completer);

    let shelf = Shelf::default()
        .with_product(product("1", "Retinol Night Cream", &["Retinol"]))
        .with_product(product("2", "Hydrating Toner", &["Glycerin"]));

    let report = advisor
        .compare_candidate_against_shelf(["Glycolic Acid"], &shelf)
        .await
        .unwrap();

    let flagged: Vec<&str> = report.flagged().map(|s| s.product_id.as_str()).collect();
    assert_eq!(flagged, vec!["1"]);

    let Advisory::Unsafe { text, truncated } = &report.summaries[0].advisory else {
        panic!("expected unsafe advisory");
    };
    assert!(*truncated);
    assert!(text.ends_with("may be harmful to your skin."));
    assert!(text.split_whitespace().count() < unsafe_reply.split_whitespace().count());
}

#[tokio::test]
async fn test_slow_products_keep_shelf_order() {
    let completer = Arc::new(
        ScriptedCompleter::replying(SAFE)
            .when("Product 2 Ingredients: squalane", "Squalane is fine. It is okay to use.")
            .delay_when("Product 2 Ingredients: squalane", Duration::from_millis(50)),
    );
    let advisor = advisor(Arc::new(RegistryEmbedder::new()), completer.clone());

    let shelf = Shelf::default()
        .with_product(product("slow", "Face Oil", &["Squalane"]))
        .with_product(product("fast-1", "Gel", &["Aloe"]))
        .with_product(product("fast-2", "Mist", &["Rose Water"]));

    let report = advisor
        .compare_candidate_against_shelf(["Squalane"], &shelf)
        .await
        .unwrap();

    let ids: Vec<&str> = report.summaries.iter().map(|s| s.product_id.as_str()).collect();
    assert_eq!(ids, vec!["slow", "fast-1", "fast-2"]);
    assert_eq!(
        report.summaries[0].advisory.text(),
        Some("Squalane is fine. It is okay to use.")
    );
    assert_eq!(report.summaries[0].max_score, 1.0);
    assert_eq!(report.summaries[1].advisory.text(), Some(SAFE));
    assert_eq!(completer.calls(), 3);
}

#[tokio::test]
async fn test_products_without_ingredients_are_skipped() {
    let completer = Arc::new(ScriptedCompleter::replying(SAFE));
    let advisor = advisor(Arc::new(RegistryEmbedder::new()), completer.clone());

    let shelf = Shelf::default()
        .with_product(product("1", "Unknown Jar", &[]))
        .with_product(product("2", "Sunscreen", &["Zinc Oxide"]));

    let report = advisor
        .compare_candidate_against_shelf(["Zinc Oxide"], &shelf)
        .await
        .unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].product_id, "2");
    assert_eq!(completer.calls(), 1);
}

#[tokio::test]
async fn test_blank_candidate_is_rejected() {
    let completer = Arc::new(ScriptedCompleter::replying(SAFE));
    let advisor = advisor(Arc::new(RegistryEmbedder::new()), completer.clone());
    let shelf = Shelf::default().with_product(product("1", "Serum", &["Aqua"]));

    let err = advisor
        .compare_candidate_against_shelf(["  ", ""], &shelf)
        .await
        .unwrap_err();

    assert!(matches!(err, AdvisorError::EmptyCandidate));
    assert_eq!(completer.calls(), 0);
}
