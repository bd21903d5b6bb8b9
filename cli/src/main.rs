mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use skinglow_advisor::{AdvisorConfig, Shelf, SkincareAdvisor};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, candidate_ingredients};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AdvisorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AdvisorConfig::default(),
    };

    let shelf = load_shelf(cli.command.shelf_path())?;
    info!("Loaded shelf with {} products", shelf.len());

    let advisor = SkincareAdvisor::from_config(config).context("failed to initialize advisor")?;

    let output = match &cli.command {
        Commands::Compare {
            ingredients,
            ingredient,
            ..
        } => {
            let candidate = candidate_ingredients(ingredients.as_deref(), ingredient);
            let report = advisor
                .compare_candidate_against_shelf(candidate, &shelf)
                .await
                .context("comparison failed")?;
            serde_json::to_value(&report)?
        }
        Commands::Routine { time, .. } => {
            let outcome = advisor
                .generate_routine(time, &shelf)
                .await
                .context("routine generation failed")?;
            serde_json::to_value(&outcome)?
        }
    };

    print_json(&output)
}

fn load_shelf(path: &Path) -> Result<Shelf> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shelf from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid shelf JSON in {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_shelf_from_store_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");
        std::fs::write(
            &path,
            r#"[{"id": 3, "name": "Night Cream", "brand": "Acme", "type": "moisturizer",
                 "ingredients": "Aqua, Retinol"}]"#,
        )
        .unwrap();

        let shelf = load_shelf(&path).unwrap();
        assert_eq!(shelf.len(), 1);
        assert_eq!(shelf.products()[0].id, "3");
        assert_eq!(shelf.products()[0].ingredients.joined(), "aqua, retinol");
    }

    #[test]
    fn test_load_shelf_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_shelf(&path).unwrap_err();
        assert!(err.to_string().starts_with("invalid shelf JSON"));
    }
}
