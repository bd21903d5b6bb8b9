use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "skinglow")]
#[command(about = "Ingredient compatibility checks and skincare routines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file; defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare a product's ingredients against every product on a shelf
    Compare {
        /// Shelf snapshot: JSON array of products
        #[arg(short, long)]
        shelf: PathBuf,

        /// Comma-separated ingredient list, as printed on the label
        #[arg(long, conflicts_with = "ingredient", required_unless_present = "ingredient")]
        ingredients: Option<String>,

        /// A single ingredient; repeat for more
        #[arg(short, long)]
        ingredient: Vec<String>,
    },

    /// Build a morning or night routine from the shelf
    Routine {
        /// Shelf snapshot: JSON array of products
        #[arg(short, long)]
        shelf: PathBuf,

        /// `morning` or `night`
        #[arg(short, long)]
        time: String,
    },
}

impl Commands {
    pub fn shelf_path(&self) -> &PathBuf {
        match self {
            Self::Compare { shelf, .. } | Self::Routine { shelf, .. } => shelf,
        }
    }
}

/// Candidate ingredients from either input form, unnormalized.
pub fn candidate_ingredients(joined: Option<&str>, repeated: &[String]) -> Vec<String> {
    match joined {
        Some(joined) => joined.split(',').map(str::to_string).collect(),
        None => repeated.to_vec(),
    }
}
