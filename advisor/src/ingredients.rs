//! Normalized ingredient lists.

use serde::{Deserialize, Serialize};

/// An ordered list of normalized ingredient names.
///
/// Every entry is lower-cased, trimmed and has inner whitespace collapsed.
/// Empty entries are dropped and only the first of any duplicates is kept,
/// so normalizing twice yields the same list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawIngredients", into = "Vec<String>")]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    /// Normalize raw ingredient names.
    pub fn normalize<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in raw {
            let name = normalize_name(name.as_ref());
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        Self(names)
    }

    /// Split a comma-separated ingredient string and normalize it.
    pub fn parse(joined: &str) -> Self {
        Self::normalize(joined.split(','))
    }

    /// The normalized names.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterate over the normalized names.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Number of ingredients.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no ingredients.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join the names with `", "` for prompts.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

/// Normalize a single ingredient name.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl<'a> IntoIterator for &'a IngredientList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<IngredientList> for Vec<String> {
    fn from(list: IngredientList) -> Self {
        list.0
    }
}

impl From<Vec<String>> for IngredientList {
    fn from(raw: Vec<String>) -> Self {
        Self::normalize(raw)
    }
}

/// Shapes the shelf store has used for ingredients.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIngredients {
    List(Vec<String>),
    Joined(String),
    Missing,
}

impl From<RawIngredients> for IngredientList {
    fn from(raw: RawIngredients) -> Self {
        match raw {
            RawIngredients::List(names) => Self::normalize(names),
            RawIngredients::Joined(joined) => Self::parse(&joined),
            RawIngredients::Missing => Self::default(),
        }
    }
}
