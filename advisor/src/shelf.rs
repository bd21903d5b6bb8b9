//! Read-only shelf snapshots supplied by the caller.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ingredients::IngredientList;

/// A product the user owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfProduct {
    /// Store identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Display name.
    pub name: String,

    /// Brand, if recorded.
    #[serde(default)]
    pub brand: Option<String>,

    /// Product type (cleanser, serum, ...), if recorded.
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,

    /// Normalized ingredients.
    #[serde(default)]
    pub ingredients: IngredientList,
}

impl ShelfProduct {
    /// Create a product with no brand or type.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ingredients: IngredientList,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            product_type: None,
            ingredients,
        }
    }

    /// Set the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the product type.
    pub fn with_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }
}

/// Snapshot of a user's owned products, in store order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shelf {
    products: Vec<ShelfProduct>,
}

impl Shelf {
    /// Create a shelf from products.
    pub fn new(products: Vec<ShelfProduct>) -> Self {
        Self { products }
    }

    /// Add a product.
    pub fn with_product(mut self, product: ShelfProduct) -> Self {
        self.products.push(product);
        self
    }

    /// All products in store order.
    pub fn products(&self) -> &[ShelfProduct] {
        &self.products
    }

    /// Iterate over all products.
    pub fn iter(&self) -> std::slice::Iter<'_, ShelfProduct> {
        self.products.iter()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the shelf has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products that can be compared (non-empty ingredient lists), in order.
    pub fn comparable(&self) -> Vec<&ShelfProduct> {
        self.products
            .iter()
            .filter(|p| !p.ingredients.is_empty())
            .collect()
    }

    /// Resolve a free-text product name to a shelf product.
    ///
    /// Case-insensitive substring containment in either direction; the first
    /// product in shelf order wins. Blank names never match. This is known to
    /// over-match generic names such as "cream".
    pub fn resolve_product(&self, suggested: &str) -> Option<&ShelfProduct> {
        let needle = suggested.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.products.iter().find(|product| {
            let name = product.name.trim().to_lowercase();
            !name.is_empty() && (name.contains(&needle) || needle.contains(&name))
        })
    }
}

impl<'a> IntoIterator for &'a Shelf {
    type Item = &'a ShelfProduct;
    type IntoIter = std::slice::Iter<'a, ShelfProduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

/// Store ids arrive as either strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}
