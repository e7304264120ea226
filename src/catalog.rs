//! Recipe and product catalog
//!
//! The catalog is loaded once at startup, either from the data set compiled into
//! the binary or from a JSON file with the same shape:
//!
//! ```json
//! { "recipes": [ { "id": "1", "title": "...", ... } ], "products": [ ... ] }
//! ```
//!
//! After loading it never changes; every other component borrows from it.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{Product, Recipe};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Number of recipes and products shown on the home page.
pub const FEATURED_COUNT: usize = 3;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate recipe id: {0}")]
    DuplicateRecipe(String),
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),
    #[error("Recipe {id} has taste match {value}, expected 1-5")]
    TasteMatchOutOfRange { id: String, value: u8 },
}

#[derive(Deserialize)]
struct CatalogFile {
    recipes: Vec<Recipe>,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(recipes: Vec<Recipe>, products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for recipe in &recipes {
            if !seen.insert(recipe.id.as_str()) {
                return Err(CatalogError::DuplicateRecipe(recipe.id.clone()));
            }
            if !(1..=5).contains(&recipe.taste_match) {
                return Err(CatalogError::TasteMatchOutOfRange {
                    id: recipe.id.clone(),
                    value: recipe.taste_match,
                });
            }
        }

        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
        }

        Ok(Self { recipes, products })
    }

    /// The Secret Sauce data set shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.recipes, file.products)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            recipes = catalog.recipes.len(),
            products = catalog.products.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Uses `path` when given, the built-in data set otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn featured_recipes(&self) -> &[Recipe] {
        &self.recipes[..self.recipes.len().min(FEATURED_COUNT)]
    }

    pub fn featured_products(&self) -> &[Product] {
        &self.products[..self.products.len().min(FEATURED_COUNT)]
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
