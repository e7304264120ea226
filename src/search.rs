//! Free-text and faceted recipe filtering
//!
//! Facet values arrive as plain strings without a family tag. A recipe passes
//! a value when its category, difficulty or prep bucket equals it, or its
//! dietary tags contain it; a recipe passes the selection when it passes every
//! value. Picking two values of a single-valued family (say `Easy` and
//! `Medium`) therefore matches nothing. Results keep catalog order.

use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Catalog;
use crate::labeled_enum;
use crate::types::{Category, Difficulty, PrepTime, Recipe};

/// Dietary tags offered as filters.
pub const DIETARY_OPTIONS: [&str; 3] = ["Vegan", "Gluten-Free", "Dairy-Free"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetFamily {
    Category,
    Difficulty,
    PrepTime,
    Dietary,
}

labeled_enum!(FacetFamily, "facet family", {
    Category => "category",
    Difficulty => "difficulty",
    PrepTime => "prep time" | "prepTime",
    Dietary => "dietary",
});

impl FacetFamily {
    /// Whether a recipe carries exactly one value of this family.
    pub fn is_single_valued(&self) -> bool {
        !matches!(self, FacetFamily::Dietary)
    }

    pub fn options(&self) -> Vec<&'static str> {
        match self {
            FacetFamily::Category => Category::ALL.iter().map(|c| c.as_str()).collect(),
            FacetFamily::Difficulty => Difficulty::ALL.iter().map(|d| d.as_str()).collect(),
            FacetFamily::PrepTime => PrepTime::ALL.iter().map(|p| p.as_str()).collect(),
            FacetFamily::Dietary => DIETARY_OPTIONS.to_vec(),
        }
    }
}

/// Every facet family with the values a user can pick from it.
pub fn facet_options() -> Vec<(FacetFamily, Vec<&'static str>)> {
    FacetFamily::ALL
        .iter()
        .map(|family| (*family, family.options()))
        .collect()
}

/// The family a facet value belongs to, if it is one of the offered options.
pub fn facet_family(value: &str) -> Option<FacetFamily> {
    FacetFamily::ALL
        .iter()
        .copied()
        .find(|family| family.options().contains(&value))
}

/// Ordered, de-duplicated set of selected facet values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FacetSelection {
    values: Vec<String>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the value was already selected.
    pub fn add(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v != value);
        self.values.len() != before
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FacetSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = FacetSelection::new();
        for value in iter {
            selection.add(value);
        }
        selection
    }
}

/// Why a search came back empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    EmptyCatalog,
    /// Two or more values were picked from a family a recipe holds only one of.
    ConflictingFacets {
        family: FacetFamily,
        values: Vec<String>,
    },
    NoMatches,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::EmptyCatalog => f.write_str("The recipe vault is empty."),
            EmptyReason::ConflictingFacets { family, values } => write!(
                f,
                "No recipe has more than one {family}; selected {}.",
                values.join(" and ")
            ),
            EmptyReason::NoMatches => {
                f.write_str("No recipes match your search. Try adjusting your filters or search terms.")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchResults<'a> {
    pub recipes: Vec<&'a Recipe>,
    pub empty_reason: Option<EmptyReason>,
}

impl<'a> SearchResults<'a> {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.recipes.iter().map(|r| r.id.as_str()).collect()
    }
}

pub fn matches_text(recipe: &Recipe, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    recipe.title.to_lowercase().contains(&needle)
        || recipe.description.to_lowercase().contains(&needle)
}

pub fn matches_facet(recipe: &Recipe, value: &str) -> bool {
    recipe.category.as_str() == value
        || recipe.difficulty.as_str() == value
        || recipe.prep_time.as_str() == value
        || recipe.has_tag(value)
}

pub fn matches_facets<S: AsRef<str>>(recipe: &Recipe, facets: &[S]) -> bool {
    facets.iter().all(|value| matches_facet(recipe, value.as_ref()))
}

pub fn filter_recipes<'a, S: AsRef<str>>(
    catalog: &'a Catalog,
    query: &str,
    facets: &[S],
) -> SearchResults<'a> {
    let recipes: Vec<&Recipe> = catalog
        .recipes()
        .iter()
        .filter(|recipe| matches_text(recipe, query) && matches_facets(recipe, facets))
        .collect();

    let empty_reason = if !recipes.is_empty() {
        None
    } else if catalog.is_empty() {
        Some(EmptyReason::EmptyCatalog)
    } else {
        Some(conflicting_facets(facets).unwrap_or(EmptyReason::NoMatches))
    };

    tracing::debug!(
        query,
        facets = facets.len(),
        matched = recipes.len(),
        "filtered recipes"
    );

    SearchResults {
        recipes,
        empty_reason,
    }
}

fn conflicting_facets<S: AsRef<str>>(facets: &[S]) -> Option<EmptyReason> {
    let mut by_family: BTreeMap<FacetFamily, Vec<String>> = BTreeMap::new();
    for value in facets {
        let value = value.as_ref();
        if let Some(family) = facet_family(value) {
            let values = by_family.entry(family).or_default();
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
    }
    by_family
        .into_iter()
        .find(|(family, values)| family.is_single_valued() && values.len() > 1)
        .map(|(family, values)| EmptyReason::ConflictingFacets { family, values })
}
