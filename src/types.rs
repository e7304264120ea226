use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use crate::labeled_enum;

/// Longest note kept for a recipe, in characters.
pub const NOTE_LIMIT: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    FastFoodInspired,
    GlobalInspired,
    CommunityInspired,
}

labeled_enum!(Category, "category", {
    FastFoodInspired => "Fast Food-Inspired" | "Fast-Food-Inspired",
    GlobalInspired => "Global-Inspired",
    CommunityInspired => "Community-Inspired",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

labeled_enum!(Difficulty, "difficulty", {
    Easy => "Easy",
    Medium => "Medium",
    Hard => "Hard",
});

/// Preparation time bucket shown on recipe cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrepTime {
    UnderFifteen,
    FifteenToThirty,
    OverThirty,
}

labeled_enum!(PrepTime, "prep time", {
    UnderFifteen => "<15 min",
    FifteenToThirty => "15-30 min",
    OverThirty => ">30 min",
});

impl PrepTime {
    /// The first number printed in the bucket label, used for cooking-time totals.
    pub fn minutes(&self) -> u32 {
        match self {
            PrepTime::UnderFifteen => 15,
            PrepTime::FifteenToThirty => 15,
            PrepTime::OverThirty => 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub prep_time: PrepTime,
    pub taste_match: u8,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub story: String,
    #[serde(default, rename = "mommasWisdom", alias = "wisdom")]
    pub wisdom: String,
    #[serde(default, rename = "perfectPairings", alias = "pairings")]
    pub pairings: String,
    #[serde(default)]
    pub similar_to: Vec<String>,
}

impl Recipe {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.dietary_tags.iter().any(|t| t == tag)
    }

    pub fn share_text(&self) -> String {
        format!(
            "Check out this amazing {} recipe from Secret Sauce!",
            self.title
        )
    }

    /// Dishes this one resembles, as a display line. These are free-text
    /// names, not catalog ids.
    pub fn similar_summary(&self) -> Option<String> {
        if self.similar_to.is_empty() {
            None
        } else {
            Some(self.similar_to.join(", "))
        }
    }

    /// The ingredient line with its leading quantity multiplied by `servings`.
    pub fn scaled_ingredient(&self, index: usize, servings: u32) -> Option<String> {
        self.ingredients
            .get(index)
            .map(|line| scale_ingredient(line, servings))
    }
}

/// A leading amount (`2`, `1.5`, `1/2`) followed by a unit and a space.
static LEADING_QUANTITY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(?:/(\d+))?\s*(cups?|tbsp|tsp|lbs?|oz|g|ml|L)\s")
        .map_err(|err| tracing::error!("quantity pattern failed to compile: {err}"))
        .ok()
});

/// Multiplies the leading quantity of an ingredient line. Lines without a
/// recognised quantity and unit come back unchanged.
pub fn scale_ingredient(line: &str, servings: u32) -> String {
    if servings <= 1 {
        return line.to_string();
    }
    let Some(caps) = LEADING_QUANTITY.as_ref().and_then(|re| re.captures(line)) else {
        return line.to_string();
    };
    let (Some(whole), Some(amount), Some(unit)) = (caps.get(0), caps.get(1), caps.get(3)) else {
        return line.to_string();
    };

    let quantity = match caps.get(2) {
        Some(denominator) => scale_fraction(amount.as_str(), denominator.as_str(), servings),
        None => scale_decimal(amount.as_str(), servings),
    };
    match quantity {
        Some(quantity) => format!("{quantity} {} {}", unit.as_str(), &line[whole.end()..]),
        None => line.to_string(),
    }
}

/// `1/2` times 3 is `1 1/2`.
fn scale_fraction(numerator: &str, denominator: &str, servings: u32) -> Option<String> {
    let numerator = numerator.parse::<u64>().ok()?.checked_mul(servings as u64)?;
    let denominator = denominator.parse::<u64>().ok().filter(|d| *d > 0)?;
    let divisor = gcd(numerator, denominator);
    let (numerator, denominator) = (numerator / divisor, denominator / divisor);

    let whole = numerator / denominator;
    let rest = numerator % denominator;
    Some(match (whole, rest) {
        (whole, 0) => whole.to_string(),
        (0, rest) => format!("{rest}/{denominator}"),
        (whole, rest) => format!("{whole} {rest}/{denominator}"),
    })
}

fn scale_decimal(amount: &str, servings: u32) -> Option<String> {
    let scaled = amount.parse::<f64>().ok()? * servings as f64;
    let text = format!("{scaled:.2}");
    Some(text.trim_end_matches('0').trim_end_matches('.').to_string())
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}

/// A price in whole cents. Catalog files carry prices as decimal numbers (`8.99`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u32,
}

impl Price {
    pub const fn from_cents(cents: u32) -> Self {
        Self { cents }
    }

    /// Rounds to the nearest cent. Negative and non-finite amounts are rejected.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > u32::MAX as f64 {
            return None;
        }
        Some(Self::from_cents(cents as u32))
    }

    pub fn cents(&self) -> u32 {
        self.cents
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.cents as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_decimal(amount)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {amount}")))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Set on bundles: the summed price of the products inside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
}

impl Product {
    pub fn is_bundle(&self) -> bool {
        self.original_price.is_some()
    }

    pub fn savings(&self) -> Option<Price> {
        self.original_price
            .map(|original| Price::from_cents(original.cents().saturating_sub(self.price.cents())))
    }
}

/// Per-recipe cooking progress. Created lazily; a recipe nobody touched reads as the default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub checked_ingredients: BTreeSet<usize>,
    pub checked_steps: BTreeSet<usize>,
    pub note: String,
    pub servings: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            checked_ingredients: BTreeSet::new(),
            checked_steps: BTreeSet::new(),
            note: String::new(),
            servings: 1,
        }
    }
}

impl UserProgress {
    /// Drops indices that no longer point into the recipe's ingredients or steps.
    pub fn clamp_to(mut self, recipe: &Recipe) -> Self {
        self.checked_ingredients.retain(|&i| i < recipe.ingredients.len());
        self.checked_steps.retain(|&i| i < recipe.steps.len());
        self.servings = self.servings.max(1);
        self
    }

    pub fn all_steps_checked(&self, recipe: &Recipe) -> bool {
        (0..recipe.steps.len()).all(|i| self.checked_steps.contains(&i))
    }

    /// Share of steps checked, as a whole percentage.
    pub fn step_percent(&self, recipe: &Recipe) -> u8 {
        if recipe.steps.is_empty() {
            return 100;
        }
        let done = self
            .checked_steps
            .iter()
            .filter(|&&i| i < recipe.steps.len())
            .count();
        ((done * 100) / recipe.steps.len()) as u8
    }
}

/// Cuts a note down to [`NOTE_LIMIT`] characters without splitting a character.
pub fn truncate_note(text: &str) -> String {
    text.chars().take(NOTE_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with(ingredients: usize, steps: usize) -> Recipe {
        Recipe {
            id: "t".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            image: String::new(),
            category: Category::GlobalInspired,
            difficulty: Difficulty::Easy,
            prep_time: PrepTime::UnderFifteen,
            taste_match: 3,
            dietary_tags: vec![],
            ingredients: (0..ingredients).map(|i| format!("ingredient {i}")).collect(),
            steps: (0..steps).map(|i| format!("step {i}")).collect(),
            story: String::new(),
            wisdom: String::new(),
            pairings: String::new(),
            similar_to: vec![],
        }
    }

    #[test]
    fn labels_parse_with_aliases_and_case() {
        assert_eq!(
            "Fast-Food-Inspired".parse::<Category>().unwrap(),
            Category::FastFoodInspired
        );
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(">30 min".parse::<PrepTime>().unwrap(), PrepTime::OverThirty);
        assert!("Spicy".parse::<Difficulty>().is_err());
        assert_eq!(Category::FastFoodInspired.to_string(), "Fast Food-Inspired");
    }

    #[test]
    fn price_rounds_to_cents_and_formats() {
        let price = Price::from_decimal(8.99).unwrap();
        assert_eq!(price.cents(), 899);
        assert_eq!(price.to_string(), "$8.99");
        assert_eq!(Price::from_cents(2400).to_string(), "$24.00");
        assert!(Price::from_decimal(-1.0).is_none());
        assert!(Price::from_decimal(f64::NAN).is_none());
    }

    #[test]
    fn clamp_drops_stale_indices() {
        let recipe = recipe_with(2, 3);
        let progress = UserProgress {
            checked_ingredients: [0, 1, 5].into_iter().collect(),
            checked_steps: [2, 3, 9].into_iter().collect(),
            note: String::new(),
            servings: 0,
        }
        .clamp_to(&recipe);
        assert_eq!(progress.checked_ingredients, BTreeSet::from([0, 1]));
        assert_eq!(progress.checked_steps, BTreeSet::from([2]));
        assert_eq!(progress.servings, 1);
    }

    #[test]
    fn step_completion_and_percent() {
        let recipe = recipe_with(1, 4);
        let mut progress = UserProgress::default();
        assert_eq!(progress.step_percent(&recipe), 0);
        progress.checked_steps.extend([0, 1]);
        assert_eq!(progress.step_percent(&recipe), 50);
        assert!(!progress.all_steps_checked(&recipe));
        progress.checked_steps.extend([2, 3]);
        assert!(progress.all_steps_checked(&recipe));
    }

    #[test]
    fn note_truncates_on_char_boundary() {
        let long = "é".repeat(NOTE_LIMIT + 20);
        let note = truncate_note(&long);
        assert_eq!(note.chars().count(), NOTE_LIMIT);
    }

    #[test]
    fn single_serving_leaves_ingredients_alone() {
        assert_eq!(scale_ingredient("1/2 cup mayonnaise", 1), "1/2 cup mayonnaise");
    }

    #[test]
    fn fractions_scale_and_reduce() {
        assert_eq!(scale_ingredient("1/2 cup mayonnaise", 2), "1 cup mayonnaise");
        assert_eq!(scale_ingredient("1/4 tsp paprika", 3), "3/4 tsp paprika");
        assert_eq!(scale_ingredient("1/2 tbsp thyme", 3), "1 1/2 tbsp thyme");
        assert_eq!(scale_ingredient("2/3 tbsp salt", 3), "2 tbsp salt");
    }

    #[test]
    fn whole_and_decimal_amounts_scale() {
        assert_eq!(
            scale_ingredient("2 cups all-purpose flour", 2),
            "4 cups all-purpose flour"
        );
        assert_eq!(scale_ingredient("1.5 oz espresso", 3), "4.5 oz espresso");
        assert_eq!(scale_ingredient("2tbsp honey", 2), "4 tbsp honey");
    }

    #[test]
    fn lines_without_a_unit_quantity_are_unchanged() {
        let line = "1 whole chicken, cut into pieces";
        assert_eq!(scale_ingredient(line, 4), line);
        assert_eq!(scale_ingredient("Salt to taste", 4), "Salt to taste");
        assert_eq!(scale_ingredient("2 garlic cloves", 2), "2 garlic cloves");
    }

    #[test]
    fn recipe_scales_by_index() {
        let mut recipe = recipe_with(0, 0);
        recipe.ingredients = vec!["1/2 cup mayonnaise".to_string()];
        assert_eq!(
            recipe.scaled_ingredient(0, 2).as_deref(),
            Some("1 cup mayonnaise")
        );
        assert_eq!(recipe.scaled_ingredient(1, 2), None);
    }

    #[test]
    fn similar_dishes_are_listed_by_name() {
        let catalog = crate::catalog::Catalog::builtin().unwrap();
        let burger = catalog.recipe("1").unwrap();
        let summary = burger.similar_summary().unwrap();
        assert!(summary.contains("Thousand Island Dressing"));
        assert!(catalog.recipe("Thousand Island Dressing").is_none());

        assert_eq!(recipe_with(1, 1).similar_summary(), None);
    }
}
