use serde::{Deserialize, Serialize};

use crate::entities::{ingredients, recipes, reviews, tags};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub description: Option<String>,
    pub time_minutes: i32,
    /// Price in cents, rendered with two decimals when stored
    pub price_cents: i64,
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub ingredient_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub recipe_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub rating: i32,
}

/// A recipe with its tags and ingredients loaded.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetails {
    pub recipe: recipes::Model,
    pub tags: Vec<tags::Model>,
    pub ingredients: Vec<ingredients::Model>,
    pub reviews: Vec<reviews::Model>,
}

#[must_use]
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}
