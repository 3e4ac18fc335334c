use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use thiserror::Error;

use super::user::is_unique_violation;
use crate::entities::{ingredients, recipe_ingredients, recipe_tags, recipes, reviews, tags};
use crate::models::recipe::{NewRecipe, NewReview, RecipeDetails, format_price};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_tag(&self, user_id: i32, name: &str) -> Result<tags::Model, CatalogError> {
        let name = require_text("Tag name", name)?;

        let tag = tags::ActiveModel {
            user_id: Set(user_id),
            name: Set(name),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(tag)
    }

    /// Ingredient names are unique, so an existing row is returned as-is.
    pub async fn create_ingredient(&self, name: &str) -> Result<ingredients::Model, CatalogError> {
        let name = require_text("Ingredient name", name)?;

        if let Some(existing) = ingredients::Entity::find()
            .filter(ingredients::Column::Name.eq(name.as_str()))
            .one(&self.conn)
            .await?
        {
            return Ok(existing);
        }

        let inserted = ingredients::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await;

        match inserted {
            Ok(ingredient) => Ok(ingredient),
            // A concurrent call created the same name first
            Err(e) if is_unique_violation(&e) => ingredients::Entity::find()
                .filter(ingredients::Column::Name.eq(name.as_str()))
                .one(&self.conn)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("Ingredient {name}"))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_recipe(
        &self,
        user_id: i32,
        input: &NewRecipe,
    ) -> Result<recipes::Model, CatalogError> {
        let title = require_text("Recipe title", &input.title)?;
        if input.time_minutes < 0 {
            return Err(CatalogError::Validation(
                "Preparation time cannot be negative".to_string(),
            ));
        }
        if input.price_cents < 0 {
            return Err(CatalogError::Validation("Price cannot be negative".to_string()));
        }

        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            user_id: Set(user_id),
            title: Set(title),
            description: Set(input.description.clone()),
            time_minutes: Set(input.time_minutes),
            price: Set(format_price(input.price_cents)),
            link: Set(input.link.clone()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for tag_id in dedup(&input.tag_ids) {
            recipe_tags::ActiveModel {
                recipe_id: Set(recipe.id),
                tag_id: Set(tag_id),
            }
            .insert(&txn)
            .await?;
        }

        for ingredient_id in dedup(&input.ingredient_ids) {
            recipe_ingredients::ActiveModel {
                recipe_id: Set(recipe.id),
                ingredient_id: Set(ingredient_id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        Ok(recipe)
    }

    pub async fn create_review(
        &self,
        user_id: i32,
        input: &NewReview,
    ) -> Result<reviews::Model, CatalogError> {
        let title = require_text("Review title", &input.title)?;
        if !(1..=5).contains(&input.rating) {
            return Err(CatalogError::Validation(format!(
                "Invalid rating: {}. Rating must be between 1 and 5",
                input.rating
            )));
        }

        if let Some(recipe_id) = input.recipe_id
            && recipes::Entity::find_by_id(recipe_id)
                .one(&self.conn)
                .await?
                .is_none()
        {
            return Err(CatalogError::NotFound(format!("Recipe {recipe_id}")));
        }

        let review = reviews::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(input.recipe_id),
            title: Set(title),
            body: Set(input.body.clone()),
            rating: Set(input.rating),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(review)
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<RecipeDetails>, CatalogError> {
        let Some(recipe) = recipes::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let tags = recipe
            .find_related(tags::Entity)
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await?;
        let ingredients = recipe
            .find_related(ingredients::Entity)
            .order_by_asc(ingredients::Column::Name)
            .all(&self.conn)
            .await?;
        let reviews = self.list_reviews_for_recipe(id).await?;

        Ok(Some(RecipeDetails {
            recipe,
            tags,
            ingredients,
            reviews,
        }))
    }

    pub async fn list_reviews_for_recipe(
        &self,
        recipe_id: i32,
    ) -> Result<Vec<reviews::Model>, CatalogError> {
        let reviews = reviews::Entity::find()
            .filter(reviews::Column::RecipeId.eq(recipe_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(reviews)
    }
}

fn require_text(field: &str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
