//! Composite cocktail creation
//!
//! Builds a cocktail, its recipe, ingredient lines, steps and category
//! links as one transaction. Any failure rolls back every prior insert.

use super::cocktails::{CocktailRepository, CocktailsTable};
use super::ingredients::IngredientRepository;
use super::recipes::{ensure_reference, RecipeIngredientsTable, RecipeStepsTable, RecipesTable};
use crate::database::models::{CreateCocktailRequest, NewRecipeIngredient, NewRecipeStep};
use crate::database::record::RecordStore;
use crate::error::Result;

impl CocktailRepository {
    /// Create a cocktail with everything attached; returns the cocktail id
    pub async fn create_complete(&self, req: &CreateCocktailRequest) -> Result<i64> {
        req.validate()?;

        tracing::info!(
            "Creating cocktail '{}' with {} ingredients and {} steps",
            req.cocktail.name.trim(),
            req.ingredients.len(),
            req.steps.len()
        );

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool().begin().await?;

        let cocktail_id =
            RecordStore::<CocktailsTable>::insert_with(&mut *tx, &req.cocktail.to_fields()).await?;

        let recipe_id =
            RecordStore::<RecipesTable>::insert_with(&mut *tx, &req.recipe.to_fields(cocktail_id))
                .await?;

        for (position, entry) in req.ingredients.iter().enumerate() {
            let unit_type = entry.unit_type.as_deref().unwrap_or(&entry.unit);
            let ingredient_id =
                IngredientRepository::resolve_with(&mut *tx, &entry.name, unit_type).await?;

            ensure_reference("ingredient", ingredient_id)?;
            ensure_reference("recipe", recipe_id)?;

            let line = NewRecipeIngredient {
                ingredient_id,
                quantity: entry.quantity,
                unit: entry.unit.clone(),
                preparation_note: entry.preparation_note.clone(),
                is_optional: entry.is_optional,
                order_index: entry.order_index.unwrap_or(position as i64),
            };
            RecordStore::<RecipeIngredientsTable>::insert_with(&mut *tx, &line.to_fields(recipe_id))
                .await?;
        }

        for (position, entry) in req.steps.iter().enumerate() {
            let step = NewRecipeStep {
                step_number: entry.step_number.unwrap_or(position as i64 + 1),
                instruction: entry.instruction.clone(),
                duration_seconds: entry.duration_seconds,
                technique: entry.technique.clone(),
                tips: entry.tips.clone(),
                is_critical: entry.is_critical,
            };
            RecordStore::<RecipeStepsTable>::insert_with(&mut *tx, &step.to_fields(recipe_id))
                .await?;
        }

        for category_id in req.category_ids() {
            sqlx::query(
                "INSERT OR IGNORE INTO cocktail_categories (cocktail_id, category_id) VALUES (?, ?)",
            )
            .bind(cocktail_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!("Cocktail created: {} (recipe {})", cocktail_id, recipe_id);
        Ok(cocktail_id)
    }
}
