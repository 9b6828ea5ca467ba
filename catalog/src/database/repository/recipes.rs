//! Recipe repository
//!
//! Recipes, their ingredient lines and their ordered steps. Ingredient lines
//! are always returned by `order_index`, mandatory before optional; steps by
//! `step_number`.

use crate::config::{
    COMPLEXITY_INGREDIENT_WEIGHT, COMPLEXITY_MINUTE_WEIGHT, COMPLEXITY_MODERATE_MAX,
    COMPLEXITY_SIMPLE_MAX, COMPLEXITY_STEP_WEIGHT,
};
use crate::database::models::{
    ComplexityLevel, NewRecipe, NewRecipeIngredient, NewRecipeStep, Recipe, RecipeComplete,
    RecipeComplexity, RecipeIngredient, RecipeIngredientLink, RecipeStep, UpdateRecipeIngredient,
    UpdateRecipeStep,
};
use crate::database::record::{RecordStore, Table};
use crate::error::{AppError, Result};
use sqlx::{Executor, Sqlite, SqlitePool};

pub struct RecipesTable;

impl Table for RecipesTable {
    const NAME: &'static str = "recipes";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["cocktail_id", "glass_type", "garnish", "serving_suggestion"];
    type Row = Recipe;
}

pub struct RecipeIngredientsTable;

impl Table for RecipeIngredientsTable {
    const NAME: &'static str = "recipe_ingredients";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "recipe_id",
        "ingredient_id",
        "quantity",
        "unit",
        "preparation_note",
        "is_optional",
        "order_index",
    ];
    type Row = RecipeIngredientLink;
}

pub struct RecipeStepsTable;

impl Table for RecipeStepsTable {
    const NAME: &'static str = "recipe_steps";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "recipe_id",
        "step_number",
        "instruction",
        "duration_seconds",
        "technique",
        "tips",
        "is_critical",
    ];
    type Row = RecipeStep;
}

const INGREDIENTS_QUERY: &str = r#"
    SELECT ri.id, ri.recipe_id, ri.ingredient_id, i.name, ri.quantity, ri.unit,
           ri.preparation_note, ri.is_optional, ri.order_index,
           i.ingredient_type, i.alcohol_content
    FROM recipe_ingredients ri
    JOIN ingredients i ON i.id = ri.ingredient_id
    WHERE ri.recipe_id = ?
    ORDER BY ri.order_index ASC, ri.is_optional ASC, ri.id ASC
"#;

const STEPS_QUERY: &str = r#"
    SELECT * FROM recipe_steps
    WHERE recipe_id = ?
    ORDER BY step_number ASC, id ASC
"#;

/// Ingredient lines of a recipe in display order
pub(crate) async fn fetch_ingredients<'c, E>(executor: E, recipe_id: i64) -> Result<Vec<RecipeIngredient>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let ingredients = sqlx::query_as::<_, RecipeIngredient>(INGREDIENTS_QUERY)
        .bind(recipe_id)
        .fetch_all(executor)
        .await?;

    Ok(ingredients)
}

/// Steps of a recipe in order
pub(crate) async fn fetch_steps<'c, E>(executor: E, recipe_id: i64) -> Result<Vec<RecipeStep>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let steps = sqlx::query_as::<_, RecipeStep>(STEPS_QUERY)
        .bind(recipe_id)
        .fetch_all(executor)
        .await?;

    Ok(steps)
}

/// Fail fast on ids that cannot reference a row
pub(crate) fn ensure_reference(label: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(AppError::validation(format!("Unresolved {} id: {}", label, id)));
    }
    Ok(())
}

/// Weighted sum of ingredient count, step count and total minutes
pub fn score_complexity(
    ingredient_count: i64,
    step_count: i64,
    total_duration_seconds: i64,
) -> RecipeComplexity {
    let minutes = total_duration_seconds as f64 / 60.0;
    let score = ingredient_count as f64 * COMPLEXITY_INGREDIENT_WEIGHT
        + step_count as f64 * COMPLEXITY_STEP_WEIGHT
        + minutes * COMPLEXITY_MINUTE_WEIGHT;

    let level = if score < COMPLEXITY_SIMPLE_MAX {
        ComplexityLevel::Simple
    } else if score < COMPLEXITY_MODERATE_MAX {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Complex
    };

    RecipeComplexity {
        ingredient_count,
        step_count,
        total_duration_seconds,
        score,
        level,
    }
}

#[derive(Clone)]
pub struct RecipeRepository {
    records: RecordStore<RecipesTable>,
    ingredient_lines: RecordStore<RecipeIngredientsTable>,
    steps: RecordStore<RecipeStepsTable>,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool.clone()),
            ingredient_lines: RecordStore::new(pool.clone()),
            steps: RecordStore::new(pool),
        }
    }

    fn pool(&self) -> &SqlitePool {
        self.records.pool()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        self.records.find_by_id(id).await
    }

    pub async fn find_by_cocktail_id(&self, cocktail_id: i64) -> Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE cocktail_id = ?")
            .bind(cocktail_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(recipe)
    }

    pub async fn create_for_cocktail(&self, cocktail_id: i64, req: NewRecipe) -> Result<i64> {
        ensure_reference("cocktail", cocktail_id)?;

        let id = self.records.create(&req.to_fields(cocktail_id)).await?;

        tracing::debug!("Created recipe {} for cocktail {}", id, cocktail_id);
        Ok(id)
    }

    pub async fn get_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        fetch_ingredients(self.pool(), recipe_id).await
    }

    pub async fn get_steps(&self, recipe_id: i64) -> Result<Vec<RecipeStep>> {
        fetch_steps(self.pool(), recipe_id).await
    }

    /// Link an ingredient; returns the new line id
    pub async fn add_ingredient(&self, recipe_id: i64, req: NewRecipeIngredient) -> Result<i64> {
        ensure_reference("recipe", recipe_id)?;
        ensure_reference("ingredient", req.ingredient_id)?;
        req.validate()?;

        self.ingredient_lines.create(&req.to_fields(recipe_id)).await
    }

    pub async fn update_ingredient(&self, line_id: i64, req: UpdateRecipeIngredient) -> Result<bool> {
        req.validate()?;
        self.ingredient_lines.update(line_id, &req.to_fields()).await
    }

    pub async fn remove_ingredient(&self, line_id: i64) -> Result<bool> {
        self.ingredient_lines.delete(line_id).await
    }

    pub async fn add_step(&self, recipe_id: i64, req: NewRecipeStep) -> Result<i64> {
        ensure_reference("recipe", recipe_id)?;
        req.validate()?;

        self.steps.create(&req.to_fields(recipe_id)).await
    }

    /// Append a step after the current last one
    pub async fn append_step(&self, recipe_id: i64, instruction: &str) -> Result<i64> {
        let last: Option<i64> =
            sqlx::query_scalar("SELECT MAX(step_number) FROM recipe_steps WHERE recipe_id = ?")
                .bind(recipe_id)
                .fetch_one(self.pool())
                .await?;

        let step = NewRecipeStep {
            step_number: last.unwrap_or(0) + 1,
            instruction: instruction.to_string(),
            duration_seconds: None,
            technique: None,
            tips: None,
            is_critical: false,
        };

        self.add_step(recipe_id, step).await
    }

    pub async fn update_step(&self, step_id: i64, req: UpdateRecipeStep) -> Result<bool> {
        req.validate()?;
        self.steps.update(step_id, &req.to_fields()).await
    }

    /// Remove a step and close the gap in numbering
    pub async fn remove_step(&self, step_id: i64) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let removed: Option<(i64, i64)> = sqlx::query_as(
            "DELETE FROM recipe_steps WHERE id = ? RETURNING recipe_id, step_number",
        )
        .bind(step_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((recipe_id, step_number)) = removed else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE recipe_steps SET step_number = step_number - 1 WHERE recipe_id = ? AND step_number > ?",
        )
        .bind(recipe_id)
        .bind(step_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Removed step {} from recipe {}", step_id, recipe_id);
        Ok(true)
    }

    /// Recipe with its ingredient lines and steps
    pub async fn get_complete(&self, recipe_id: i64) -> Result<Option<RecipeComplete>> {
        let Some(recipe) = self.find_by_id(recipe_id).await? else {
            return Ok(None);
        };

        let ingredients = self.get_ingredients(recipe_id).await?;
        let steps = self.get_steps(recipe_id).await?;

        Ok(Some(RecipeComplete {
            recipe,
            ingredients,
            steps,
        }))
    }

    /// Derived complexity of a recipe; `None` when the recipe does not exist
    pub async fn get_recipe_complexity(&self, recipe_id: i64) -> Result<Option<RecipeComplexity>> {
        let counts: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = r.id),
                (SELECT COUNT(*) FROM recipe_steps WHERE recipe_id = r.id),
                (SELECT COALESCE(SUM(duration_seconds), 0) FROM recipe_steps WHERE recipe_id = r.id)
            FROM recipes r
            WHERE r.id = ?
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(counts.map(|(ingredients, steps, duration)| {
            score_complexity(ingredients, steps, duration)
        }))
    }

    /// Copy a recipe with its ingredient lines and steps onto another cocktail.
    ///
    /// Returns `None` when the source recipe does not exist.
    pub async fn duplicate_recipe(
        &self,
        recipe_id: i64,
        target_cocktail_id: i64,
    ) -> Result<Option<i64>> {
        ensure_reference("cocktail", target_cocktail_id)?;

        let mut tx = self.pool().begin().await?;

        let source = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(source) = source else {
            return Ok(None);
        };

        let new_recipe = NewRecipe {
            glass_type: source.glass_type,
            garnish: source.garnish,
            serving_suggestion: source.serving_suggestion,
        };
        let new_id =
            RecordStore::<RecipesTable>::insert_with(&mut *tx, &new_recipe.to_fields(target_cocktail_id))
                .await?;

        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients
                (recipe_id, ingredient_id, quantity, unit, preparation_note, is_optional, order_index)
            SELECT ?, ingredient_id, quantity, unit, preparation_note, is_optional, order_index
            FROM recipe_ingredients WHERE recipe_id = ?
            ORDER BY id
            "#,
        )
        .bind(new_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO recipe_steps
                (recipe_id, step_number, instruction, duration_seconds, technique, tips, is_critical)
            SELECT ?, step_number, instruction, duration_seconds, technique, tips, is_critical
            FROM recipe_steps WHERE recipe_id = ?
            ORDER BY step_number
            "#,
        )
        .bind(new_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Duplicated recipe {} onto cocktail {} as recipe {}",
            recipe_id,
            target_cocktail_id,
            new_id
        );
        Ok(Some(new_id))
    }
}
