//! Database models
//!
//! Rust structs representing database entities, the shaped projections
//! returned to the UI, and the request payloads accepted by repositories.
//! All models use serde for serialization to frontend.

use super::record::{Fields, Value};
use crate::config::{MAX_ALCOHOL_CONTENT, MAX_NAME_LENGTH};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// ===== Enumerations =====

/// How hard a cocktail is to prepare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(AppError::validation(format!("Unknown difficulty: {}", other))),
        }
    }
}

impl From<Difficulty> for Value {
    fn from(value: Difficulty) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

/// Kind of notification shown in the notification center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationType {
    Achievement,
    Reminder,
    Warning,
    Update,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::Reminder => "reminder",
            Self::Warning => "warning",
            Self::Update => "update",
        }
    }
}

impl From<NotificationType> for Value {
    fn from(value: NotificationType) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

// ===== Entities =====

/// Catalog user. The credential is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A cocktail row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cocktail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    /// Minutes
    pub preparation_time: Option<i64>,
    /// Percent, 0-100
    pub alcohol_content: Option<f64>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    pub is_alcoholic: bool,
    pub is_featured: bool,
    pub created_by: Option<i64>,
    pub pairing_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Preparation attributes attached one-to-one to a cocktail
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub cocktail_id: i64,
    pub glass_type: Option<String>,
    pub garnish: Option<String>,
    pub serving_suggestion: Option<String>,
}

/// Raw `recipe_ingredients` row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredientLink {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    pub is_optional: bool,
    pub order_index: i64,
}

/// Ingredient line of a recipe joined with its ingredient
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    pub is_optional: bool,
    pub order_index: i64,
    pub ingredient_type: Option<String>,
    pub alcohol_content: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeStep {
    pub id: i64,
    pub recipe_id: i64,
    /// 1-based
    pub step_number: i64,
    pub instruction: String,
    pub duration_seconds: Option<i64>,
    pub technique: Option<String>,
    pub tips: Option<String>,
    pub is_critical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub unit_type: String,
    pub alcohol_content: Option<f64>,
    pub ingredient_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    /// Built-in categories cannot be deleted
    pub is_system: bool,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub user_id: i64,
    pub cocktail_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    /// None for system-wide notifications
    pub user_id: Option<i64>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub is_system: bool,
    pub cocktail_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Food or drink pairing suggestion
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pairing {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// ===== Shaped projections =====

/// Category reference embedded in cocktail summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTag {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// One row of the cocktail list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocktailSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub preparation_time: Option<i64>,
    pub alcohol_content: Option<f64>,
    pub image_url: Option<String>,
    pub is_alcoholic: bool,
    pub is_featured: bool,
    pub created_by: Option<i64>,
    pub categories: Vec<CategoryTag>,
}

/// Cocktail with its recipe, ordered ingredients and ordered steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocktailComplete {
    #[serde(flatten)]
    pub cocktail: Cocktail,
    pub recipe: Option<Recipe>,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub category_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeComplete {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
}

/// Aggregate catalog counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CocktailStatistics {
    pub total: i64,
    pub alcoholic: i64,
    pub non_alcoholic: i64,
    pub featured: i64,
    pub easy: i64,
    pub medium: i64,
    pub hard: i64,
    pub average_preparation_time: Option<f64>,
    pub average_alcohol_content: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

/// Derived recipe complexity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeComplexity {
    pub ingredient_count: i64,
    pub step_count: i64,
    pub total_duration_seconds: i64,
    pub score: f64,
    pub level: ComplexityLevel,
}

/// Result of flipping a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn is_favorite(&self) -> bool {
        matches!(self, Self::Added)
    }
}

// ===== Requests =====

/// Create cocktail request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCocktail {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub preparation_time: Option<i64>,
    pub alcohol_content: Option<f64>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_alcoholic: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub created_by: Option<i64>,
    pub pairing_id: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl NewCocktail {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_alcoholic: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("Cocktail name", &self.name)?;
        validate_cocktail_numbers(
            self.preparation_time,
            self.alcohol_content,
            self.servings,
        )
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", self.name.trim())
            .with("description", self.description.clone())
            .with("difficulty", self.difficulty)
            .with("preparation_time", self.preparation_time)
            .with("alcohol_content", self.alcohol_content)
            .with("servings", self.servings)
            .with("image_url", self.image_url.clone())
            .with("is_alcoholic", self.is_alcoholic)
            .with("is_featured", self.is_featured)
            .with("created_by", self.created_by)
            .with("pairing_id", self.pairing_id)
            .with("created_at", Utc::now())
            .with("updated_at", Utc::now())
    }
}

/// Update cocktail request; only provided fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCocktailRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub preparation_time: Option<i64>,
    pub alcohol_content: Option<f64>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    pub is_alcoholic: Option<bool>,
    pub is_featured: Option<bool>,
    pub pairing_id: Option<i64>,
}

impl UpdateCocktailRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name("Cocktail name", name)?;
        }
        validate_cocktail_numbers(
            self.preparation_time,
            self.alcohol_content,
            self.servings,
        )
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with_some("name", self.name.as_deref().map(str::trim))
            .with_some("description", self.description.clone())
            .with_some("difficulty", self.difficulty)
            .with_some("preparation_time", self.preparation_time)
            .with_some("alcohol_content", self.alcohol_content)
            .with_some("servings", self.servings)
            .with_some("image_url", self.image_url.clone())
            .with_some("is_alcoholic", self.is_alcoholic)
            .with_some("is_featured", self.is_featured)
            .with_some("pairing_id", self.pairing_id)
            .with("updated_at", Utc::now())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRecipe {
    pub glass_type: Option<String>,
    pub garnish: Option<String>,
    pub serving_suggestion: Option<String>,
}

impl NewRecipe {
    pub fn to_fields(&self, cocktail_id: i64) -> Fields {
        Fields::new()
            .with("cocktail_id", cocktail_id)
            .with("glass_type", self.glass_type.clone())
            .with("garnish", self.garnish.clone())
            .with("serving_suggestion", self.serving_suggestion.clone())
    }
}

/// Link an existing ingredient to a recipe
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipeIngredient {
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    pub order_index: i64,
}

impl NewRecipeIngredient {
    pub fn validate(&self) -> Result<()> {
        validate_quantity(self.quantity)?;
        if self.order_index < 0 {
            return Err(AppError::validation("Order index cannot be negative"));
        }
        Ok(())
    }

    pub fn to_fields(&self, recipe_id: i64) -> Fields {
        Fields::new()
            .with("recipe_id", recipe_id)
            .with("ingredient_id", self.ingredient_id)
            .with("quantity", self.quantity)
            .with("unit", self.unit.trim())
            .with("preparation_note", self.preparation_note.clone())
            .with("is_optional", self.is_optional)
            .with("order_index", self.order_index)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipeIngredient {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub preparation_note: Option<String>,
    pub is_optional: Option<bool>,
    pub order_index: Option<i64>,
}

impl UpdateRecipeIngredient {
    pub fn validate(&self) -> Result<()> {
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if self.order_index.is_some_and(|i| i < 0) {
            return Err(AppError::validation("Order index cannot be negative"));
        }
        Ok(())
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with_some("quantity", self.quantity)
            .with_some("unit", self.unit.clone())
            .with_some("preparation_note", self.preparation_note.clone())
            .with_some("is_optional", self.is_optional)
            .with_some("order_index", self.order_index)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipeStep {
    pub step_number: i64,
    pub instruction: String,
    pub duration_seconds: Option<i64>,
    pub technique: Option<String>,
    pub tips: Option<String>,
    #[serde(default)]
    pub is_critical: bool,
}

impl NewRecipeStep {
    pub fn validate(&self) -> Result<()> {
        validate_step(self.step_number, &self.instruction, self.duration_seconds)
    }

    pub fn to_fields(&self, recipe_id: i64) -> Fields {
        Fields::new()
            .with("recipe_id", recipe_id)
            .with("step_number", self.step_number)
            .with("instruction", self.instruction.trim())
            .with("duration_seconds", self.duration_seconds)
            .with("technique", self.technique.clone())
            .with("tips", self.tips.clone())
            .with("is_critical", self.is_critical)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipeStep {
    pub step_number: Option<i64>,
    pub instruction: Option<String>,
    pub duration_seconds: Option<i64>,
    pub technique: Option<String>,
    pub tips: Option<String>,
    pub is_critical: Option<bool>,
}

impl UpdateRecipeStep {
    pub fn validate(&self) -> Result<()> {
        if self.step_number.is_some_and(|n| n < 1) {
            return Err(AppError::validation("Step number must start at 1"));
        }
        if let Some(instruction) = &self.instruction {
            if instruction.trim().is_empty() {
                return Err(AppError::validation("Step instruction is required"));
            }
        }
        if self.duration_seconds.is_some_and(|d| d < 0) {
            return Err(AppError::validation("Step duration cannot be negative"));
        }
        Ok(())
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with_some("step_number", self.step_number)
            .with_some("instruction", self.instruction.as_deref().map(str::trim))
            .with_some("duration_seconds", self.duration_seconds)
            .with_some("technique", self.technique.clone())
            .with_some("tips", self.tips.clone())
            .with_some("is_critical", self.is_critical)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub description: Option<String>,
    pub unit_type: String,
    pub alcohol_content: Option<f64>,
    pub ingredient_type: Option<String>,
}

impl NewIngredient {
    pub fn validate(&self) -> Result<()> {
        validate_name("Ingredient name", &self.name)?;
        if let Some(abv) = self.alcohol_content {
            validate_alcohol_content(abv)?;
        }
        Ok(())
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", self.name.trim())
            .with("description", self.description.clone())
            .with("unit_type", self.unit_type.trim())
            .with("alcohol_content", self.alcohol_content)
            .with("ingredient_type", self.ingredient_type.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    /// None creates a category visible to everyone
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub user_id: Option<i64>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_system: bool,
    pub cocktail_id: Option<i64>,
}

/// Filters for listing a user's notifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
    pub notification_type: Option<NotificationType>,
    pub limit: Option<i64>,
}

/// One ingredient line of a composite creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientEntry {
    /// Resolved (or created) by exact name
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    /// Defaults to the entry's position
    pub order_index: Option<i64>,
    /// Unit type for ingredients created by this entry; defaults to `unit`
    pub unit_type: Option<String>,
}

impl IngredientEntry {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
            ..Self::default()
        }
    }
}

/// One step of a composite creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepEntry {
    /// Defaults to position + 1
    pub step_number: Option<i64>,
    pub instruction: String,
    pub duration_seconds: Option<i64>,
    pub technique: Option<String>,
    pub tips: Option<String>,
    #[serde(default)]
    pub is_critical: bool,
}

impl StepEntry {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            ..Self::default()
        }
    }
}

/// Nested payload for creating a cocktail with everything attached
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCocktailRequest {
    #[serde(flatten)]
    pub cocktail: NewCocktail,
    #[serde(default)]
    pub recipe: NewRecipe,
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    /// Primary category
    pub category_id: Option<i64>,
    #[serde(default)]
    pub additional_categories: Vec<i64>,
    #[serde(default)]
    pub categories: Vec<i64>,
}

impl CreateCocktailRequest {
    /// Check the whole payload before anything is written
    pub fn validate(&self) -> Result<()> {
        self.cocktail.validate()?;

        let mut seen = std::collections::HashSet::new();
        for (position, entry) in self.ingredients.iter().enumerate() {
            validate_name("Ingredient name", &entry.name)?;
            validate_quantity(entry.quantity)?;
            if entry.unit.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Ingredient '{}' needs a unit",
                    entry.name.trim()
                )));
            }
            if entry.order_index.is_some_and(|i| i < 0) {
                return Err(AppError::validation("Order index cannot be negative"));
            }
            if !seen.insert(entry.name.trim().to_lowercase()) {
                return Err(AppError::validation(format!(
                    "Ingredient '{}' is listed more than once (entry {})",
                    entry.name.trim(),
                    position + 1
                )));
            }
        }

        let mut numbers = Vec::with_capacity(self.steps.len());
        for (position, step) in self.steps.iter().enumerate() {
            let number = step.step_number.unwrap_or(position as i64 + 1);
            validate_step(number, &step.instruction, step.duration_seconds)?;
            numbers.push(number);
        }

        // Given and defaulted numbers together must be exactly 1..=n
        numbers.sort_unstable();
        if numbers.iter().copied().ne(1..=numbers.len() as i64) {
            return Err(AppError::validation(
                "Step numbers must run 1..n without gaps or repeats",
            ));
        }

        Ok(())
    }

    /// Union of primary, additional and general categories, first occurrence wins
    pub fn category_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        let all = self
            .category_id
            .iter()
            .chain(self.additional_categories.iter())
            .chain(self.categories.iter());
        for id in all {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

// ===== Validation helpers =====

fn validate_name(label: &str, name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", label)));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            label, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::validation(format!(
            "Quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

fn validate_alcohol_content(abv: f64) -> Result<()> {
    if !(0.0..=MAX_ALCOHOL_CONTENT).contains(&abv) {
        return Err(AppError::validation(format!(
            "Alcohol content must be between 0 and {}",
            MAX_ALCOHOL_CONTENT
        )));
    }
    Ok(())
}

fn validate_cocktail_numbers(
    preparation_time: Option<i64>,
    alcohol_content: Option<f64>,
    servings: Option<i64>,
) -> Result<()> {
    if preparation_time.is_some_and(|t| t <= 0) {
        return Err(AppError::validation("Preparation time must be positive"));
    }
    if let Some(abv) = alcohol_content {
        validate_alcohol_content(abv)?;
    }
    if servings.is_some_and(|s| s < 0) {
        return Err(AppError::validation("Servings cannot be negative"));
    }
    Ok(())
}

fn validate_step(step_number: i64, instruction: &str, duration_seconds: Option<i64>) -> Result<()> {
    if step_number < 1 {
        return Err(AppError::validation("Step number must start at 1"));
    }
    if instruction.trim().is_empty() {
        return Err(AppError::validation(format!(
            "Step {} has no instruction",
            step_number
        )));
    }
    if duration_seconds.is_some_and(|d| d < 0) {
        return Err(AppError::validation("Step duration cannot be negative"));
    }
    Ok(())
}
