//! Catalog service
//!
//! The operation surface handed to the UI layer. Coordinates the
//! repositories and owns the small pieces of policy that span more
//! than one of them.

use crate::config::DEMO_USER_ID;
use crate::database::{
    CocktailComplete, CocktailStatistics, CocktailSummary, CreateCocktailRequest, Difficulty,
    NewNotification, Notification, NotificationFilter, NotificationType, Recipe, RecipeComplexity,
    RecipeIngredient, RecipeStep, Repositories, ToggleOutcome,
};
use crate::error::Result;
use serde::Serialize;

/// A recipe with the cocktail-level details needed to prepare it
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecipe {
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub difficulty: Difficulty,
    pub total_duration_seconds: i64,
    pub complexity: RecipeComplexity,
}

#[derive(Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub async fn list_cocktails(&self) -> Result<Vec<CocktailSummary>> {
        self.repos.cocktails.list_with_summary().await
    }

    /// Absent cocktails are `None`, not an error
    pub async fn get_cocktail(&self, id: i64) -> Result<Option<CocktailComplete>> {
        self.repos.cocktails.get_complete(id).await
    }

    pub async fn search_cocktails(&self, term: &str) -> Result<Vec<CocktailSummary>> {
        self.repos.cocktails.search_by_name(term).await
    }

    /// Create a cocktail with its recipe and post an achievement to its creator
    pub async fn create_cocktail(&self, mut req: CreateCocktailRequest) -> Result<i64> {
        let creator = *req.cocktail.created_by.get_or_insert(DEMO_USER_ID);

        let id = self.repos.cocktails.create_complete(&req).await?;

        let notice = NewNotification {
            user_id: Some(creator),
            notification_type: NotificationType::Achievement,
            title: "Cóctel creado".to_string(),
            message: format!("'{}' ya forma parte del catálogo", req.cocktail.name.trim()),
            is_system: false,
            cocktail_id: Some(id),
        };

        // The cocktail is committed; a failed notice must not undo that
        if let Err(e) = self.repos.notifications.create_notification(&notice).await {
            tracing::warn!("Failed to post creation notice for cocktail {}: {}", id, e);
        }

        Ok(id)
    }

    pub async fn get_statistics(&self) -> Result<CocktailStatistics> {
        self.repos.cocktails.get_statistics().await
    }

    pub async fn is_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<bool> {
        self.repos.favorites.is_favorite(user_id, cocktail_id).await
    }

    pub async fn toggle_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<ToggleOutcome> {
        let outcome = self
            .repos
            .favorites
            .toggle_favorite(user_id, cocktail_id)
            .await?;

        tracing::debug!(
            "Favorite toggled for user {} on cocktail {}: {:?}",
            user_id,
            cocktail_id,
            outcome
        );
        Ok(outcome)
    }

    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<CocktailSummary>> {
        self.repos.favorites.list_for_user(user_id).await
    }

    /// Recipe of a cocktail with difficulty, total duration and complexity
    pub async fn get_complete_recipe(&self, cocktail_id: i64) -> Result<Option<EnrichedRecipe>> {
        let Some(recipe) = self.repos.recipes.find_by_cocktail_id(cocktail_id).await? else {
            return Ok(None);
        };
        let Some(difficulty) = self.repos.cocktails.get_difficulty(cocktail_id).await? else {
            return Ok(None);
        };

        let ingredients = self.repos.recipes.get_ingredients(recipe.id).await?;
        let steps = self.repos.recipes.get_steps(recipe.id).await?;
        let total_duration_seconds = self.repos.cocktails.get_total_duration(cocktail_id).await?;
        let Some(complexity) = self.repos.recipes.get_recipe_complexity(recipe.id).await? else {
            return Ok(None);
        };

        Ok(Some(EnrichedRecipe {
            recipe,
            ingredients,
            steps,
            difficulty,
            total_duration_seconds,
            complexity,
        }))
    }

    pub async fn list_notifications(
        &self,
        user_id: i64,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>> {
        self.repos.notifications.find_by_user_id(user_id, filter).await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<bool> {
        self.repos.notifications.mark_as_read(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{memory_pool, sample_pool};
    use crate::database::{ComplexityLevel, IngredientEntry, NewCocktail, StepEntry};
    use crate::error::AppError;

    async fn create_test_service() -> CatalogService {
        CatalogService::new(Repositories::new(memory_pool().await))
    }

    fn negroni() -> CreateCocktailRequest {
        CreateCocktailRequest {
            cocktail: NewCocktail {
                difficulty: Difficulty::Medium,
                preparation_time: Some(3),
                ..NewCocktail::named("Negroni")
            },
            ingredients: vec![
                IngredientEntry::new("Ginebra", 30.0, "ml"),
                IngredientEntry::new("Campari", 30.0, "ml"),
                IngredientEntry::new("Vermut rojo", 30.0, "ml"),
            ],
            steps: vec![
                StepEntry {
                    duration_seconds: Some(30),
                    ..StepEntry::new("Remover con hielo")
                },
                StepEntry {
                    duration_seconds: Some(10),
                    ..StepEntry::new("Servir sobre hielo con piel de naranja")
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_cocktail() {
        let service = create_test_service().await;

        let id = service.create_cocktail(negroni()).await.unwrap();
        let cocktail = service.get_cocktail(id).await.unwrap().unwrap();

        assert_eq!(cocktail.cocktail.name, "Negroni");
        assert_eq!(cocktail.cocktail.created_by, Some(DEMO_USER_ID));
        assert_eq!(cocktail.ingredients.len(), 3);
        assert_eq!(cocktail.steps.len(), 2);

        assert!(service.get_cocktail(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_posts_achievement() {
        let service = create_test_service().await;

        let id = service.create_cocktail(negroni()).await.unwrap();
        let notices = service
            .list_notifications(DEMO_USER_ID, &NotificationFilter::default())
            .await
            .unwrap();

        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].notification_type, NotificationType::Achievement);
        assert_eq!(notices[0].cocktail_id, Some(id));

        assert!(service.mark_notification_read(notices[0].id).await.unwrap());
        let unread = service
            .list_notifications(
                DEMO_USER_ID,
                &NotificationFilter {
                    unread_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_posts_nothing() {
        let service = create_test_service().await;

        let mut req = negroni();
        req.cocktail.name = "   ".to_string();
        let err = service.create_cocktail(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let notices = service
            .list_notifications(DEMO_USER_ID, &NotificationFilter::default())
            .await
            .unwrap();
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_get_complete_recipe() {
        let service = create_test_service().await;
        let id = service.create_cocktail(negroni()).await.unwrap();

        let enriched = service.get_complete_recipe(id).await.unwrap().unwrap();
        assert_eq!(enriched.difficulty, Difficulty::Medium);
        assert_eq!(enriched.total_duration_seconds, 40);
        assert_eq!(enriched.ingredients.len(), 3);
        assert_eq!(enriched.steps[0].instruction, "Remover con hielo");
        assert_eq!(enriched.complexity.ingredient_count, 3);
        assert_eq!(enriched.complexity.step_count, 2);
        assert_eq!(enriched.complexity.level, ComplexityLevel::Simple);

        assert!(service.get_complete_recipe(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_favorites_round_trip() {
        let service = create_test_service().await;
        let id = service.create_cocktail(negroni()).await.unwrap();

        assert!(!service.is_favorite(DEMO_USER_ID, id).await.unwrap());
        assert_eq!(
            service.toggle_favorite(DEMO_USER_ID, id).await.unwrap(),
            ToggleOutcome::Added
        );
        assert!(service.is_favorite(DEMO_USER_ID, id).await.unwrap());
        assert_eq!(service.list_favorites(DEMO_USER_ID).await.unwrap().len(), 1);

        assert_eq!(
            service.toggle_favorite(DEMO_USER_ID, id).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert!(service.list_favorites(DEMO_USER_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_search_and_statistics_over_samples() {
        let service = CatalogService::new(Repositories::new(sample_pool().await));

        let listed = service.list_cocktails().await.unwrap();
        assert_eq!(listed.len(), 4);
        let mojito = listed.iter().find(|c| c.name == "Mojito").unwrap();
        assert_eq!(mojito.categories.len(), 1);
        assert_eq!(mojito.categories[0].name, "Clásicos");

        let found = service.search_cocktails("mar").await.unwrap();
        assert_eq!(found[0].name, "Margarita");

        let stats = service.get_statistics().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.alcoholic, 3);
        assert_eq!(stats.non_alcoholic, 1);
        assert_eq!(stats.featured, 1);
    }
}
