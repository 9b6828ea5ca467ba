//! Category repository

use super::cocktails::{fetch_summaries, SummaryFilter};
use crate::config::DEFAULT_CATEGORY_COLOR;
use crate::database::models::{Category, CocktailSummary, NewCategory};
use crate::database::record::{Fields, RecordStore, Table};
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

pub struct CategoriesTable;

impl Table for CategoriesTable {
    const NAME: &'static str = "categories";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "color", "is_system", "user_id"];
    type Row = Category;
}

#[derive(Clone)]
pub struct CategoryRepository {
    records: RecordStore<CategoriesTable>,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool),
        }
    }

    fn pool(&self) -> &SqlitePool {
        self.records.pool()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        self.records.find_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Category>> {
        self.records.find_all().await
    }

    /// Built-in categories, in creation order
    pub async fn find_system_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_system = 1 ORDER BY id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(categories)
    }

    /// Non-system categories, optionally only those owned by `user_id`
    pub async fn find_user_categories(&self, user_id: Option<i64>) -> Result<Vec<Category>> {
        let categories = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, Category>(
                    "SELECT * FROM categories WHERE is_system = 0 AND user_id = ? ORDER BY name COLLATE NOCASE ASC",
                )
                .bind(user_id)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, Category>(
                    "SELECT * FROM categories WHERE is_system = 0 ORDER BY name COLLATE NOCASE ASC",
                )
                .fetch_all(self.pool())
                .await?
            }
        };

        Ok(categories)
    }

    /// Create a user category; color falls back to the neutral default
    pub async fn create_category(&self, req: NewCategory) -> Result<i64> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required"));
        }

        let color = req
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY_COLOR);

        let fields = Fields::new()
            .with("name", name)
            .with("description", req.description.clone())
            .with("color", color)
            .with("is_system", false)
            .with("user_id", req.user_id);

        let id = self.records.create(&fields).await?;

        tracing::debug!("Created category '{}': {}", name, id);
        Ok(id)
    }

    /// Delete a user category. System categories are refused.
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        match self.find_by_id(id).await? {
            None => Ok(false),
            Some(category) if category.is_system => Err(AppError::validation(format!(
                "System category '{}' cannot be deleted",
                category.name
            ))),
            Some(_) => self.records.delete(id).await,
        }
    }

    pub async fn get_cocktails(&self, category_id: i64) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Category(category_id)).await
    }

    pub async fn count_cocktails(&self, category_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cocktail_categories WHERE category_id = ?")
                .bind(category_id)
                .fetch_one(self.pool())
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEMO_USER_ID;
    use crate::database::models::NewCocktail;
    use crate::database::repository::cocktails::CocktailRepository;
    use crate::database::testing::memory_pool;

    #[tokio::test]
    async fn test_system_categories_are_seeded() {
        let repo = CategoryRepository::new(memory_pool().await);

        let system = repo.find_system_categories().await.unwrap();
        assert!(!system.is_empty());
        assert!(system.iter().all(|c| c.is_system && c.user_id.is_none()));
        assert!(repo.find_user_categories(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_category_with_default_color() {
        let repo = CategoryRepository::new(memory_pool().await);

        let id = repo
            .create_category(NewCategory {
                name: "Para el verano".to_string(),
                user_id: Some(DEMO_USER_ID),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.create_category(NewCategory {
            name: "Compartida".to_string(),
            color: Some("#10B981".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let category = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert!(!category.is_system);

        let mine = repo.find_user_categories(Some(DEMO_USER_ID)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);

        assert_eq!(repo.find_user_categories(None).await.unwrap().len(), 2);

        let err = repo.create_category(NewCategory::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_system_category_cannot_be_deleted() {
        let repo = CategoryRepository::new(memory_pool().await);
        let system = repo.find_system_categories().await.unwrap()[0].id;

        let err = repo.delete_category(system).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.find_by_id(system).await.unwrap().is_some());

        let own = repo
            .create_category(NewCategory {
                name: "Temporal".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(repo.delete_category(own).await.unwrap());
        assert!(!repo.delete_category(own).await.unwrap());
    }

    #[tokio::test]
    async fn test_cocktails_in_category() {
        let pool = memory_pool().await;
        let repo = CategoryRepository::new(pool.clone());
        let cocktails = CocktailRepository::new(pool);

        let category = repo.find_system_categories().await.unwrap()[0].id;
        let a = cocktails.create(NewCocktail::named("Old Fashioned")).await.unwrap();
        cocktails.create(NewCocktail::named("Sin categoría")).await.unwrap();
        cocktails.add_to_category(a, category).await.unwrap();

        assert_eq!(repo.count_cocktails(category).await.unwrap(), 1);

        let listed = repo.get_cocktails(category).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Old Fashioned");
        assert_eq!(listed[0].categories.len(), 1);
    }
}
