//! Ingredient repository
//!
//! `create_if_not_exists` is the single entry point writers use to turn an
//! ingredient name into an id without creating duplicate rows.

use crate::config::DEFAULT_INGREDIENT_UNIT;
use crate::database::models::{Ingredient, NewIngredient};
use crate::database::record::{RecordStore, Table};
use crate::database::shaping::escape_like;
use crate::error::{AppError, Result};
use sqlx::{SqliteConnection, SqlitePool};

pub struct IngredientsTable;

impl Table for IngredientsTable {
    const NAME: &'static str = "ingredients";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "unit_type",
        "alcohol_content",
        "ingredient_type",
    ];
    type Row = Ingredient;
}

#[derive(Clone)]
pub struct IngredientRepository {
    records: RecordStore<IngredientsTable>,
}

impl IngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool),
        }
    }

    pub fn records(&self) -> &RecordStore<IngredientsTable> {
        &self.records
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Ingredient>> {
        self.records.find_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Ingredient>> {
        self.records.find_all().await
    }

    /// Exact name lookup
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(self.records.pool())
            .await?;

        Ok(ingredient)
    }

    /// Case-insensitive substring match on name
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Ingredient>> {
        let pattern = format!("%{}%", escape_like(term.trim()));

        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT * FROM ingredients
            WHERE name LIKE ? ESCAPE '\'
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(self.records.pool())
        .await?;

        Ok(ingredients)
    }

    pub async fn find_by_type(&self, ingredient_type: &str) -> Result<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE ingredient_type = ? ORDER BY name COLLATE NOCASE ASC",
        )
        .bind(ingredient_type)
        .fetch_all(self.records.pool())
        .await?;

        Ok(ingredients)
    }

    pub async fn create(&self, req: NewIngredient) -> Result<i64> {
        req.validate()?;
        self.records.create(&req.to_fields()).await
    }

    /// Resolve an ingredient by exact name, creating it with `unit_type` if absent
    pub async fn create_if_not_exists(&self, name: &str, unit_type: &str) -> Result<i64> {
        let mut conn = self.records.pool().acquire().await?;
        Self::resolve_with(&mut conn, name, unit_type).await
    }

    /// Same as [`Self::create_if_not_exists`] on a caller-held connection or transaction
    pub(crate) async fn resolve_with(
        conn: &mut SqliteConnection,
        name: &str,
        unit_type: &str,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Ingredient name is required"));
        }

        if let Some(id) = Self::id_by_name(conn, name).await? {
            return Ok(id);
        }

        let unit_type = match unit_type.trim() {
            "" => DEFAULT_INGREDIENT_UNIT,
            unit => unit,
        };

        sqlx::query("INSERT INTO ingredients (name, unit_type) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .bind(unit_type)
            .execute(&mut *conn)
            .await?;

        let id = Self::id_by_name(conn, name)
            .await?
            .ok_or_else(|| AppError::Generic(format!("Ingredient '{}' could not be resolved", name)))?;

        tracing::debug!("Created ingredient '{}' with id {}", name, id);
        Ok(id)
    }

    async fn id_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM ingredients WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(id)
    }

    /// Number of recipes using an ingredient
    pub async fn list_usage(&self, ingredient_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT recipe_id) FROM recipe_ingredients WHERE ingredient_id = ?",
        )
        .bind(ingredient_id)
        .fetch_one(self.records.pool())
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateCocktailRequest, IngredientEntry, NewCocktail};
    use crate::database::repository::CocktailRepository;
    use crate::database::testing::memory_pool;

    #[tokio::test]
    async fn test_create_if_not_exists_is_idempotent() {
        let repo = IngredientRepository::new(memory_pool().await);

        let first = repo.create_if_not_exists("Ron blanco", "ml").await.unwrap();
        let second = repo.create_if_not_exists("Ron blanco", "oz").await.unwrap();
        assert_eq!(first, second);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE name = 'Ron blanco'")
            .fetch_one(repo.records().pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        // Unit of the first creation wins
        let ingredient = repo.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(ingredient.unit_type, "ml");
    }

    #[tokio::test]
    async fn test_create_if_not_exists_trims_and_rejects_empty() {
        let repo = IngredientRepository::new(memory_pool().await);

        let a = repo.create_if_not_exists("  Azúcar ", "g").await.unwrap();
        let b = repo.create_if_not_exists("Azúcar", "g").await.unwrap();
        assert_eq!(a, b);

        let err = repo.create_if_not_exists("   ", "g").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_and_search() {
        let repo = IngredientRepository::new(memory_pool().await);

        repo.create(NewIngredient {
            name: "Zumo de lima".to_string(),
            unit_type: "ml".to_string(),
            ingredient_type: Some("citrus".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create_if_not_exists("Lima", "unidad").await.unwrap();
        repo.create_if_not_exists("Menta", "hojas").await.unwrap();

        assert!(repo.find_by_name("Zumo de lima").await.unwrap().is_some());
        assert!(repo.find_by_name("zumo").await.unwrap().is_none());

        let names: Vec<String> = repo
            .search_by_name("LIMA")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Lima", "Zumo de lima"]);

        let citrus = repo.find_by_type("citrus").await.unwrap();
        assert_eq!(citrus.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_storage_error() {
        let repo = IngredientRepository::new(memory_pool().await);

        let req = NewIngredient {
            name: "Hielo".to_string(),
            unit_type: "g".to_string(),
            ..Default::default()
        };
        repo.create(req.clone()).await.unwrap();

        let err = repo.create(req).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_usage_and_default_unit() {
        let pool = memory_pool().await;
        let repo = IngredientRepository::new(pool.clone());
        let cocktails = CocktailRepository::new(pool);

        let req = |name: &str| CreateCocktailRequest {
            cocktail: NewCocktail::named(name),
            ingredients: vec![IngredientEntry::new("Ginebra", 45.0, "ml")],
            ..Default::default()
        };
        cocktails.create_complete(&req("Gin tonic")).await.unwrap();
        cocktails.create_complete(&req("Martini")).await.unwrap();

        let gin = repo.find_by_name("Ginebra").await.unwrap().unwrap();
        assert_eq!(repo.list_usage(gin.id).await.unwrap(), 2);

        let bitters = repo.create_if_not_exists("Angostura", " ").await.unwrap();
        assert_eq!(repo.list_usage(bitters).await.unwrap(), 0);
        assert_eq!(
            repo.find_by_id(bitters).await.unwrap().unwrap().unit_type,
            DEFAULT_INGREDIENT_UNIT
        );
    }
}
