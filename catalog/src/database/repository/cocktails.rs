//! Cocktail repository
//!
//! Summary listings, filters, search, statistics, category links and the
//! complete cocktail projection. Composite creation lives in `composite.rs`.

use super::recipes::{fetch_ingredients, fetch_steps, RecipeRepository};
use crate::database::models::{
    Category, Cocktail, CocktailComplete, CocktailStatistics, CocktailSummary, Difficulty,
    NewCocktail, UpdateCocktailRequest,
};
use crate::database::record::{RecordStore, Table};
use crate::database::shaping::{escape_like, parse_json_array, split_concat};
use crate::error::Result;
use sqlx::{FromRow, SqlitePool};

pub struct CocktailsTable;

impl Table for CocktailsTable {
    const NAME: &'static str = "cocktails";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "difficulty",
        "preparation_time",
        "alcohol_content",
        "servings",
        "image_url",
        "is_alcoholic",
        "is_featured",
        "created_by",
        "pairing_id",
        "created_at",
        "updated_at",
    ];
    type Row = Cocktail;
}

/// Summary projection with categories aggregated into a JSON array
const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, c.difficulty, c.preparation_time,
           c.alcohol_content, c.image_url, c.is_alcoholic, c.is_featured, c.created_by,
           CASE WHEN COUNT(cat.id) = 0 THEN '[]'
                ELSE json_group_array(json_object('id', cat.id, 'name', cat.name, 'color', cat.color))
           END AS categories_json
    FROM cocktails c
    LEFT JOIN cocktail_categories cc ON cc.cocktail_id = c.id
    LEFT JOIN categories cat ON cat.id = cc.category_id
"#;

const DEFAULT_ORDER: &str = "ORDER BY c.name COLLATE NOCASE ASC, c.id ASC";

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    description: Option<String>,
    difficulty: Difficulty,
    preparation_time: Option<i64>,
    alcohol_content: Option<f64>,
    image_url: Option<String>,
    is_alcoholic: bool,
    is_featured: bool,
    created_by: Option<i64>,
    categories_json: Option<String>,
}

impl SummaryRow {
    fn into_summary(self) -> Result<CocktailSummary> {
        Ok(CocktailSummary {
            categories: parse_json_array(self.categories_json.as_deref())?,
            id: self.id,
            name: self.name,
            description: self.description,
            difficulty: self.difficulty,
            preparation_time: self.preparation_time,
            alcohol_content: self.alcohol_content,
            image_url: self.image_url,
            is_alcoholic: self.is_alcoholic,
            is_featured: self.is_featured,
            created_by: self.created_by,
        })
    }
}

/// Which cocktails a summary listing contains
#[derive(Debug, Clone, Copy)]
pub(crate) enum SummaryFilter<'a> {
    All,
    Difficulty(Difficulty),
    Category(i64),
    Creator(i64),
    Alcoholic(bool),
    Featured,
    FavoritedBy(i64),
    /// Name or description contains the term; prefix matches on name first
    Search(&'a str),
}

/// Run the summary projection with a filter
pub(crate) async fn fetch_summaries(
    pool: &SqlitePool,
    filter: SummaryFilter<'_>,
) -> Result<Vec<CocktailSummary>> {
    let (clause, order) = match filter {
        SummaryFilter::All => ("", DEFAULT_ORDER),
        SummaryFilter::Difficulty(_) => ("WHERE c.difficulty = ?", DEFAULT_ORDER),
        SummaryFilter::Category(_) => (
            "WHERE c.id IN (SELECT cocktail_id FROM cocktail_categories WHERE category_id = ?)",
            DEFAULT_ORDER,
        ),
        SummaryFilter::Creator(_) => ("WHERE c.created_by = ?", DEFAULT_ORDER),
        SummaryFilter::Alcoholic(_) => ("WHERE c.is_alcoholic = ?", DEFAULT_ORDER),
        SummaryFilter::Featured => ("WHERE c.is_featured = 1", DEFAULT_ORDER),
        SummaryFilter::FavoritedBy(_) => (
            "WHERE c.id IN (SELECT cocktail_id FROM favorites WHERE user_id = ?)",
            DEFAULT_ORDER,
        ),
        SummaryFilter::Search(_) => (
            r"WHERE (c.name LIKE ? ESCAPE '\' OR c.description LIKE ? ESCAPE '\')",
            r"ORDER BY CASE WHEN c.name LIKE ? ESCAPE '\' THEN 0 ELSE 1 END, c.name COLLATE NOCASE ASC, c.id ASC",
        ),
    };

    let sql = format!("{} {} GROUP BY c.id {}", SUMMARY_SELECT, clause, order);
    let query = sqlx::query_as::<_, SummaryRow>(&sql);

    let query = match filter {
        SummaryFilter::All | SummaryFilter::Featured => query,
        SummaryFilter::Difficulty(difficulty) => query.bind(difficulty.as_str()),
        SummaryFilter::Category(id) | SummaryFilter::Creator(id) | SummaryFilter::FavoritedBy(id) => {
            query.bind(id)
        }
        SummaryFilter::Alcoholic(flag) => query.bind(flag),
        SummaryFilter::Search(term) => {
            let escaped = escape_like(term);
            query
                .bind(format!("%{}%", escaped))
                .bind(format!("%{}%", escaped))
                .bind(format!("{}%", escaped))
        }
    };

    let rows = query.fetch_all(pool).await?;

    rows.into_iter().map(SummaryRow::into_summary).collect()
}

#[derive(Clone)]
pub struct CocktailRepository {
    records: RecordStore<CocktailsTable>,
    recipes: RecipeRepository,
}

impl CocktailRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool.clone()),
            recipes: RecipeRepository::new(pool),
        }
    }

    pub fn records(&self) -> &RecordStore<CocktailsTable> {
        &self.records
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        self.records.pool()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Cocktail>> {
        self.records.find_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Cocktail>> {
        self.records.find_all().await
    }

    pub async fn count(&self) -> Result<i64> {
        self.records.count().await
    }

    /// Create a bare cocktail row
    pub async fn create(&self, req: NewCocktail) -> Result<i64> {
        req.validate()?;

        let id = self.records.create(&req.to_fields()).await?;

        tracing::debug!("Created cocktail: {}", id);
        Ok(id)
    }

    pub async fn update(&self, id: i64, req: UpdateCocktailRequest) -> Result<bool> {
        req.validate()?;
        self.records.update(id, &req.to_fields()).await
    }

    /// Delete a cocktail; its recipe, lines, steps, links and favorites cascade
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.records.delete(id).await
    }

    /// One row per cocktail with aggregated categories
    pub async fn list_with_summary(&self) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::All).await
    }

    /// Full projection with recipe, ordered ingredients and ordered steps
    pub async fn get_complete(&self, id: i64) -> Result<Option<CocktailComplete>> {
        let Some(cocktail) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let recipe = self.recipes.find_by_cocktail_id(id).await?;

        let (ingredients, steps) = match &recipe {
            Some(recipe) => (
                fetch_ingredients(self.pool(), recipe.id).await?,
                fetch_steps(self.pool(), recipe.id).await?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        let names: Option<String> = sqlx::query_scalar(
            r#"
            SELECT GROUP_CONCAT(name, char(31)) FROM (
                SELECT cat.name FROM cocktail_categories cc
                JOIN categories cat ON cat.id = cc.category_id
                WHERE cc.cocktail_id = ?
                ORDER BY cat.name
            )
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(Some(CocktailComplete {
            cocktail,
            recipe,
            ingredients,
            steps,
            category_names: split_concat(names.as_deref()),
        }))
    }

    /// Substring search on name or description, prefix matches first.
    /// A blank term lists everything.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<CocktailSummary>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_with_summary().await;
        }

        fetch_summaries(self.pool(), SummaryFilter::Search(term)).await
    }

    pub async fn find_by_difficulty(&self, difficulty: Difficulty) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Difficulty(difficulty)).await
    }

    pub async fn find_by_category(&self, category_id: i64) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Category(category_id)).await
    }

    pub async fn find_by_creator(&self, user_id: i64) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Creator(user_id)).await
    }

    /// Filter on the alcoholic flag
    pub async fn find_by_alcohol_content(&self, is_alcoholic: bool) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Alcoholic(is_alcoholic)).await
    }

    pub async fn find_featured(&self) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(self.pool(), SummaryFilter::Featured).await
    }

    pub async fn set_featured(&self, id: i64, featured: bool) -> Result<bool> {
        let req = UpdateCocktailRequest {
            is_featured: Some(featured),
            ..Default::default()
        };
        self.update(id, req).await
    }

    /// Aggregate counts and averages in one query
    pub async fn get_statistics(&self) -> Result<CocktailStatistics> {
        let stats = sqlx::query_as::<_, CocktailStatistics>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN is_alcoholic = 1 THEN 1 ELSE 0 END), 0) AS alcoholic,
                COALESCE(SUM(CASE WHEN is_alcoholic = 0 THEN 1 ELSE 0 END), 0) AS non_alcoholic,
                COALESCE(SUM(CASE WHEN is_featured = 1 THEN 1 ELSE 0 END), 0) AS featured,
                COALESCE(SUM(CASE WHEN difficulty = 'easy' THEN 1 ELSE 0 END), 0) AS easy,
                COALESCE(SUM(CASE WHEN difficulty = 'medium' THEN 1 ELSE 0 END), 0) AS medium,
                COALESCE(SUM(CASE WHEN difficulty = 'hard' THEN 1 ELSE 0 END), 0) AS hard,
                AVG(preparation_time) AS average_preparation_time,
                AVG(alcohol_content) AS average_alcohol_content
            FROM cocktails
            "#,
        )
        .fetch_one(self.pool())
        .await?;

        Ok(stats)
    }

    /// Link a cocktail to a category; returns false if already linked
    pub async fn add_to_category(&self, cocktail_id: i64, category_id: i64) -> Result<bool> {
        let rows = sqlx::query(
            "INSERT OR IGNORE INTO cocktail_categories (cocktail_id, category_id) VALUES (?, ?)",
        )
        .bind(cocktail_id)
        .bind(category_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    pub async fn remove_from_category(&self, cocktail_id: i64, category_id: i64) -> Result<bool> {
        let rows = sqlx::query(
            "DELETE FROM cocktail_categories WHERE cocktail_id = ? AND category_id = ?",
        )
        .bind(cocktail_id)
        .bind(category_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    pub async fn list_categories(&self, cocktail_id: i64) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT cat.* FROM categories cat
            JOIN cocktail_categories cc ON cc.category_id = cat.id
            WHERE cc.cocktail_id = ?
            ORDER BY cat.name COLLATE NOCASE ASC
            "#,
        )
        .bind(cocktail_id)
        .fetch_all(self.pool())
        .await?;

        Ok(categories)
    }

    pub async fn get_difficulty(&self, id: i64) -> Result<Option<Difficulty>> {
        let difficulty: Option<Difficulty> =
            sqlx::query_scalar("SELECT difficulty FROM cocktails WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(difficulty)
    }

    /// Sum of step durations in seconds; 0 when there are no timed steps
    pub async fn get_total_duration(&self, id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(s.duration_seconds), 0)
            FROM recipe_steps s
            JOIN recipes r ON r.id = s.recipe_id
            WHERE r.cocktail_id = ?
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::categories::CategoryRepository;
    use crate::database::testing::memory_pool;
    use crate::database::NewCategory;
    use crate::error::AppError;

    fn cocktail(name: &str, description: Option<&str>) -> NewCocktail {
        NewCocktail {
            description: description.map(str::to_string),
            ..NewCocktail::named(name)
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let repo = CocktailRepository::new(memory_pool().await);

        let id = repo.create(cocktail("Negroni", Some("Amargo"))).await.unwrap();
        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Negroni");
        assert_eq!(found.difficulty, Difficulty::Easy);
        assert!(found.is_alcoholic);

        let changed = repo
            .update(
                id,
                UpdateCocktailRequest {
                    difficulty: Some(Difficulty::Medium),
                    alcohol_content: Some(24.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(repo.get_difficulty(id).await.unwrap(), Some(Difficulty::Medium));

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.find_by_id(id).await.unwrap().is_none());
        assert!(repo.get_difficulty(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_validates_before_writing() {
        let repo = CocktailRepository::new(memory_pool().await);

        let err = repo.create(cocktail("  ", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_summary_aggregates_categories() {
        let pool = memory_pool().await;
        let repo = CocktailRepository::new(pool.clone());
        let categories = CategoryRepository::new(pool);

        let bitter = categories
            .create_category(NewCategory {
                name: "Amargos".to_string(),
                color: Some("#B91C1C".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let classic = categories.find_system_categories().await.unwrap()[0].id;

        let negroni = repo.create(cocktail("Negroni", None)).await.unwrap();
        let bare = repo.create(cocktail("Agua de Valencia", None)).await.unwrap();
        assert!(repo.add_to_category(negroni, bitter).await.unwrap());
        assert!(repo.add_to_category(negroni, classic).await.unwrap());
        // Second insert is ignored
        assert!(!repo.add_to_category(negroni, bitter).await.unwrap());

        let list = repo.list_with_summary().await.unwrap();
        assert_eq!(list.len(), 2);

        let agua = list.iter().find(|c| c.id == bare).unwrap();
        assert!(agua.categories.is_empty());

        let negroni_row = list.iter().find(|c| c.id == negroni).unwrap();
        assert_eq!(negroni_row.categories.len(), 2);
        let tag = negroni_row.categories.iter().find(|t| t.id == bitter).unwrap();
        assert_eq!(tag.name, "Amargos");
        assert_eq!(tag.color, "#B91C1C");

        assert!(repo.remove_from_category(negroni, bitter).await.unwrap());
        assert!(!repo.remove_from_category(negroni, bitter).await.unwrap());
        assert_eq!(repo.list_categories(negroni).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_prefix_matches_first() {
        let repo = CocktailRepository::new(memory_pool().await);

        repo.create(cocktail("Virgin Mojito", None)).await.unwrap();
        repo.create(cocktail("Mojito Clásico", None)).await.unwrap();
        repo.create(cocktail("Agua fresca", Some("Inspirado en el mojito"))).await.unwrap();
        repo.create(cocktail("Margarita", None)).await.unwrap();

        let names: Vec<String> = repo
            .search_by_name("mojito")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        // "Mojito Clásico" sorts after "Agua fresca" alphabetically but is the only prefix match
        assert_eq!(names, vec!["Mojito Clásico", "Agua fresca", "Virgin Mojito"]);
    }

    #[tokio::test]
    async fn test_search_blank_term_lists_all_and_wildcards_are_literal() {
        let repo = CocktailRepository::new(memory_pool().await);

        repo.create(cocktail("Piña 100%", None)).await.unwrap();
        repo.create(cocktail("Piña Colada", None)).await.unwrap();

        assert_eq!(repo.search_by_name("  ").await.unwrap().len(), 2);

        let hits = repo.search_by_name("100%").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Piña 100%");

        assert!(repo.search_by_name("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters() {
        let repo = CocktailRepository::new(memory_pool().await);

        let hard = repo
            .create(NewCocktail {
                difficulty: Difficulty::Hard,
                created_by: Some(1),
                ..NewCocktail::named("Ramos Gin Fizz")
            })
            .await
            .unwrap();
        let soft = repo
            .create(NewCocktail {
                is_alcoholic: false,
                ..NewCocktail::named("Shirley Temple")
            })
            .await
            .unwrap();
        repo.set_featured(soft, true).await.unwrap();

        let by_difficulty = repo.find_by_difficulty(Difficulty::Hard).await.unwrap();
        assert_eq!(by_difficulty.len(), 1);
        assert_eq!(by_difficulty[0].id, hard);

        let by_creator = repo.find_by_creator(1).await.unwrap();
        assert_eq!(by_creator.len(), 1);
        assert_eq!(by_creator[0].id, hard);

        let virgin = repo.find_by_alcohol_content(false).await.unwrap();
        assert_eq!(virgin.len(), 1);
        assert_eq!(virgin[0].id, soft);

        let featured = repo.find_featured().await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, soft);
    }

    #[tokio::test]
    async fn test_statistics() {
        let repo = CocktailRepository::new(memory_pool().await);

        let empty = repo.get_statistics().await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.alcoholic, 0);
        assert_eq!(empty.average_preparation_time, None);

        for (name, alcoholic, minutes, difficulty) in [
            ("Mojito", true, 5, Difficulty::Easy),
            ("Margarita", true, 10, Difficulty::Medium),
            ("Limonada", false, 15, Difficulty::Easy),
            ("Zombie", true, 30, Difficulty::Hard),
        ] {
            repo.create(NewCocktail {
                is_alcoholic: alcoholic,
                preparation_time: Some(minutes),
                difficulty,
                ..NewCocktail::named(name)
            })
            .await
            .unwrap();
        }

        let stats = repo.get_statistics().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.alcoholic, 3);
        assert_eq!(stats.non_alcoholic, 1);
        assert_eq!((stats.easy, stats.medium, stats.hard), (2, 1, 1));
        assert_eq!(stats.average_preparation_time, Some(15.0));
        assert_eq!(stats.average_alcohol_content, None);
    }

    #[tokio::test]
    async fn test_get_complete_missing_is_none() {
        let repo = CocktailRepository::new(memory_pool().await);
        assert!(repo.get_complete(777).await.unwrap().is_none());
        assert_eq!(repo.get_total_duration(777).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_complete_without_recipe() {
        let repo = CocktailRepository::new(memory_pool().await);
        let id = repo.create(cocktail("Solo", None)).await.unwrap();

        let complete = repo.get_complete(id).await.unwrap().unwrap();
        assert_eq!(complete.cocktail.name, "Solo");
        assert!(complete.recipe.is_none());
        assert!(complete.ingredients.is_empty());
        assert!(complete.steps.is_empty());
        assert!(complete.category_names.is_empty());
    }
}
