//! Favorite repository
//!
//! Favorites are a plain (user, cocktail) join table. Adding and removing
//! are idempotent; `toggle_favorite` reports what its own statement did,
//! retrying when a concurrent toggle got in between.

use super::cocktails::{fetch_summaries, SummaryFilter};
use crate::database::models::{CocktailSummary, Favorite, ToggleOutcome};
use crate::error::Result;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn is_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND cocktail_id = ?)",
        )
        .bind(user_id)
        .bind(cocktail_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Returns false when the pair was already a favorite
    pub async fn add_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<bool> {
        let rows = sqlx::query(
            "INSERT OR IGNORE INTO favorites (user_id, cocktail_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(cocktail_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::debug!("Favorite {}/{} added: {}", user_id, cocktail_id, rows > 0);
        Ok(rows > 0)
    }

    /// Returns false when there was nothing to remove
    pub async fn remove_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND cocktail_id = ?")
            .bind(user_id)
            .bind(cocktail_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Favorite {}/{} removed: {}", user_id, cocktail_id, rows > 0);
        Ok(rows > 0)
    }

    /// Flip the favorite state.
    ///
    /// The outcome comes from the row count of the statement that took
    /// effect, not from an earlier read. When a concurrent toggle inserts
    /// between our delete and our insert, the insert changes nothing and the
    /// delete is retried, so racing toggles never both report `Added`.
    pub async fn toggle_favorite(&self, user_id: i64, cocktail_id: i64) -> Result<ToggleOutcome> {
        loop {
            if self.remove_favorite(user_id, cocktail_id).await? {
                return Ok(ToggleOutcome::Removed);
            }
            if self.add_favorite(user_id, cocktail_id).await? {
                return Ok(ToggleOutcome::Added);
            }
            tracing::debug!(
                "Favorite {}/{} changed under a toggle, retrying",
                user_id,
                cocktail_id
            );
        }
    }

    pub async fn find_for_user(&self, user_id: i64) -> Result<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites WHERE user_id = ? ORDER BY created_at DESC, cocktail_id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    /// Favorited cocktails as summaries
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<CocktailSummary>> {
        fetch_summaries(&self.pool, SummaryFilter::FavoritedBy(user_id)).await
    }

    pub async fn count_for_cocktail(&self, cocktail_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE cocktail_id = ?")
            .bind(cocktail_id)
            .fetch_one(&self.pool)
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

    async fn setup() -> (FavoriteRepository, CocktailRepository, i64) {
        let pool = memory_pool().await;
        let cocktails = CocktailRepository::new(pool.clone());
        let id = cocktails.create(NewCocktail::named("Cosmopolitan")).await.unwrap();
        (FavoriteRepository::new(pool), cocktails, id)
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (favorites, _, cocktail) = setup().await;

        assert!(favorites.add_favorite(DEMO_USER_ID, cocktail).await.unwrap());
        assert!(!favorites.add_favorite(DEMO_USER_ID, cocktail).await.unwrap());

        assert_eq!(favorites.count_for_cocktail(cocktail).await.unwrap(), 1);
        assert!(favorites.is_favorite(DEMO_USER_ID, cocktail).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_is_no_change() {
        let (favorites, _, cocktail) = setup().await;

        assert!(!favorites.remove_favorite(DEMO_USER_ID, cocktail).await.unwrap());
        assert!(!favorites.is_favorite(DEMO_USER_ID, cocktail).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle() {
        let (favorites, _, cocktail) = setup().await;

        assert_eq!(
            favorites.toggle_favorite(DEMO_USER_ID, cocktail).await.unwrap(),
            ToggleOutcome::Added
        );
        assert!(favorites.is_favorite(DEMO_USER_ID, cocktail).await.unwrap());

        assert_eq!(
            favorites.toggle_favorite(DEMO_USER_ID, cocktail).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert!(!favorites.is_favorite(DEMO_USER_ID, cocktail).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_leave_consistent_state() {
        let (favorites, _, cocktail) = setup().await;

        for _ in 0..20 {
            let before = favorites.count_for_cocktail(cocktail).await.unwrap();

            let (a, b) = tokio::join!(
                favorites.toggle_favorite(DEMO_USER_ID, cocktail),
                favorites.toggle_favorite(DEMO_USER_ID, cocktail)
            );
            let outcomes = [a.unwrap(), b.unwrap()];
            assert_ne!(outcomes, [ToggleOutcome::Added, ToggleOutcome::Added]);
            assert_ne!(outcomes, [ToggleOutcome::Removed, ToggleOutcome::Removed]);

            // Each reported outcome is one effective change
            let added = outcomes.iter().filter(|o| o.is_favorite()).count() as i64;
            let removed = outcomes.len() as i64 - added;
            let rows = favorites.count_for_cocktail(cocktail).await.unwrap();
            assert_eq!(rows, before + added - removed);
            assert!((0..=1).contains(&rows));
        }
    }

    #[tokio::test]
    async fn test_list_for_user_and_cascade() {
        let (favorites, cocktails, cocktail) = setup().await;
        cocktails.create(NewCocktail::named("No favorito")).await.unwrap();

        favorites.add_favorite(DEMO_USER_ID, cocktail).await.unwrap();

        let listed = favorites.list_for_user(DEMO_USER_ID).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Cosmopolitan");
        assert_eq!(favorites.find_for_user(DEMO_USER_ID).await.unwrap().len(), 1);

        cocktails.delete(cocktail).await.unwrap();
        assert_eq!(favorites.count_for_cocktail(cocktail).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_cocktail_is_storage_error() {
        let (favorites, _, _) = setup().await;

        let err = favorites.add_favorite(DEMO_USER_ID, 55_555).await.unwrap_err();
        assert!(err.is_storage());
    }
}
