//! First-run data: system categories, the demo user, pairings and
//! optionally a handful of sample cocktails.

use super::models::{CreateCocktailRequest, Difficulty, IngredientEntry, NewCocktail, NewRecipe, StepEntry};
use super::repository::CocktailRepository;
use crate::config::{
    DEFAULT_CATEGORY_COLOR, DEMO_USER_EMAIL, DEMO_USER_ID, DEMO_USER_NAME, DEMO_USER_PASSWORD,
};
use crate::crypto;
use crate::error::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// (name, description, color)
const SYSTEM_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Clásicos", "Cócteles de siempre", "#B45309"),
    ("Tropicales", "Frutas y ron", "#059669"),
    ("Sin alcohol", "Para todos", DEFAULT_CATEGORY_COLOR),
    ("Aperitivos", "Antes de comer", "#DC2626"),
];

const PAIRINGS: &[(&str, &str)] = &[
    ("Tapas", "Aceitunas, jamón y queso curado"),
    ("Marisco", "Ceviche, gambas y ostras"),
];

/// Seed an empty store.
///
/// Baseline rows are written once, while no category exists. Samples are
/// checked on their own, so a store whose first sample run failed gets
/// them on the next start.
pub async fn seed_database(pool: &SqlitePool, with_samples: bool) -> Result<()> {
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;
    if categories > 0 {
        tracing::debug!("Baseline already seeded ({} categories)", categories);
    } else {
        seed_baseline(pool).await?;
    }

    if with_samples {
        let cocktails: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cocktails")
            .fetch_one(pool)
            .await?;
        if cocktails == 0 {
            seed_samples(pool).await?;
        }
    }

    Ok(())
}

async fn seed_baseline(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Seeding initial catalog data");

    let password_hash = crypto::hash_password(DEMO_USER_PASSWORD)?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT OR IGNORE INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(DEMO_USER_ID)
    .bind(DEMO_USER_NAME)
    .bind(DEMO_USER_EMAIL)
    .bind(&password_hash)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for (name, description, color) in SYSTEM_CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (name, description, color, is_system, user_id) VALUES (?, ?, ?, 1, NULL)",
        )
        .bind(*name)
        .bind(*description)
        .bind(*color)
        .execute(&mut *tx)
        .await?;
    }

    for (name, description) in PAIRINGS {
        sqlx::query("INSERT INTO pairings (name, description) VALUES (?, ?)")
            .bind(*name)
            .bind(*description)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!("Baseline seeding complete");
    Ok(())
}

async fn category_id(pool: &SqlitePool, name: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM categories WHERE name = ? AND is_system = 1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(id)
}

async fn seed_samples(pool: &SqlitePool) -> Result<()> {
    let repo = CocktailRepository::new(pool.clone());

    let classics = category_id(pool, "Clásicos").await?;
    let tropical = category_id(pool, "Tropicales").await?;
    let alcohol_free = category_id(pool, "Sin alcohol").await?;
    let aperitifs = category_id(pool, "Aperitivos").await?;

    let samples = vec![
        CreateCocktailRequest {
            cocktail: NewCocktail {
                description: Some("Refrescante cóctel cubano de ron y hierbabuena".to_string()),
                difficulty: Difficulty::Easy,
                preparation_time: Some(5),
                alcohol_content: Some(13.0),
                servings: Some(1),
                is_featured: true,
                created_by: Some(DEMO_USER_ID),
                ..NewCocktail::named("Mojito")
            },
            recipe: NewRecipe {
                glass_type: Some("Highball".to_string()),
                garnish: Some("Ramita de hierbabuena".to_string()),
                serving_suggestion: None,
            },
            ingredients: vec![
                IngredientEntry::new("Ron blanco", 50.0, "ml"),
                IngredientEntry::new("Zumo de lima", 25.0, "ml"),
                IngredientEntry::new("Azúcar", 2.0, "cucharadita"),
                IngredientEntry::new("Hierbabuena", 8.0, "hojas"),
                IngredientEntry::new("Soda", 60.0, "ml"),
            ],
            steps: vec![
                StepEntry::new("Machacar la hierbabuena con el azúcar y la lima"),
                StepEntry::new("Añadir el ron y llenar de hielo picado"),
                StepEntry {
                    duration_seconds: Some(15),
                    ..StepEntry::new("Completar con soda y remover")
                },
            ],
            category_id: classics,
            ..Default::default()
        },
        CreateCocktailRequest {
            cocktail: NewCocktail {
                description: Some("Tequila, triple seco y lima".to_string()),
                difficulty: Difficulty::Medium,
                preparation_time: Some(5),
                alcohol_content: Some(22.0),
                servings: Some(1),
                created_by: Some(DEMO_USER_ID),
                pairing_id: Some(2),
                ..NewCocktail::named("Margarita")
            },
            recipe: NewRecipe {
                glass_type: Some("Copa margarita".to_string()),
                garnish: Some("Borde de sal".to_string()),
                serving_suggestion: Some("Muy fría".to_string()),
            },
            ingredients: vec![
                IngredientEntry::new("Tequila", 50.0, "ml"),
                IngredientEntry::new("Triple seco", 20.0, "ml"),
                IngredientEntry::new("Zumo de lima", 25.0, "ml"),
            ],
            steps: vec![
                StepEntry::new("Escarchar el borde de la copa con sal"),
                StepEntry {
                    duration_seconds: Some(20),
                    technique: Some("Agitado".to_string()),
                    ..StepEntry::new("Agitar con hielo y colar")
                },
            ],
            category_id: classics,
            additional_categories: aperitifs.into_iter().collect(),
            ..Default::default()
        },
        CreateCocktailRequest {
            cocktail: NewCocktail {
                description: Some("Ron, coco y piña".to_string()),
                difficulty: Difficulty::Medium,
                preparation_time: Some(8),
                alcohol_content: Some(10.0),
                servings: Some(1),
                created_by: Some(DEMO_USER_ID),
                ..NewCocktail::named("Piña Colada")
            },
            recipe: NewRecipe {
                glass_type: Some("Hurricane".to_string()),
                garnish: Some("Rodaja de piña".to_string()),
                serving_suggestion: None,
            },
            ingredients: vec![
                IngredientEntry::new("Ron blanco", 50.0, "ml"),
                IngredientEntry::new("Crema de coco", 30.0, "ml"),
                IngredientEntry::new("Zumo de piña", 90.0, "ml"),
            ],
            steps: vec![StepEntry {
                duration_seconds: Some(30),
                technique: Some("Batido".to_string()),
                ..StepEntry::new("Batir todo con hielo hasta que quede cremoso")
            }],
            category_id: tropical,
            ..Default::default()
        },
        CreateCocktailRequest {
            cocktail: NewCocktail {
                description: Some("Limonada casera con menta fresca".to_string()),
                difficulty: Difficulty::Easy,
                preparation_time: Some(5),
                alcohol_content: Some(0.0),
                servings: Some(2),
                is_alcoholic: false,
                created_by: Some(DEMO_USER_ID),
                ..NewCocktail::named("Limonada de menta")
            },
            recipe: NewRecipe {
                glass_type: Some("Vaso largo".to_string()),
                garnish: Some("Hojas de menta".to_string()),
                serving_suggestion: None,
            },
            ingredients: vec![
                IngredientEntry::new("Zumo de limón", 60.0, "ml"),
                IngredientEntry::new("Azúcar", 2.0, "cucharadita"),
                IngredientEntry::new("Menta", 6.0, "hojas"),
                IngredientEntry::new("Agua fría", 200.0, "ml"),
            ],
            steps: vec![
                StepEntry::new("Disolver el azúcar en el zumo de limón"),
                StepEntry::new("Añadir la menta, el agua y hielo"),
            ],
            category_id: alcohol_free,
            ..Default::default()
        },
    ];

    for sample in &samples {
        repo.create_complete(sample).await?;
    }

    tracing::info!("Seeded {} sample cocktails", samples.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{memory_pool, sample_pool};

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_seed_without_samples() {
        let pool = memory_pool().await;

        assert_eq!(count(&pool, "categories").await, SYSTEM_CATEGORIES.len() as i64);
        assert_eq!(count(&pool, "users").await, 1);
        assert_eq!(count(&pool, "pairings").await, PAIRINGS.len() as i64);
        assert_eq!(count(&pool, "cocktails").await, 0);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = sample_pool().await;
        let cocktails = count(&pool, "cocktails").await;
        assert_eq!(cocktails, 4);

        seed_database(&pool, true).await.unwrap();
        seed_database(&pool, true).await.unwrap();

        assert_eq!(count(&pool, "cocktails").await, cocktails);
        assert_eq!(count(&pool, "categories").await, SYSTEM_CATEGORIES.len() as i64);
        assert_eq!(count(&pool, "users").await, 1);
    }

    #[tokio::test]
    async fn test_samples_seeded_after_baseline_only_run() {
        // Baseline committed earlier, samples never made it in
        let pool = memory_pool().await;
        assert_eq!(count(&pool, "cocktails").await, 0);

        seed_database(&pool, true).await.unwrap();
        assert_eq!(count(&pool, "cocktails").await, 4);
        assert_eq!(count(&pool, "categories").await, SYSTEM_CATEGORIES.len() as i64);
        assert_eq!(count(&pool, "users").await, 1);

        seed_database(&pool, true).await.unwrap();
        assert_eq!(count(&pool, "cocktails").await, 4);
    }

    #[tokio::test]
    async fn test_existing_cocktails_block_samples() {
        let pool = memory_pool().await;
        CocktailRepository::new(pool.clone())
            .create(NewCocktail::named("Casero"))
            .await
            .unwrap();

        seed_database(&pool, true).await.unwrap();
        assert_eq!(count(&pool, "cocktails").await, 1);
    }

    #[tokio::test]
    async fn test_samples_share_ingredients_and_link_categories() {
        let pool = sample_pool().await;

        // "Ron blanco", "Zumo de lima" and "Azúcar" appear in two samples each
        assert_eq!(count(&pool, "ingredients").await, 12);

        let alcohol_free: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM cocktail_categories cc
            JOIN categories c ON c.id = cc.category_id
            JOIN cocktails k ON k.id = cc.cocktail_id
            WHERE c.name = 'Sin alcohol' AND k.is_alcoholic = 0
            "#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(alcohol_free, 1);

        // Margarita is in two categories
        assert_eq!(count(&pool, "cocktail_categories").await, 5);
    }
}
