//! Entity repositories
//!
//! Each repository wraps a `RecordStore` for its table and adds the
//! entity-specific queries. All of them share one pool.

pub mod categories;
pub mod cocktails;
mod composite;
pub mod favorites;
pub mod ingredients;
pub mod notifications;
pub mod recipes;
pub mod users;

pub use categories::CategoryRepository;
pub use cocktails::CocktailRepository;
pub use favorites::FavoriteRepository;
pub use ingredients::IngredientRepository;
pub use notifications::NotificationRepository;
pub use recipes::RecipeRepository;
pub use users::UserRepository;

use sqlx::SqlitePool;

/// Every repository over a single pool
#[derive(Clone)]
pub struct Repositories {
    pub cocktails: CocktailRepository,
    pub recipes: RecipeRepository,
    pub ingredients: IngredientRepository,
    pub categories: CategoryRepository,
    pub favorites: FavoriteRepository,
    pub notifications: NotificationRepository,
    pub users: UserRepository,
}

impl Repositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            cocktails: CocktailRepository::new(pool.clone()),
            recipes: RecipeRepository::new(pool.clone()),
            ingredients: IngredientRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }
}
