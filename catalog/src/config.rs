//! Application configuration
//!
//! Central location for configuration constants, validation boundaries,
//! and the storage configuration used to open the catalog database.

use std::path::PathBuf;

// ===== Storage =====

/// Directory created under the platform data directory
pub const APP_DIR_NAME: &str = "cocktail-catalog";

/// File name of the on-disk database
pub const DATABASE_FILE_NAME: &str = "cocktails.db";

/// Overrides the database file location
pub const ENV_DB_PATH: &str = "COCKTAILS_DB_PATH";

/// When set to `1` or `true`, the catalog runs against an in-memory store
pub const ENV_IN_MEMORY: &str = "COCKTAILS_IN_MEMORY";

/// When set to `0` or `false`, sample cocktails are not seeded
pub const ENV_SEED_SAMPLES: &str = "COCKTAILS_SEED_SAMPLES";

/// Maximum connections in the on-disk application pool
pub const MAX_POOL_CONNECTIONS: u32 = 5;

/// Seconds a connection waits on a locked database before failing
pub const BUSY_TIMEOUT_SECS: u64 = 5;

// ===== Seed Data =====

/// Id of the hardcoded demo user that owns seeded and UI-created cocktails
pub const DEMO_USER_ID: i64 = 1;

pub const DEMO_USER_NAME: &str = "Demo";

pub const DEMO_USER_EMAIL: &str = "demo@cocktails.local";

pub const DEMO_USER_PASSWORD: &str = "demo";

// ===== Validation Limits =====

/// Neutral swatch used when a category is created without a color
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

/// Unit assigned to ingredients created implicitly from a recipe line
pub const DEFAULT_INGREDIENT_UNIT: &str = "ml";

/// Maximum length for cocktail, ingredient and category names
pub const MAX_NAME_LENGTH: usize = 120;

/// Alcohol content is a percentage
pub const MAX_ALCOHOL_CONTENT: f64 = 100.0;

/// Notifications returned when the caller does not pass a limit
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;

// ===== Recipe Complexity =====

pub const COMPLEXITY_INGREDIENT_WEIGHT: f64 = 2.0;

pub const COMPLEXITY_STEP_WEIGHT: f64 = 3.0;

/// Weight applied per minute of summed step duration
pub const COMPLEXITY_MINUTE_WEIGHT: f64 = 1.0;

/// Scores below this are "simple"
pub const COMPLEXITY_SIMPLE_MAX: f64 = 15.0;

/// Scores below this (and at least the simple bound) are "moderate"
pub const COMPLEXITY_MODERATE_MAX: f64 = 30.0;

/// Where the catalog database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    InMemory,
}

/// Configuration used by the connection provider
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub storage: Storage,
    /// Seed the sample cocktails on first initialization
    pub seed_samples: bool,
}

impl DatabaseConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::File(path.into()),
            seed_samples: true,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            storage: Storage::InMemory,
            seed_samples: true,
        }
    }

    pub fn with_samples(mut self, seed_samples: bool) -> Self {
        self.seed_samples = seed_samples;
        self
    }

    /// Build a configuration from the process environment.
    ///
    /// Falls back to `<data dir>/cocktail-catalog/cocktails.db`, or to the
    /// current directory when the platform has no data directory.
    pub fn from_env() -> Self {
        let storage = if env_flag(ENV_IN_MEMORY).unwrap_or(false) {
            Storage::InMemory
        } else if let Ok(path) = std::env::var(ENV_DB_PATH) {
            Storage::File(PathBuf::from(path))
        } else {
            Storage::File(default_database_path())
        };

        Self {
            storage,
            seed_samples: env_flag(ENV_SEED_SAMPLES).unwrap_or(true),
        }
    }
}

/// Platform-appropriate database location
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DATABASE_FILE_NAME)
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    parse_flag(&value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
