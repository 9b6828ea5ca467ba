// Cocktail catalog - opens the local store, seeds it on first run and
// reports what it holds

use anyhow::Context;
use cocktail_catalog::app::AppState;
use cocktail_catalog::config::DatabaseConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cocktail_catalog=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cocktail catalog");

    let config = DatabaseConfig::from_env();
    let state = AppState::initialize(config)
        .await
        .context("Failed to open the catalog")?;

    let stats = state
        .catalog
        .get_statistics()
        .await
        .context("Failed to load statistics")?;
    tracing::info!(
        "Catalog holds {} cocktails ({} alcoholic, {} without alcohol, {} featured)",
        stats.total,
        stats.alcoholic,
        stats.non_alcoholic,
        stats.featured
    );

    for cocktail in state.catalog.list_cocktails().await? {
        let categories: Vec<&str> = cocktail.categories.iter().map(|c| c.name.as_str()).collect();
        tracing::info!("{} [{}] {}", cocktail.name, cocktail.difficulty, categories.join(", "));
    }

    state.shutdown().await;
    Ok(())
}
