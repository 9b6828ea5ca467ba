//! Application state and initialization
//!
//! This module owns the catalog's lifecycle. The store is opened and seeded
//! here and every service is made available through `AppState`.

use crate::config::DatabaseConfig;
use crate::database::{ConnectionProvider, Repositories};
use crate::error::Result;
use crate::services::CatalogService;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<ConnectionProvider>,
    pub repos: Repositories,
    pub catalog: CatalogService,
}

impl AppState {
    /// Open the configured store and wire the services over it
    pub async fn initialize(config: DatabaseConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("Storage: {:?}", config.storage);

        let provider = Arc::new(ConnectionProvider::new(config));
        let pool = provider.handle().await?;

        let repos = Repositories::new(pool);
        let catalog = CatalogService::new(repos.clone());

        tracing::info!("Application initialized successfully");

        Ok(Self {
            provider,
            repos,
            catalog,
        })
    }

    /// Release the database handle
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.provider.close().await;
    }
}
