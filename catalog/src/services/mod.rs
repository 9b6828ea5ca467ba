//! Services module
//!
//! Business logic services that sit between the UI boundary and the repositories.

pub mod catalog;

pub use catalog::{CatalogService, EnrichedRecipe};
