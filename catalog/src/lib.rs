//! Cocktail catalog library
//!
//! Storage, repositories and services of the cocktail catalog, exposed
//! for the application binary and for testing.

pub mod app;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod services;
