//! Generic record access
//!
//! `RecordStore` provides find/create/update/delete/count against one table.
//! Entity repositories wrap a store instead of re-implementing these queries.
//! Column names come from a static whitelist declared by each table; only
//! values are ever bound, identifiers are never taken from caller input.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use std::marker::PhantomData;

/// A table the generic store can operate on
pub trait Table {
    const NAME: &'static str;
    const PRIMARY_KEY: &'static str;
    /// Columns callers may write
    const COLUMNS: &'static [&'static str];

    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static;
}

/// A bindable column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Ordered column/value pairs for an insert or update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(&'static str, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.0.push((column, value.into()));
        self
    }

    /// Add the column only when a value is present
    pub fn with_some<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(column, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.0.iter().map(|(column, _)| *column).collect()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, value)| value)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(v) => query.bind(*v),
        Value::Real(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Bool(v) => query.bind(*v),
        Value::Timestamp(v) => query.bind(*v),
    }
}

/// Find/create/update/delete/count for one table
pub struct RecordStore<T: Table> {
    pool: SqlitePool,
    _table: PhantomData<fn() -> T>,
}

impl<T: Table> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: Table> RecordStore<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _table: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a record by primary key; a missing row is `None`, not an error
    pub async fn find_by_id(&self, id: i64) -> Result<Option<T::Row>> {
        let sql = format!("SELECT * FROM {} WHERE {} = ?", T::NAME, T::PRIMARY_KEY);

        let row = sqlx::query_as::<_, T::Row>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// All records in insertion order
    pub async fn find_all(&self) -> Result<Vec<T::Row>> {
        let sql = format!("SELECT * FROM {} ORDER BY {} ASC", T::NAME, T::PRIMARY_KEY);

        let rows = sqlx::query_as::<_, T::Row>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Insert a record and return its new primary key
    pub async fn create(&self, fields: &Fields) -> Result<i64> {
        Self::insert_with(&self.pool, fields).await
    }

    /// Insert using any executor, e.g. an open transaction
    pub async fn insert_with<'c, E>(executor: E, fields: &Fields) -> Result<i64>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        Self::check_columns(fields)?;

        let columns = fields.columns().join(", ");
        let placeholders = vec!["?"; fields.0.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::NAME,
            columns,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for value in fields.values() {
            query = bind_value(query, value);
        }

        let id = query.execute(executor).await?.last_insert_rowid();

        tracing::debug!("Inserted {} row: {}", T::NAME, id);
        Ok(id)
    }

    /// Update the given columns; returns whether a row changed
    pub async fn update(&self, id: i64, fields: &Fields) -> Result<bool> {
        Self::update_with(&self.pool, id, fields).await
    }

    pub async fn update_with<'c, E>(executor: E, id: i64, fields: &Fields) -> Result<bool>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        Self::check_columns(fields)?;

        let assignments = fields
            .columns()
            .iter()
            .map(|column| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            T::NAME,
            assignments,
            T::PRIMARY_KEY
        );

        let mut query = sqlx::query(&sql);
        for value in fields.values() {
            query = bind_value(query, value);
        }

        let rows = query.bind(id).execute(executor).await?.rows_affected();

        tracing::debug!("Updated {} row {}: {} changed", T::NAME, id, rows);
        Ok(rows > 0)
    }

    /// Delete by primary key; returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", T::NAME, T::PRIMARY_KEY);

        let rows = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} row {}: {} changed", T::NAME, id, rows);
        Ok(rows > 0)
    }

    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::NAME);

        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;

        Ok(count)
    }

    fn check_columns(fields: &Fields) -> Result<()> {
        if fields.is_empty() {
            return Err(AppError::validation(format!(
                "No fields given for {}",
                T::NAME
            )));
        }

        let columns = fields.columns();
        for (index, column) in columns.iter().enumerate() {
            if !T::COLUMNS.contains(column) {
                return Err(AppError::validation(format!(
                    "Unknown column '{}' for {}",
                    column,
                    T::NAME
                )));
            }
            if columns[..index].contains(column) {
                return Err(AppError::validation(format!(
                    "Column '{}' given twice for {}",
                    column,
                    T::NAME
                )));
            }
        }

        Ok(())
    }
}
