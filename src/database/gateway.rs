use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::Table;
use crate::filter::Filter;

/// A persisted row as a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// Column values for an insert or a partial update.
pub type Fields = Map<String, Value>;

/// Identifies the row(s) a lifecycle step applies to: `id` or a foreign-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub column: &'static str,
    pub value: Uuid,
}

impl Key {
    pub fn id(value: Uuid) -> Self {
        Self { column: "id", value }
    }

    pub fn foreign(column: &'static str, value: Uuid) -> Self {
        Self { column, value }
    }
}

/// Conditional soft-delete flag change: applies only where `deleted = from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub table: Table,
    pub key: Key,
    pub from: bool,
    pub to: bool,
}

impl Transition {
    /// Flag change towards `deleted`, expecting the opposite state beforehand.
    pub fn towards(table: Table, key: Key, deleted: bool) -> Self {
        Self { table, key, from: !deleted, to: deleted }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// Step `step` matched no row in its expected state; nothing was written.
    Conflict { step: usize },
}

/// Storage contract the domain services are written against.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Whether a row matching `key` exists with the given soft-delete state.
    async fn exists(&self, table: Table, key: Key, deleted: bool) -> Result<bool, DatabaseError>;

    async fn find_one(&self, table: Table, filter: &Filter) -> Result<Option<Row>, DatabaseError>;

    async fn find_many(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, DatabaseError>;

    async fn count(&self, table: Table, filter: &Filter) -> Result<i64, DatabaseError>;

    /// Inserts a row; `id`, `deleted` and the timestamps default when absent.
    async fn insert(&self, table: Table, fields: Fields) -> Result<Uuid, DatabaseError>;

    /// Partial update of an active row. Stamps `updated_at`; returns affected row count.
    async fn update_fields(&self, table: Table, id: Uuid, fields: Fields) -> Result<u64, DatabaseError>;

    /// Applies every step or none of them.
    async fn transition(&self, steps: &[Transition]) -> Result<TransitionOutcome, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub fn decode_row<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, DatabaseError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| DatabaseError::Decode(format!("{}: {}", table.name(), e)))
}

/// Loads one row by id. `deleted: None` ignores the soft-delete flag.
pub async fn find_by_id<T: DeserializeOwned>(
    gateway: &dyn EntityGateway,
    table: Table,
    id: Uuid,
    deleted: Option<bool>,
) -> Result<Option<T>, DatabaseError> {
    let mut filter = Filter::new().eq("id", id);
    if let Some(deleted) = deleted {
        filter = filter.deleted(deleted);
    }
    match gateway.find_one(table, &filter).await? {
        Some(row) => Ok(Some(decode_row(table, row)?)),
        None => Ok(None),
    }
}

pub async fn find_first<T: DeserializeOwned>(
    gateway: &dyn EntityGateway,
    table: Table,
    filter: &Filter,
) -> Result<Option<T>, DatabaseError> {
    match gateway.find_one(table, filter).await? {
        Some(row) => Ok(Some(decode_row(table, row)?)),
        None => Ok(None),
    }
}

pub async fn find_all<T: DeserializeOwned>(
    gateway: &dyn EntityGateway,
    table: Table,
    filter: &Filter,
) -> Result<Vec<T>, DatabaseError> {
    gateway
        .find_many(table, filter)
        .await?
        .into_iter()
        .map(|row| decode_row(table, row))
        .collect()
}
