use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::gateway::{EntityGateway, Fields, Key, Row, Transition, TransitionOutcome};
use super::manager::DatabaseError;
use super::models::Table;
use crate::filter::Filter;

/// In-process gateway with the same observable semantics as [`super::postgres::PgGateway`].
/// Backs the test suite and local experiments without a database.
#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    failing: RwLock<HashSet<Table>>,
}

fn timestamp() -> Value {
    // Fixed precision keeps string ordering chronological.
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn key_matches(row: &Row, key: &Key) -> bool {
    row.get(key.column)
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Uuid>().ok())
        .map(|v| v == key.value)
        .unwrap_or(false)
}

fn is_deleted(row: &Row) -> bool {
    row.get("deleted").and_then(Value::as_bool).unwrap_or(false)
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write touching `table` fail as if the store were down.
    pub async fn fail_writes_to(&self, table: Table) {
        self.failing.write().await.insert(table);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Raw row access for assertions, ignoring soft-delete state.
    pub async fn raw(&self, table: Table, id: Uuid) -> Option<Row> {
        let tables = self.tables.read().await;
        tables.get(&table)?.iter().find(|r| key_matches(r, &Key::id(id))).cloned()
    }

    /// Overwrites the soft-delete flag without any checks. Lets tests build inconsistent states.
    pub async fn force_deleted(&self, table: Table, id: Uuid, deleted: bool) {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.get_mut(&table).and_then(|rows| rows.iter_mut().find(|r| key_matches(r, &Key::id(id)))) {
            row.insert("deleted".to_string(), Value::Bool(deleted));
        }
    }

    async fn ensure_writable(&self, table: Table) -> Result<(), DatabaseError> {
        if self.failing.read().await.contains(&table) {
            return Err(DatabaseError::Unavailable(format!("writes to {} are failing", table.name())));
        }
        Ok(())
    }

    fn check_unique(rows: &[Row], table: Table, candidate: &Row, skip: Option<Uuid>) -> Result<(), DatabaseError> {
        for column in table.unique_columns() {
            let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else { continue };
            let clash = rows.iter().any(|r| {
                let same_row = skip.map(|id| key_matches(r, &Key::id(id))).unwrap_or(false);
                !same_row && r.get(*column) == Some(value)
            });
            if clash {
                return Err(DatabaseError::Conflict(format!("duplicate key value violates unique constraint on {}.{}", table.name(), column)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EntityGateway for MemoryGateway {
    async fn exists(&self, table: Table, key: Key, deleted: bool) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().any(|r| key_matches(r, &key) && is_deleted(r) == deleted))
            .unwrap_or(false))
    }

    async fn find_one(&self, table: Table, filter: &Filter) -> Result<Option<Row>, DatabaseError> {
        Ok(self.find_many(table, filter).await?.into_iter().next())
    }

    async fn find_many(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, DatabaseError> {
        let tables = self.tables.read().await;
        let matched = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(filter.apply_window(matched))
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).count() as i64)
            .unwrap_or(0))
    }

    async fn insert(&self, table: Table, mut fields: Fields) -> Result<Uuid, DatabaseError> {
        self.ensure_writable(table).await?;
        let id = match fields.get("id").and_then(Value::as_str) {
            Some(s) => s.parse::<Uuid>().map_err(|e| DatabaseError::QueryError(e.to_string()))?,
            None => Uuid::new_v4(),
        };
        let now = timestamp();
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.entry("deleted".to_string()).or_insert(Value::Bool(false));
        fields.entry("created_at".to_string()).or_insert_with(|| now.clone());
        fields.entry("updated_at".to_string()).or_insert(now);

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if rows.iter().any(|r| key_matches(r, &Key::id(id))) {
            return Err(DatabaseError::Conflict(format!("duplicate id {} in {}", id, table.name())));
        }
        Self::check_unique(rows, table, &fields, None)?;
        rows.push(fields);
        Ok(id)
    }

    async fn update_fields(&self, table: Table, id: Uuid, fields: Fields) -> Result<u64, DatabaseError> {
        if fields.is_empty() {
            return Ok(0);
        }
        self.ensure_writable(table).await?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else { return Ok(0) };
        let Some(index) = rows.iter().position(|r| key_matches(r, &Key::id(id)) && !is_deleted(r)) else {
            return Ok(0);
        };
        let mut updated = rows[index].clone();
        for (column, value) in fields {
            updated.insert(column, value);
        }
        updated.insert("updated_at".to_string(), timestamp());
        Self::check_unique(rows, table, &updated, Some(id))?;
        rows[index] = updated;
        Ok(1)
    }

    async fn transition(&self, steps: &[Transition]) -> Result<TransitionOutcome, DatabaseError> {
        // Validate every step under one write lock, then apply, so a failure leaves nothing changed.
        let failing = self.failing.read().await.clone();
        let mut tables = self.tables.write().await;
        for (index, step) in steps.iter().enumerate() {
            if failing.contains(&step.table) {
                return Err(DatabaseError::Unavailable(format!("writes to {} are failing", step.table.name())));
            }
            let matched = tables
                .get(&step.table)
                .map(|rows| rows.iter().any(|r| key_matches(r, &step.key) && is_deleted(r) == step.from))
                .unwrap_or(false);
            if !matched {
                return Ok(TransitionOutcome::Conflict { step: index });
            }
        }
        let now = timestamp();
        for step in steps {
            if let Some(rows) = tables.get_mut(&step.table) {
                for row in rows.iter_mut().filter(|r| key_matches(r, &step.key) && is_deleted(r) == step.from) {
                    row.insert("deleted".to_string(), Value::Bool(step.to));
                    row.insert("updated_at".to_string(), now.clone());
                }
            }
        }
        Ok(TransitionOutcome::Applied)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
