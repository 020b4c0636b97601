use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};
use tracing::{debug, warn};
use uuid::Uuid;

use super::gateway::{EntityGateway, Fields, Key, Row, Transition, TransitionOutcome};
use super::manager::{DatabaseError, DatabaseManager};
use super::models::Table;
use crate::filter::filter::validate_identifier;
use crate::filter::{FieldValue, Filter};

/// Postgres-backed gateway. Rows come back as `row_to_json` objects so one code path
/// serves every entity table.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn column_list(fields: &Fields) -> Result<String, DatabaseError> {
        let mut columns = vec![];
        for name in fields.keys() {
            validate_identifier(name).map_err(|e| DatabaseError::QueryError(format!("invalid column: {}", e)))?;
            columns.push(DatabaseManager::quote_identifier(name));
        }
        Ok(columns.join(", "))
    }
}

fn bind_params<'q>(mut query: Query<'q, Postgres, PgArguments>, params: &[FieldValue]) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            FieldValue::Uuid(v) => query.bind(*v),
            FieldValue::Bool(v) => query.bind(*v),
            FieldValue::Int(v) => query.bind(*v),
            FieldValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

fn row_object(row: &PgRow) -> Result<Row, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Decode(format!("expected JSON object, got {}", other))),
    }
}

#[async_trait]
impl EntityGateway for PgGateway {
    async fn exists(&self, table: Table, key: Key, deleted: bool) -> Result<bool, DatabaseError> {
        validate_identifier(key.column).map_err(DatabaseError::QueryError)?;
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE \"{}\" = $1 AND \"deleted\" = $2)",
            table.name(),
            key.column
        );
        let row = sqlx::query(&sql).bind(key.value).bind(deleted).fetch_one(&self.pool).await?;
        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn find_one(&self, table: Table, filter: &Filter) -> Result<Option<Row>, DatabaseError> {
        let offset = filter.offset_value();
        let sql = filter.clone().limit(1, offset).to_sql(table.name())?;
        debug!(table = table.name(), query = %sql.query, "find_one");
        let row = bind_params(sqlx::query(&sql.query), &sql.params).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_object).transpose()
    }

    async fn find_many(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, DatabaseError> {
        let sql = filter.to_sql(table.name())?;
        debug!(table = table.name(), query = %sql.query, "find_many");
        let rows = bind_params(sqlx::query(&sql.query), &sql.params).fetch_all(&self.pool).await?;
        rows.iter().map(row_object).collect()
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql(table.name())?;
        let row = bind_params(sqlx::query(&sql.query), &sql.params).fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn insert(&self, table: Table, fields: Fields) -> Result<Uuid, DatabaseError> {
        if fields.is_empty() {
            let sql = format!("INSERT INTO \"{}\" DEFAULT VALUES RETURNING \"id\"", table.name());
            let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
            return Ok(row.try_get::<Uuid, _>("id")?);
        }
        let columns = Self::column_list(&fields)?;
        let sql = format!(
            "INSERT INTO \"{table}\" ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) RETURNING \"id\"",
            table = table.name(),
            columns = columns
        );
        let row = sqlx::query(&sql)
            .bind(sqlx::types::Json(Value::Object(fields)))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Uuid, _>("id")?)
    }

    async fn update_fields(&self, table: Table, id: Uuid, fields: Fields) -> Result<u64, DatabaseError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let columns = Self::column_list(&fields)?;
        let sql = format!(
            "UPDATE \"{table}\" SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1)), \"updated_at\" = NOW() WHERE \"id\" = $2 AND \"deleted\" = FALSE",
            table = table.name(),
            columns = columns
        );
        let result = sqlx::query(&sql)
            .bind(sqlx::types::Json(Value::Object(fields)))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn transition(&self, steps: &[Transition]) -> Result<TransitionOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for (index, step) in steps.iter().enumerate() {
            validate_identifier(step.key.column).map_err(DatabaseError::QueryError)?;
            let sql = format!(
                "UPDATE \"{}\" SET \"deleted\" = $1, \"updated_at\" = NOW() WHERE \"{}\" = $2 AND \"deleted\" = $3",
                step.table.name(),
                step.key.column
            );
            let result = sqlx::query(&sql)
                .bind(step.to)
                .bind(step.key.value)
                .bind(step.from)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                warn!(table = step.table.name(), key = %step.key.value, step = index, "lifecycle step matched no row, rolling back");
                tx.rollback().await?;
                return Ok(TransitionOutcome::Conflict { step: index });
            }
        }
        tx.commit().await?;
        Ok(TransitionOutcome::Applied)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
