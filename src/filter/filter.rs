use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FieldValue, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection, SqlResult};
use crate::types::PageRequest;

/// Table-agnostic query description. The same filter drives SQL generation for
/// Postgres and row matching for the in-memory gateway.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter restricted to rows that are not soft-deleted.
    pub fn active() -> Self {
        Self::new().deleted(false)
    }

    pub fn deleted(self, deleted: bool) -> Self {
        self.eq("deleted", deleted)
    }

    pub fn eq(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Eq, value.into())
    }

    pub fn ne(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Ne, value.into())
    }

    pub fn eq_ignore_case(self, column: &str, value: &str) -> Self {
        self.push(column, FilterOp::IEq, FieldValue::Text(value.trim().to_string()))
    }

    pub fn contains(self, column: &str, needle: &str) -> Self {
        self.push(column, FilterOp::IContains, FieldValue::Text(needle.trim().to_string()))
    }

    /// Case-insensitive substring match against any of `columns`.
    pub fn contains_any(mut self, columns: &[&str], needle: &str) -> Self {
        let needle = needle.trim();
        let terms = columns
            .iter()
            .map(|c| Condition::Field(FilterWhereInfo {
                column: c.to_string(),
                operator: FilterOp::IContains,
                data: FieldValue::Text(needle.to_string()),
            }))
            .collect::<Vec<_>>();
        if !terms.is_empty() {
            self.conditions.push(Condition::AnyOf(terms));
        }
        self
    }

    pub fn order_by(mut self, column: &str, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn paginate(self, page: &PageRequest) -> Self {
        self.limit(page.limit(), Some(page.offset()))
    }

    fn push(mut self, column: &str, operator: FilterOp, data: FieldValue) -> Self {
        self.conditions.push(Condition::Field(FilterWhereInfo { column: column.to_string(), operator, data }));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// `SELECT row_to_json(t) AS row FROM "table" t WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn to_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        validate_identifier(table).map_err(FilterError::InvalidTableName)?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause()?;

        let query = [
            "SELECT row_to_json(t) AS row".to_string(),
            format!("FROM \"{}\" t", table),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        validate_identifier(table).map_err(FilterError::InvalidTableName)?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0)?;
        let query = format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", table, where_clause);
        Ok(SqlResult { query, params })
    }

    fn build_limit_clause(&self) -> Result<String, FilterError> {
        let mut clause = vec![];
        if let Some(limit) = self.limit {
            if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
            clause.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
            clause.push(format!("OFFSET {}", offset));
        }
        Ok(clause.join(" "))
    }

    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        FilterWhere::matches(&self.conditions, row)
    }

    /// Sorts and windows already-matched rows the way the SQL rendering would.
    pub fn apply_window(&self, mut rows: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
        FilterOrder::sort_rows(&mut rows, &self.order_data);
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let limit = self.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        rows.into_iter().skip(offset).take(limit).collect()
    }
}

/// Accepts lowercase snake_case identifiers only, so quoting is always safe.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() { return Err("identifier cannot be empty".to_string()); }
    if name.len() > 63 { return Err(format!("identifier too long: {}", name)); }
    let mut chars = name.chars();
    let first_ok = chars.next().map(|c| c.is_ascii_lowercase() || c == '_').unwrap_or(false);
    if !first_ok || !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(name.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_sql_for_active_page() {
        let filter = Filter::active()
            .eq_ignore_case("name", " Labrador ")
            .order_by("created_at", SortDirection::Asc)
            .paginate(&PageRequest::new(2, 15));
        let sql = filter.to_sql("breeds").unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"breeds\" t WHERE \"deleted\" = $1 AND LOWER(\"name\"::text) = LOWER($2) ORDER BY \"created_at\" ASC LIMIT 15 OFFSET 15"
        );
        assert_eq!(sql.params[1], FieldValue::Text("Labrador".to_string()));
    }

    #[test]
    fn count_sql_ignores_window() {
        let filter = Filter::active().paginate(&PageRequest::new(3, 10));
        let sql = filter.to_count_sql("species").unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"species\" WHERE \"deleted\" = $1");
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(matches!(Filter::new().to_sql("Users"), Err(FilterError::InvalidTableName(_))));
        assert!(matches!(Filter::new().to_sql("users\""), Err(FilterError::InvalidTableName(_))));
    }

    #[test]
    fn window_applies_offset_then_limit() {
        let rows = (0..5)
            .map(|i| serde_json::json!({"n": i}).as_object().cloned().unwrap())
            .collect::<Vec<_>>();
        let window = Filter::new().order_by("n", SortDirection::Desc).limit(2, Some(1)).apply_window(rows);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0]["n"], 3);
    }
}
