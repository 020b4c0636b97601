use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{Condition, FieldValue, FilterOp, FilterWhereInfo};

/// Renders conditions to a parameterized WHERE clause and evaluates them against JSON rows.
pub struct FilterWhere {
    param_values: Vec<FieldValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    /// Returns the clause body (without `WHERE`) and its parameters. Empty input renders as `1=1`.
    pub fn generate(conditions: &[Condition], starting_param_index: usize) -> Result<(String, Vec<FieldValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut parts = vec![];
        for condition in conditions {
            parts.push(filter_where.build_condition(condition)?);
        }
        let clause = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        Ok((clause, filter_where.param_values))
    }

    fn next_param(&mut self, value: FieldValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    fn build_condition(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::Field(info) => self.build_field(info),
            Condition::AnyOf(terms) => {
                if terms.is_empty() {
                    return Err(FilterError::InvalidWhereClause("empty OR group".to_string()));
                }
                let mut parts = vec![];
                for term in terms {
                    parts.push(self.build_condition(term)?);
                }
                Ok(format!("({})", parts.join(" OR ")))
            }
        }
    }

    fn build_field(&mut self, info: &FilterWhereInfo) -> Result<String, FilterError> {
        validate_identifier(&info.column).map_err(FilterError::InvalidColumn)?;
        let column = format!("\"{}\"", info.column);
        let sql = match info.operator {
            FilterOp::Eq => format!("{} = {}", column, self.next_param(info.data.clone())),
            FilterOp::Ne => format!("{} <> {}", column, self.next_param(info.data.clone())),
            FilterOp::IEq => {
                let param = self.next_param(FieldValue::Text(text_of(&info.data)));
                format!("LOWER({}::text) = LOWER({})", column, param)
            }
            FilterOp::IContains => {
                let pattern = format!("%{}%", escape_like(&text_of(&info.data)));
                let param = self.next_param(FieldValue::Text(pattern));
                format!("{}::text ILIKE {}", column, param)
            }
        };
        Ok(sql)
    }

    /// In-memory evaluation with the same semantics as the rendered SQL. NULL never matches.
    pub fn matches(conditions: &[Condition], row: &Map<String, Value>) -> bool {
        conditions.iter().all(|c| Self::matches_condition(c, row))
    }

    fn matches_condition(condition: &Condition, row: &Map<String, Value>) -> bool {
        match condition {
            Condition::AnyOf(terms) => terms.iter().any(|t| Self::matches_condition(t, row)),
            Condition::Field(info) => {
                let Some(value) = row.get(&info.column).filter(|v| !v.is_null()) else {
                    return false;
                };
                match info.operator {
                    FilterOp::Eq => json_equals(value, &info.data),
                    FilterOp::Ne => !json_equals(value, &info.data),
                    FilterOp::IEq => json_text(value)
                        .map(|t| t.to_lowercase() == text_of(&info.data).to_lowercase())
                        .unwrap_or(false),
                    FilterOp::IContains => json_text(value)
                        .map(|t| t.to_lowercase().contains(&text_of(&info.data).to_lowercase()))
                        .unwrap_or(false),
                }
            }
        }
    }
}

fn text_of(value: &FieldValue) -> String {
    match value {
        FieldValue::Uuid(v) => v.to_string(),
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::Int(v) => v.to_string(),
        FieldValue::Text(v) => v.clone(),
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_equals(value: &Value, expected: &FieldValue) -> bool {
    match (value, expected) {
        (Value::String(s), FieldValue::Uuid(u)) => s.parse::<uuid::Uuid>().map(|v| v == *u).unwrap_or(false),
        (Value::String(s), FieldValue::Text(t)) => s == t,
        (Value::Bool(b), FieldValue::Bool(e)) => b == e,
        (Value::Number(n), FieldValue::Int(i)) => n.as_i64() == Some(*i),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(column: &str, operator: FilterOp, data: FieldValue) -> Condition {
        Condition::Field(FilterWhereInfo { column: column.to_string(), operator, data })
    }

    #[test]
    fn renders_numbered_params_in_order() {
        let conditions = vec![
            field("deleted", FilterOp::Eq, FieldValue::Bool(false)),
            field("name", FilterOp::IEq, "Labrador".into()),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "\"deleted\" = $1 AND LOWER(\"name\"::text) = LOWER($2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn or_group_is_parenthesized_and_like_is_escaped() {
        let conditions = vec![Condition::AnyOf(vec![
            field("color", FilterOp::IContains, "50%".into()),
            field("fur", FilterOp::IContains, "50%".into()),
        ])];
        let (sql, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "(\"color\"::text ILIKE $1 OR \"fur\"::text ILIKE $2)");
        assert_eq!(params[0], FieldValue::Text("%50\\%%".to_string()));
    }

    #[test]
    fn rejects_unsafe_column_names() {
        let conditions = vec![field("name; DROP TABLE users", FilterOp::Eq, "x".into())];
        assert!(FilterWhere::generate(&conditions, 0).is_err());
    }

    #[test]
    fn in_memory_matching_follows_sql_semantics() {
        let row = json!({"name": "Labrador", "age": 3, "deleted": false, "breed_id": null});
        let row = row.as_object().unwrap();
        assert!(FilterWhere::matches(&[field("name", FilterOp::IEq, "LABRADOR".into())], row));
        assert!(FilterWhere::matches(&[field("age", FilterOp::IContains, "3".into())], row));
        assert!(!FilterWhere::matches(&[field("breed_id", FilterOp::Ne, "x".into())], row));
        assert!(!FilterWhere::matches(&[field("deleted", FilterOp::Eq, FieldValue::Bool(true))], row));
    }
}
