use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    /// Case-insensitive equality on the text form of the column.
    IEq,
    /// Case-insensitive substring match on the text form of the column.
    IContains,
}

/// Typed parameter value bound into generated SQL or compared against JSON rows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Uuid(Uuid),
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Uuid(v) => Value::String(v.to_string()),
            FieldValue::Bool(v) => Value::Bool(*v),
            FieldValue::Int(v) => Value::from(*v),
            FieldValue::Text(v) => Value::String(v.clone()),
        }
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self { FieldValue::Uuid(v) }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self { FieldValue::Bool(v) }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Int(v) }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Text(v.to_string()) }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self { FieldValue::Text(v) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: FieldValue,
}

/// A single WHERE term. `AnyOf` renders as a parenthesized OR group.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Field(FilterWhereInfo),
    AnyOf(Vec<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FieldValue>,
}
