use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parses "created_at desc, name" style input. Unknown directions fall back to ascending.
    pub fn parse(spec: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in spec.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                validate_identifier(col).map_err(FilterError::InvalidColumn)?;
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    pub fn generate(order: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if order.is_empty() { return Ok(String::new()); }
        let mut parts = vec![];
        for info in order {
            validate_identifier(&info.column).map_err(FilterError::InvalidColumn)?;
            parts.push(format!("\"{}\" {}", info.column, info.sort.as_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }

    /// Stable in-memory sort matching Postgres defaults: NULLs sort last ascending, first descending.
    pub fn sort_rows(rows: &mut [Map<String, Value>], order: &[FilterOrderInfo]) {
        if order.is_empty() { return; }
        rows.sort_by(|a, b| {
            for info in order {
                let ordering = compare_values(a.get(&info.column), b.get(&info.column));
                let ordering = match info.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal { return ordering; }
            }
            Ordering::Equal
        });
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
