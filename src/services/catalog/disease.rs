use serde::Deserialize;

use super::{put, put_opt, required_text, CatalogEntity};
use crate::database::models::Disease;
use crate::database::{Fields, Table};
use crate::filter::Filter;
use crate::services::result::ServiceError;

pub const DEFAULT_NAME: &str = "ninguno";
pub const DEFAULT_SEVERITY: &str = "ninguna";
pub const SEVERITIES: [&str; 4] = ["ninguna", "leve", "media", "grave"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDisease {
    pub name: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDisease {
    pub name: Option<String>,
    pub severity: Option<String>,
}

fn severity(value: &str) -> Result<String, ServiceError> {
    let normalized = value.trim().to_lowercase();
    if SEVERITIES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ServiceError::Invalid(format!(
            "severity must be one of: {}",
            SEVERITIES.join(", ")
        )))
    }
}

fn name_or_default(dto: &CreateDisease) -> &str {
    dto.name.as_deref().unwrap_or(DEFAULT_NAME)
}

impl CatalogEntity for Disease {
    const TABLE: Table = Table::Diseases;
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    type Create = CreateDisease;
    type Update = UpdateDisease;

    fn insert_fields(dto: &CreateDisease) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "name", required_text("name", name_or_default(dto))?)?;
        put(&mut fields, "severity", severity(dto.severity.as_deref().unwrap_or(DEFAULT_SEVERITY))?)?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateDisease) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put_opt(&mut fields, "name", dto.name.as_deref())?;
        put_opt(&mut fields, "severity", dto.severity.as_deref().map(severity).transpose()?)?;
        Ok(fields)
    }

    fn duplicate_filter(dto: &CreateDisease) -> Option<Filter> {
        Some(Filter::active().eq_ignore_case("name", name_or_default(dto)))
    }

    fn update_duplicate_filter(dto: &UpdateDisease) -> Option<Filter> {
        dto.name.as_deref().map(|name| Filter::active().eq_ignore_case("name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let fields = Disease::insert_fields(&CreateDisease::default()).unwrap();
        assert_eq!(fields["name"], DEFAULT_NAME);
        assert_eq!(fields["severity"], DEFAULT_SEVERITY);
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let dto = CreateDisease { name: Some("Moquillo".to_string()), severity: Some("extreme".to_string()) };
        assert!(matches!(Disease::insert_fields(&dto), Err(ServiceError::Invalid(_))));
        let dto = UpdateDisease { name: None, severity: Some("GRAVE".to_string()) };
        assert_eq!(Disease::update_fields(&dto).unwrap()["severity"], "grave");
    }
}
