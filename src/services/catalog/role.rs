use serde::Deserialize;

use super::{put, CatalogEntity};
use crate::database::models::RoleRecord;
use crate::database::{Fields, Table};
use crate::filter::Filter;
use crate::services::result::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRole {
    pub description: Option<String>,
}

/// 3 to 30 letters or spaces, stored lowercase.
fn description(value: &str) -> Result<String, ServiceError> {
    let normalized = value.trim().to_lowercase();
    let length = normalized.chars().count();
    if !(3..=30).contains(&length) || !normalized.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(ServiceError::Invalid(
            "description must be 3 to 30 letters or spaces".to_string(),
        ));
    }
    Ok(normalized)
}

impl CatalogEntity for RoleRecord {
    const TABLE: Table = Table::Roles;
    const SEARCH_COLUMNS: &'static [&'static str] = &["description"];
    const ADMIN_ONLY: bool = true;

    type Create = CreateRole;
    type Update = UpdateRole;

    fn insert_fields(dto: &CreateRole) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "description", description(&dto.description)?)?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateRole) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        if let Some(value) = dto.description.as_deref() {
            put(&mut fields, "description", description(value)?)?;
        }
        Ok(fields)
    }

    fn duplicate_filter(dto: &CreateRole) -> Option<Filter> {
        Some(Filter::new().eq_ignore_case("description", &dto.description))
    }

    fn update_duplicate_filter(dto: &UpdateRole) -> Option<Filter> {
        dto.description.as_deref().map(|d| Filter::new().eq_ignore_case("description", d))
    }

    /// Built-in roles back the authorization set and registration default.
    fn guard_mutation(&self) -> Result<(), ServiceError> {
        match self.role() {
            Some(role) => Err(ServiceError::PermissionDenied(format!("Built-in role '{}' cannot be modified", role))),
            None => Ok(()),
        }
    }
}
