use serde::Deserialize;

use super::{put, put_opt, required_text, CatalogEntity};
use crate::database::models::Species;
use crate::database::{Fields, Table};
use crate::filter::Filter;
use crate::services::result::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpecies {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSpecies {
    pub name: Option<String>,
}

impl CatalogEntity for Species {
    const TABLE: Table = Table::Species;
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    type Create = CreateSpecies;
    type Update = UpdateSpecies;

    fn insert_fields(dto: &CreateSpecies) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "name", required_text("name", &dto.name)?)?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateSpecies) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put_opt(&mut fields, "name", dto.name.as_deref())?;
        Ok(fields)
    }

    fn duplicate_filter(dto: &CreateSpecies) -> Option<Filter> {
        Some(Filter::active().eq_ignore_case("name", &dto.name))
    }

    fn update_duplicate_filter(dto: &UpdateSpecies) -> Option<Filter> {
        dto.name.as_deref().map(|name| Filter::active().eq_ignore_case("name", name))
    }
}
